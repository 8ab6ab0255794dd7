use chrono::{TimeZone, Utc};
use daygrid_core::instant::Instant;
use daygrid_core::options::{DateInput, PartialDateRange, PartialOptions, PickMode};
use daygrid_core::result::{Payload, PayloadResult, PickResult};
use daygrid_core::selection::SelectOutcome;
use daygrid_core::{CalendarService, FixedClock, wrap_result};

fn utc(year: i32, month: u32, day: u32) -> Instant {
    Instant::from_utc(
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid date"),
    )
}

fn service(partial: PartialOptions) -> CalendarService<FixedClock> {
    CalendarService::with_clock(&partial, FixedClock(utc(2024, 3, 10))).expect("resolve options")
}

fn text(raw: &str) -> Option<DateInput> {
    Some(DateInput::Text(raw.to_string()))
}

#[test]
fn range_of_one_day_wraps_with_equal_ends() {
    let svc = service(PartialOptions {
        pick_mode: Some("range".to_string()),
        ..PartialOptions::default()
    });
    let day = svc.day(utc(2024, 3, 10), None);
    let Some(PickResult::Range { from, to }) = svc.wrap_result(&[day]) else {
        panic!("expected a range result");
    };
    assert_eq!(from.time, to.time);
    assert_eq!(from.string, "2024-03-10");
    assert!(wrap_result(&[], PickMode::Range).is_none());
}

#[test]
fn month_grid_picking_round() {
    let svc = service(PartialOptions {
        pick_mode: Some("range".to_string()),
        from: text("2024-03-01"),
        to: text("2024-04-30"),
        date_format: Some("DD.MM.YYYY".to_string()),
        ..PartialOptions::default()
    });
    let grid = svc.month(utc(2024, 3, 1));
    let mut selection = svc.selection();
    assert!(selection.is_empty());

    let start = grid.find(utc(2024, 3, 12)).expect("in grid").clone();
    let end = grid.find(utc(2024, 3, 15)).expect("in grid").clone();
    assert_eq!(svc.select(&mut selection, &start), SelectOutcome::Changed);
    assert_eq!(svc.select(&mut selection, &end), SelectOutcome::Complete);

    let marked = grid.with_selection(&selection);
    let selected: Vec<u32> = marked
        .days
        .iter()
        .flatten()
        .filter(|day| day.selected)
        .map(|day| day.time.day())
        .collect();
    assert_eq!(selected, vec![12, 15]);
    assert!(selection.in_range(utc(2024, 3, 13)));

    assert_eq!(
        svc.payload(&selection),
        Some(PayloadResult::Range {
            from: Payload::String("12.03.2024".to_string()),
            to: Payload::String("15.03.2024".to_string()),
        })
    );
    assert_eq!(svc.parse_payload("15.03.2024"), Some(utc(2024, 3, 15)));
}

#[test]
fn taps_outside_the_range_are_ignored() {
    let svc = service(PartialOptions {
        pick_mode: Some("multi".to_string()),
        from: text("2024-03-05"),
        to: text("2024-03-20"),
        ..PartialOptions::default()
    });
    let grid = svc.month(utc(2024, 3, 1));
    let mut selection = svc.selection();
    for d in [2, 6, 21, 7] {
        let day = grid.find(utc(2024, 3, d)).expect("in grid").clone();
        svc.select(&mut selection, &day);
    }
    assert_eq!(selection.days(), &[utc(2024, 3, 6), utc(2024, 3, 7)]);
}

#[test]
fn default_range_seeds_the_selection() {
    let svc = service(PartialOptions {
        pick_mode: Some("range".to_string()),
        from: text("2024-01-01"),
        to: text("2024-12-31"),
        output_type: Some("object".to_string()),
        default_date_range: Some(PartialDateRange {
            from: text("2024-03-02"),
            to: text("2024-03-04"),
        }),
        ..PartialOptions::default()
    });
    let selection = svc.selection();
    assert_eq!(selection.days(), &[utc(2024, 3, 2), utc(2024, 3, 4)]);

    let Some(PayloadResult::Range {
        from: Payload::Object(from),
        to: Payload::Object(to),
    }) = svc.payload(&selection)
    else {
        panic!("expected object payloads");
    };
    assert_eq!((from.month, from.day), (3, 2));
    assert_eq!((to.month, to.day), (3, 4));
}
