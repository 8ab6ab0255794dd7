use serde::Serialize;
use tracing::{debug, trace};

use crate::day::{Day, YearMonth, build_day};
use crate::instant::{Instant, TimeUnit};
use crate::options::{Options, WeekStart};
use crate::selection::Selection;

/// Six rows of seven columns.
pub const MONTH_SLOTS: usize = 42;
pub const WEEK_SLOTS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    Month,
    Week,
}

/// Facts about the month a grid was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOriginal {
    pub year: i32,
    /// 1 to 12.
    pub month: u32,
    /// Weekday of the 1st, 0 = Sunday.
    pub first_weekday: u32,
    pub day_count: u32,
    /// First day shown: the 1st of the month, or the week start.
    pub time: Instant,
    /// Last day of the month, or the last day of the week.
    pub last_time: Instant,
    /// The instant the grid was requested for.
    pub date: Instant,
}

impl GridOriginal {
    pub fn for_month(time: Instant) -> Self {
        let first = time.start_of_month();
        let day_count = time.days_in_month();
        Self {
            year: time.year(),
            month: time.month(),
            first_weekday: first.weekday(),
            day_count,
            time: first,
            last_time: first.add(TimeUnit::Day, i64::from(day_count) - 1),
            date: time,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub kind: GridKind,
    /// Row-major cells; `None` is an empty slot.
    pub days: Vec<Option<Day>>,
    pub original: GridOriginal,
}

impl Grid {
    pub fn rows(&self) -> impl Iterator<Item = &[Option<Day>]> {
        self.days.chunks(WEEK_SLOTS)
    }

    /// Days that belong to the grid's own month, in order.
    pub fn month_days(&self) -> impl Iterator<Item = &Day> {
        self.days
            .iter()
            .flatten()
            .filter(|day| !day.belongs_to_prior_month && !day.belongs_to_next_month)
    }

    pub fn find(&self, time: Instant) -> Option<&Day> {
        self.days.iter().flatten().find(|day| day.time.is_same_day(time))
    }

    /// A copy with `selected` set from `selection`.
    pub fn with_selection(&self, selection: &Selection) -> Grid {
        let days = self
            .days
            .iter()
            .map(|slot| {
                slot.as_ref().map(|day| Day {
                    selected: selection.is_selected(day.time),
                    ..day.clone()
                })
            })
            .collect();
        Grid {
            kind: self.kind,
            days,
            original: self.original,
        }
    }
}

/// Column of the month's first day once `week_start` is applied.
pub fn first_column(first_weekday: u32, week_start: WeekStart) -> usize {
    ((first_weekday + 7 - week_start.index()) % 7) as usize
}

#[tracing::instrument(skip(options, now), fields(instant = %time))]
pub fn build_month_grid(time: Instant, options: &Options, now: Instant) -> Grid {
    let original = GridOriginal::for_month(time);
    let reference = Some(original.year_month());
    let offset = first_column(original.first_weekday, options.week_start);
    let day_count = original.day_count as usize;

    let mut days: Vec<Option<Day>> = vec![None; MONTH_SLOTS];
    let mut cursor = original.time;
    for slot in offset..offset + day_count {
        days[slot] = Some(build_day(cursor, options, reference, now));
        cursor = cursor.add(TimeUnit::Day, 1);
    }

    if options.show_adjacent_month_day {
        let mut before = original.time;
        for slot in (0..offset).rev() {
            trace!(slot, "padding with prior-month day");
            before = before.subtract(TimeUnit::Day, 1);
            days[slot] = Some(build_day(before, options, reference, now));
        }

        // Empty when the month already ends on the final slot.
        let mut after = original.last_time;
        for slot in offset + day_count..MONTH_SLOTS {
            after = after.add(TimeUnit::Day, 1);
            days[slot] = Some(build_day(after, options, reference, now));
        }
    }

    debug!(
        year = original.year,
        month = original.month,
        offset,
        filled = days.iter().flatten().count(),
        "built month grid"
    );
    Grid {
        kind: GridKind::Month,
        days,
        original,
    }
}

#[tracing::instrument(skip(options, now), fields(instant = %time))]
pub fn build_week_grid(time: Instant, options: &Options, now: Instant) -> Grid {
    let start = time.start_of_week(options.week_start);
    let reference = Some(YearMonth::of(time));

    let mut days = Vec::with_capacity(WEEK_SLOTS);
    let mut cursor = start;
    for _ in 0..WEEK_SLOTS {
        days.push(Some(build_day(cursor, options, reference, now)));
        cursor = cursor.add(TimeUnit::Day, 1);
    }

    let original = GridOriginal {
        time: start,
        last_time: start.add(TimeUnit::Day, WEEK_SLOTS as i64 - 1),
        ..GridOriginal::for_month(time)
    };
    debug!(week_start = %start, "built week grid");
    Grid {
        kind: GridKind::Week,
        days,
        original,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> Instant {
        Instant::from_ymd(year, month, day).expect("valid date")
    }

    fn options() -> Options {
        let mut opts = Options::defaults(ymd(2024, 1, 1));
        opts.from = ymd(2000, 1, 1);
        opts.to = Some(ymd(2100, 1, 1));
        opts
    }

    fn day_numbers(grid: &Grid) -> Vec<Option<u32>> {
        grid.days
            .iter()
            .map(|slot| slot.as_ref().map(|day| day.time.day()))
            .collect()
    }

    #[test]
    fn month_days_start_at_first_weekday() {
        // May 2024 starts on a Wednesday.
        let grid = build_month_grid(ymd(2024, 5, 17), &options(), ymd(2024, 1, 1));
        assert_eq!(grid.days.len(), MONTH_SLOTS);
        assert_eq!(grid.original.first_weekday, 3);
        assert_eq!(grid.original.day_count, 31);
        assert_eq!(grid.original.time, ymd(2024, 5, 1));
        assert_eq!(grid.original.last_time, ymd(2024, 5, 31));
        assert_eq!(grid.original.date, ymd(2024, 5, 17));

        let first = grid.days[3].as_ref().expect("filled");
        assert_eq!(first.time, ymd(2024, 5, 1));
        assert!(first.is_first_of_month);
        let last = grid.days[33].as_ref().expect("filled");
        assert_eq!(last.time, ymd(2024, 5, 31));
        assert!(last.is_last_of_month);
    }

    #[test]
    fn adjacent_days_pad_both_ends() {
        let grid = build_month_grid(ymd(2024, 5, 1), &options(), ymd(2024, 1, 1));
        let numbers = day_numbers(&grid);
        assert_eq!(&numbers[..4], &[Some(28), Some(29), Some(30), Some(1)]);
        for slot in &grid.days[..3] {
            let day = slot.as_ref().expect("padded");
            assert!(day.belongs_to_prior_month);
            assert_eq!(day.time.month(), 4);
        }
        for slot in &grid.days[34..] {
            let day = slot.as_ref().expect("padded");
            assert!(day.belongs_to_next_month);
            assert_eq!(day.time.month(), 6);
        }
        assert_eq!(numbers[34], Some(1));
        assert_eq!(numbers[41], Some(8));
    }

    #[test]
    fn without_adjacent_days_padding_is_empty() {
        let mut opts = options();
        opts.show_adjacent_month_day = false;
        let grid = build_month_grid(ymd(2024, 5, 1), &opts, ymd(2024, 1, 1));
        assert!(grid.days[..3].iter().all(Option::is_none));
        assert!(grid.days[34..].iter().all(Option::is_none));
        assert_eq!(grid.days.iter().flatten().count(), 31);
    }

    #[test]
    fn monday_start_rotates_one_column() {
        let mut monday = options();
        monday.week_start = WeekStart::Monday;
        monday.show_adjacent_month_day = false;
        let mut sunday = options();
        sunday.show_adjacent_month_day = false;

        let by_sunday = build_month_grid(ymd(2024, 5, 1), &sunday, ymd(2024, 1, 1));
        let by_monday = build_month_grid(ymd(2024, 5, 1), &monday, ymd(2024, 1, 1));
        assert!(by_monday.days[2].is_some());
        assert!(by_monday.days[1].is_none());
        assert_eq!(day_numbers(&by_sunday)[3..34], day_numbers(&by_monday)[2..33]);
    }

    #[test]
    fn monday_start_with_sunday_first_moves_to_last_column() {
        // September 2024 starts on a Sunday.
        let mut opts = options();
        opts.week_start = WeekStart::Monday;
        let grid = build_month_grid(ymd(2024, 9, 1), &opts, ymd(2024, 1, 1));
        assert_eq!(grid.days[6].as_ref().map(|d| d.time), Some(ymd(2024, 9, 1)));
        assert_eq!(grid.days[0].as_ref().map(|d| d.time), Some(ymd(2024, 8, 26)));
    }

    #[test]
    fn every_day_of_every_month_appears_once() {
        for week_start in [WeekStart::Sunday, WeekStart::Monday] {
            let mut opts = options();
            opts.week_start = week_start;
            for month in 1..=12 {
                let grid = build_month_grid(ymd(2031, month, 1), &opts, ymd(2024, 1, 1));
                assert_eq!(grid.days.len() % 7, 0);
                assert!(grid.days.iter().all(Option::is_some));

                let own: Vec<u32> = grid.month_days().map(|day| day.time.day()).collect();
                let expected: Vec<u32> = (1..=grid.original.day_count).collect();
                assert_eq!(own, expected);
            }
        }
    }

    #[test]
    fn week_grid_is_seven_consecutive_days() {
        let mut opts = options();
        opts.week_start = WeekStart::Monday;
        let grid = build_week_grid(ymd(2024, 5, 1), &opts, ymd(2024, 1, 1));
        assert_eq!(grid.kind, GridKind::Week);
        assert_eq!(grid.days.len(), WEEK_SLOTS);
        assert_eq!(grid.original.time, ymd(2024, 4, 29));
        assert_eq!(grid.original.last_time, ymd(2024, 5, 5));
        assert_eq!(grid.original.month, 5);
        let first = grid.days[0].as_ref().expect("filled");
        assert!(first.belongs_to_prior_month);
        let numbers = day_numbers(&grid);
        assert_eq!(
            numbers,
            vec![Some(29), Some(30), Some(1), Some(2), Some(3), Some(4), Some(5)]
        );
    }

    #[test]
    fn selection_is_applied_to_a_copy() {
        let opts = options();
        let grid = build_month_grid(ymd(2024, 5, 1), &opts, ymd(2024, 1, 1));
        let mut selection = Selection::new(opts.pick_mode);
        let day = grid.find(ymd(2024, 5, 9)).expect("in grid").clone();
        selection.select(&day, &opts);

        let marked = grid.with_selection(&selection);
        assert!(marked.find(ymd(2024, 5, 9)).expect("in grid").selected);
        assert!(!grid.find(ymd(2024, 5, 9)).expect("in grid").selected);
        assert_eq!(marked.days.iter().flatten().filter(|d| d.selected).count(), 1);
    }
}
