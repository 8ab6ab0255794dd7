use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::instant::Instant;
use crate::options::{DayConfig, Options};

/// A calendar month, used to tag grid padding days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1 to 12.
    pub month: u32,
}

impl YearMonth {
    pub fn of(time: Instant) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
        }
    }
}

/// Display state of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub time: Instant,
    pub is_today: bool,
    pub title: String,
    pub subtitle: String,
    /// Always `false` from the builders; see `Grid::with_selection`.
    pub selected: bool,
    pub belongs_to_prior_month: bool,
    pub belongs_to_next_month: bool,
    pub marked: bool,
    pub css_class: String,
    pub disabled: bool,
    pub is_first_of_month: bool,
    pub is_last_of_month: bool,
}

/// Builds the display state for the day at `time`.
///
/// `reference` is the month a grid is showing; it only drives the
/// prior/next-month flags.
pub fn build_day(
    time: Instant,
    options: &Options,
    reference: Option<YearMonth>,
    now: Instant,
) -> Day {
    let day_config = options.find_day_config(time);
    let disabled = is_disabled(time, options, day_config, now);

    let title = day_config
        .and_then(|cfg| cfg.title.clone())
        .filter(|title| !title.is_empty())
        .or_else(|| Some(options.default_title.clone()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| time.day().to_string());

    let subtitle = day_config
        .and_then(|cfg| cfg.subtitle.clone())
        .filter(|subtitle| !subtitle.is_empty())
        .unwrap_or_else(|| options.default_subtitle.clone());

    let own_month = YearMonth::of(time);
    let (prior, next) = match reference {
        Some(reference) => (own_month < reference, own_month > reference),
        None => (false, false),
    };

    let day_of_month = time.day();
    Day {
        time,
        is_today: time.is_same_day(now),
        title,
        subtitle,
        selected: false,
        belongs_to_prior_month: prior,
        belongs_to_next_month: next,
        marked: day_config.and_then(|cfg| cfg.marked).unwrap_or(false),
        css_class: day_config
            .and_then(|cfg| cfg.css_class.clone())
            .unwrap_or_default(),
        disabled,
        is_first_of_month: day_of_month == 1,
        is_last_of_month: day_of_month == time.days_in_month(),
    }
}

fn is_disabled(
    time: Instant,
    options: &Options,
    day_config: Option<&DayConfig>,
    now: Instant,
) -> bool {
    if let Some(disable) = day_config.and_then(|cfg| cfg.disable) {
        trace!(%time, disable, "day override decides selectability");
        return disable;
    }

    if options.disable_weeks.contains(&time.weekday()) {
        return true;
    }

    if options.can_backwards_selected {
        time.is_before_day(options.from)
    } else {
        !time.is_between_days(options.from, options.effective_to(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Options, WeekStart};

    fn ymd(year: i32, month: u32, day: u32) -> Instant {
        Instant::from_ymd(year, month, day).expect("valid date")
    }

    fn options() -> Options {
        let mut opts = Options::defaults(ymd(2024, 1, 15));
        opts.from = ymd(2024, 1, 10);
        opts.to = Some(ymd(2024, 1, 20));
        opts
    }

    fn override_for(date: Instant) -> DayConfig {
        DayConfig {
            date,
            disable: None,
            title: None,
            subtitle: None,
            marked: None,
            css_class: None,
        }
    }

    #[test]
    fn range_policy_is_inclusive_by_day() {
        let opts = options();
        let now = ymd(2024, 1, 15);
        let disabled = |d: u32| build_day(ymd(2024, 1, d), &opts, None, now).disabled;
        assert!(disabled(9));
        assert!(!disabled(10));
        assert!(!disabled(20));
        assert!(disabled(21));
    }

    #[test]
    fn unset_to_means_now() {
        let mut opts = options();
        opts.to = None;
        let now = ymd(2024, 1, 15);
        assert!(!build_day(ymd(2024, 1, 15), &opts, None, now).disabled);
        assert!(build_day(ymd(2024, 1, 16), &opts, None, now).disabled);
    }

    #[test]
    fn future_from_with_unset_to_disables_everything() {
        let now = ymd(2024, 6, 1);
        let mut opts = Options::defaults(now);
        opts.from = ymd(2024, 6, 10);
        opts.to = None;
        for d in [1, 5, 10, 12] {
            assert!(build_day(ymd(2024, 6, d), &opts, None, now).disabled, "day {d}");
        }
    }

    #[test]
    fn inverted_bounds_hold_no_day() {
        let mut opts = options();
        opts.from = ymd(2024, 1, 20);
        opts.to = Some(ymd(2024, 1, 10));
        let now = ymd(2024, 1, 15);
        for d in [10, 15, 20] {
            assert!(build_day(ymd(2024, 1, d), &opts, None, now).disabled, "day {d}");
        }
    }

    #[test]
    fn backwards_mode_ignores_upper_bound() {
        let mut opts = options();
        opts.to = Some(ymd(2024, 1, 15));
        opts.can_backwards_selected = true;
        let now = ymd(2024, 1, 1);
        assert!(!build_day(ymd(2024, 1, 20), &opts, None, now).disabled);
        assert!(build_day(ymd(2024, 1, 9), &opts, None, now).disabled);
    }

    #[test]
    fn override_escapes_range_and_weekday_rules() {
        let mut opts = options();
        // 2024-01-25 is a Thursday
        opts.disable_weeks.insert(4);
        opts.days_config.push(DayConfig {
            disable: Some(false),
            title: Some("Launch".to_string()),
            subtitle: Some("v1".to_string()),
            marked: Some(true),
            css_class: Some("launch".to_string()),
            ..override_for(ymd(2024, 1, 25))
        });

        let day = build_day(ymd(2024, 1, 25), &opts, None, ymd(2024, 1, 15));
        assert!(!day.disabled);
        assert_eq!(day.title, "Launch");
        assert_eq!(day.subtitle, "v1");
        assert!(day.marked);
        assert_eq!(day.css_class, "launch");
    }

    #[test]
    fn first_matching_override_wins() {
        let mut opts = options();
        opts.days_config.push(DayConfig {
            disable: Some(true),
            ..override_for(ymd(2024, 1, 12))
        });
        opts.days_config.push(DayConfig {
            disable: Some(false),
            ..override_for(ymd(2024, 1, 12))
        });
        assert!(build_day(ymd(2024, 1, 12), &opts, None, ymd(2024, 1, 15)).disabled);
    }

    #[test]
    fn override_without_disable_falls_through() {
        let mut opts = options();
        opts.days_config.push(DayConfig {
            title: Some("Holiday".to_string()),
            ..override_for(ymd(2024, 1, 25))
        });
        let day = build_day(ymd(2024, 1, 25), &opts, None, ymd(2024, 1, 15));
        assert!(day.disabled);
        assert_eq!(day.title, "Holiday");
    }

    #[test]
    fn disabled_weekdays() {
        let mut opts = options();
        opts.disable_weeks.extend([0, 6]);
        // 2024-01-13 is a Saturday, 2024-01-14 a Sunday
        assert!(build_day(ymd(2024, 1, 13), &opts, None, ymd(2024, 1, 15)).disabled);
        assert!(build_day(ymd(2024, 1, 14), &opts, None, ymd(2024, 1, 15)).disabled);
        assert!(!build_day(ymd(2024, 1, 15), &opts, None, ymd(2024, 1, 15)).disabled);
    }

    #[test]
    fn titles_fall_back_to_defaults_then_day_number() {
        let mut opts = options();
        let day = build_day(ymd(2024, 1, 7), &opts, None, ymd(2024, 1, 15));
        assert_eq!(day.title, "7");
        assert_eq!(day.subtitle, "");

        opts.default_title = "·".to_string();
        opts.default_subtitle = "free".to_string();
        let day = build_day(ymd(2024, 1, 7), &opts, None, ymd(2024, 1, 15));
        assert_eq!(day.title, "·");
        assert_eq!(day.subtitle, "free");
    }

    #[test]
    fn month_edges_and_today() {
        let opts = options();
        let now = ymd(2024, 2, 29);
        let last = build_day(ymd(2024, 2, 29), &opts, None, now);
        assert!(last.is_last_of_month);
        assert!(!last.is_first_of_month);
        assert!(last.is_today);

        let first = build_day(ymd(2024, 3, 1), &opts, None, now);
        assert!(first.is_first_of_month);
        assert!(!first.is_today);
    }

    #[test]
    fn adjacency_flags_handle_year_rollover() {
        let mut opts = options();
        opts.week_start = WeekStart::Monday;
        let december = YearMonth { year: 2023, month: 12 };
        let now = ymd(2024, 1, 15);

        let next = build_day(ymd(2024, 1, 2), &opts, Some(december), now);
        assert!(next.belongs_to_next_month);
        assert!(!next.belongs_to_prior_month);

        let prior = build_day(ymd(2023, 11, 30), &opts, Some(december), now);
        assert!(prior.belongs_to_prior_month);

        let own = build_day(ymd(2023, 12, 5), &opts, Some(december), now);
        assert!(!own.belongs_to_prior_month && !own.belongs_to_next_month);

        let bare = build_day(ymd(2024, 1, 2), &opts, None, now);
        assert!(!bare.belongs_to_next_month);
    }

    #[test]
    fn build_day_is_pure() {
        let opts = options();
        let now = ymd(2024, 1, 15);
        let reference = Some(YearMonth { year: 2024, month: 1 });
        assert_eq!(
            build_day(ymd(2024, 1, 31), &opts, reference, now),
            build_day(ymd(2024, 1, 31), &opts, reference, now)
        );
    }
}
