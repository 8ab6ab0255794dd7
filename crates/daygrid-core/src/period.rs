//! Multi-grid periods and page navigation.
//!
//! Navigation never mutates a grid. Each step builds the next page and
//! returns it in a [`PageChange`] together with the old and new reference
//! dates, so the caller decides what to announce.

use serde::Serialize;
use tracing::{debug, warn};

use crate::day::YearMonth;
use crate::grid::{Grid, GridKind, build_month_grid, build_week_grid, first_column};
use crate::instant::{Instant, TimeUnit};
use crate::options::{DEFAULT_WEEKDAY_LABELS, DisplayMode, Options};
use crate::result::{ResultUnit, multi_format};

#[tracing::instrument(skip(options, now), fields(start = %start))]
pub fn months_for_period(start: Instant, count: u32, options: &Options, now: Instant) -> Vec<Grid> {
    let first = start.start_of_month();
    (0..count)
        .map(|idx| build_month_grid(first.add(TimeUnit::Month, i64::from(idx)), options, now))
        .collect()
}

/// The single week containing `start`.
#[tracing::instrument(skip(options, now), fields(start = %start))]
pub fn weeks_for_period(start: Instant, options: &Options, now: Instant) -> Vec<Grid> {
    vec![build_week_grid(start, options, now)]
}

/// One January grid per year, starting at `start_year`.
#[tracing::instrument(skip(options, now))]
pub fn years_for_period(start_year: i32, count: u32, options: &Options, now: Instant) -> Vec<Grid> {
    let Some(first) = Instant::from_ymd(start_year, 1, 1) else {
        warn!(start_year, "year outside the supported calendar range");
        return Vec::new();
    };
    (0..count)
        .map(|idx| build_month_grid(first.add(TimeUnit::Year, i64::from(idx)), options, now))
        .collect()
}

/// The page for `time` in the configured display mode.
pub fn build_page(time: Instant, options: &Options, now: Instant) -> Grid {
    match options.display_mode {
        DisplayMode::Month => build_month_grid(time, options, now),
        DisplayMode::Week => build_week_grid(time, options, now),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageChange {
    pub grid: Grid,
    pub old: ResultUnit,
    pub new: ResultUnit,
    /// The reference month differs between the two pages.
    pub month_changed: bool,
}

/// Reference instant a page navigates from: the 1st for month grids,
/// the requested date for week grids.
fn anchor(grid: &Grid) -> Instant {
    match grid.kind {
        GridKind::Month => grid.original.time,
        GridKind::Week => grid.original.date,
    }
}

fn rebuild(kind: GridKind, time: Instant, options: &Options, now: Instant) -> Grid {
    match kind {
        GridKind::Month => build_month_grid(time, options, now),
        GridKind::Week => build_week_grid(time, options, now),
    }
}

fn change(from: &Grid, grid: Grid) -> PageChange {
    let old = anchor(from);
    let new = anchor(&grid);
    let month_changed = YearMonth::of(old) != YearMonth::of(new);
    debug!(old = %old, new = %new, month_changed, "page changed");
    PageChange {
        grid,
        old: multi_format(old),
        new: multi_format(new),
        month_changed,
    }
}

pub fn next_month(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let time = grid.original.time.start_of_month().add(TimeUnit::Month, 1);
    change(grid, build_month_grid(time, options, now))
}

pub fn prev_month(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let time = grid.original.time.start_of_month().subtract(TimeUnit::Month, 1);
    change(grid, build_month_grid(time, options, now))
}

/// Advances `weeks` weeks. Unless `continuous` is set, crossing into a new
/// month lands on the week holding its 1st.
pub fn next_week(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let current = anchor(grid);
    let mut time = current.add(TimeUnit::Week, i64::from(options.weeks));
    if !options.continuous && YearMonth::of(time) != YearMonth::of(current) {
        time = time.with_day(1);
    }
    change(grid, build_week_grid(time, options, now))
}

/// Steps back `weeks` weeks. Unless `continuous` is set, crossing a month
/// boundary lands on the week holding the current month's 1st, or on the
/// prior month's last week when that week is already showing.
pub fn prev_week(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let current = anchor(grid);
    let mut time = current.subtract(TimeUnit::Week, i64::from(options.weeks));
    if !options.continuous && YearMonth::of(time) != YearMonth::of(current) {
        let column = first_column(current.weekday(), options.week_start) as i64;
        let first = current.start_of_month();
        time = if i64::from(current.day()) - column <= 1 {
            first.subtract(TimeUnit::Day, 1)
        } else {
            first
        };
    }
    change(grid, build_week_grid(time, options, now))
}

pub fn next_year(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let time = anchor(grid).add(TimeUnit::Year, 1);
    change(grid, rebuild(grid.kind, time, options, now))
}

pub fn prev_year(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    let time = anchor(grid).subtract(TimeUnit::Year, 1);
    change(grid, rebuild(grid.kind, time, options, now))
}

pub fn next_page(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    match grid.kind {
        GridKind::Month => next_month(grid, options, now),
        GridKind::Week => next_week(grid, options, now),
    }
}

pub fn prev_page(grid: &Grid, options: &Options, now: Instant) -> PageChange {
    match grid.kind {
        GridKind::Month => prev_month(grid, options, now),
        GridKind::Week => prev_week(grid, options, now),
    }
}

/// Jumps to `month` (1 to 12, clamped) of the grid's year.
pub fn select_month(grid: &Grid, month: u32, options: &Options, now: Instant) -> PageChange {
    let current = anchor(grid);
    let delta = i64::from(month.clamp(1, 12)) - i64::from(current.month());
    change(grid, rebuild(grid.kind, current.add(TimeUnit::Month, delta), options, now))
}

pub fn select_year(grid: &Grid, year: i32, options: &Options, now: Instant) -> PageChange {
    let current = anchor(grid);
    let delta = i64::from(year) - i64::from(current.year());
    change(grid, rebuild(grid.kind, current.add(TimeUnit::Year, delta), options, now))
}

/// Whether a later page may hold selectable days.
pub fn can_next(grid: &Grid, options: &Options) -> bool {
    match options.to {
        None => true,
        Some(to) => grid.original.last_time < to,
    }
}

/// Whether an earlier page may hold selectable days.
pub fn can_prev(grid: &Grid, options: &Options) -> bool {
    grid.original.time > options.from
}

/// Column header labels, starting at the configured week start.
pub fn weekday_labels(options: &Options) -> Vec<String> {
    let mut labels = if options.weekdays.len() == 7 {
        options.weekdays.clone()
    } else {
        warn!(
            count = options.weekdays.len(),
            "weekday labels need seven entries; using defaults"
        );
        DEFAULT_WEEKDAY_LABELS.iter().map(|s| s.to_string()).collect()
    };
    labels.rotate_left(options.week_start.index() as usize);
    labels
}

pub fn month_title(time: Instant, options: &Options) -> String {
    time.format(&options.month_format)
}

pub fn year_title(time: Instant, options: &Options) -> String {
    time.format(&options.year_format)
}
