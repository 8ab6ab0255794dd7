use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::day::{Day, YearMonth, build_day};
use crate::error::OptionsError;
use crate::grid::{Grid, build_month_grid, build_week_grid};
use crate::instant::Instant;
use crate::options::{Options, PartialOptions, resolve_options};
use crate::period::{self, PageChange};
use crate::result::{PayloadResult, PickResult, parse_payload, wrap_result};
use crate::selection::{SelectOutcome, Selection};

/// Resolved options plus a clock; the call surface a UI layer talks to.
#[derive(Debug, Clone)]
pub struct CalendarService<C: Clock = SystemClock> {
    options: Options,
    clock: C,
}

impl CalendarService<SystemClock> {
    /// Resolves `partial` over the process-wide defaults using the system
    /// clock.
    pub fn new(partial: &PartialOptions) -> Result<Self, OptionsError> {
        Self::with_clock(partial, SystemClock)
    }
}

impl<C: Clock> CalendarService<C> {
    pub fn with_clock(partial: &PartialOptions, clock: C) -> Result<Self, OptionsError> {
        let options = resolve_options(partial, clock.now())?;
        info!(id = %options.id, "calendar service ready");
        Ok(Self { options, clock })
    }

    pub fn from_options(options: Options, clock: C) -> Self {
        Self { options, clock }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn day(&self, time: Instant, reference: Option<YearMonth>) -> Day {
        build_day(time, &self.options, reference, self.now())
    }

    pub fn month(&self, time: Instant) -> Grid {
        build_month_grid(time, &self.options, self.now())
    }

    pub fn week(&self, time: Instant) -> Grid {
        build_week_grid(time, &self.options, self.now())
    }

    /// The first page: the default scroll target in the display mode.
    pub fn initial_page(&self) -> Grid {
        self.page(self.options.default_scroll_to)
    }

    pub fn page(&self, time: Instant) -> Grid {
        period::build_page(time, &self.options, self.now())
    }

    pub fn months_for_period(&self, start: Instant, count: u32) -> Vec<Grid> {
        period::months_for_period(start, count, &self.options, self.now())
    }

    pub fn weeks_for_period(&self, start: Instant) -> Vec<Grid> {
        period::weeks_for_period(start, &self.options, self.now())
    }

    pub fn years_for_period(&self, start_year: i32, count: u32) -> Vec<Grid> {
        period::years_for_period(start_year, count, &self.options, self.now())
    }

    pub fn next(&self, grid: &Grid) -> PageChange {
        period::next_page(grid, &self.options, self.now())
    }

    pub fn prev(&self, grid: &Grid) -> PageChange {
        period::prev_page(grid, &self.options, self.now())
    }

    pub fn next_year(&self, grid: &Grid) -> PageChange {
        period::next_year(grid, &self.options, self.now())
    }

    pub fn prev_year(&self, grid: &Grid) -> PageChange {
        period::prev_year(grid, &self.options, self.now())
    }

    pub fn select_month(&self, grid: &Grid, month: u32) -> PageChange {
        period::select_month(grid, month, &self.options, self.now())
    }

    pub fn select_year(&self, grid: &Grid, year: i32) -> PageChange {
        period::select_year(grid, year, &self.options, self.now())
    }

    pub fn can_next(&self, grid: &Grid) -> bool {
        period::can_next(grid, &self.options)
    }

    pub fn can_prev(&self, grid: &Grid) -> bool {
        period::can_prev(grid, &self.options)
    }

    pub fn weekday_labels(&self) -> Vec<String> {
        period::weekday_labels(&self.options)
    }

    pub fn month_title(&self, time: Instant) -> String {
        period::month_title(time, &self.options)
    }

    pub fn selection(&self) -> Selection {
        Selection::from_options(&self.options)
    }

    pub fn select(&self, selection: &mut Selection, day: &Day) -> SelectOutcome {
        selection.select(day, &self.options)
    }

    pub fn wrap_result(&self, days: &[Day]) -> Option<PickResult> {
        wrap_result(days, self.options.pick_mode)
    }

    /// The selection in the configured output type and date format.
    pub fn payload(&self, selection: &Selection) -> Option<PayloadResult> {
        selection
            .to_result()
            .map(|result| result.to_payloads(self.options.output_type, &self.options.date_format))
    }

    pub fn parse_payload(&self, text: &str) -> Option<Instant> {
        parse_payload(text, &self.options.date_format)
    }
}
