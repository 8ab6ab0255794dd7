use serde::Serialize;
use tracing::debug;

use crate::day::Day;
use crate::instant::Instant;
use crate::options::{DefaultSelection, Options, PickMode};
use crate::result::{PickResult, wrap_instants};

/// What a tap did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectOutcome {
    /// Disabled day; nothing changed.
    Ignored,
    Changed,
    /// The pick mode's result is ready to hand back.
    Complete,
}

/// Selected days, kept outside the grids and keyed by day start.
///
/// - Single: at most one day.
/// - Range: `[from]` while picking, then `[from, to]` with `from <= to`.
/// - Multi: any number of days in the order they were picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    mode: PickMode,
    days: Vec<Instant>,
}

impl Selection {
    pub fn new(mode: PickMode) -> Self {
        Self {
            mode,
            days: Vec::new(),
        }
    }

    /// Seeds the selection from the resolved default selection.
    pub fn from_options(options: &Options) -> Self {
        let mut selection = Self::new(options.pick_mode);
        match &options.default_selection {
            DefaultSelection::None => {}
            DefaultSelection::Single { date } => selection.days.push(date.start_of_day()),
            DefaultSelection::Range { from, to } => {
                let from = from.or(*to).map(Instant::start_of_day);
                let to = match to {
                    Some(to) => Some(to.start_of_day()),
                    None if options.default_end_date_to_start_date => from,
                    None => None,
                };
                match (from, to) {
                    (Some(from), Some(to)) if to < from => selection.days.extend([to, from]),
                    (Some(from), Some(to)) => selection.days.extend([from, to]),
                    (Some(from), None) => selection.days.push(from),
                    _ => {}
                }
            }
            DefaultSelection::Multi { dates } => {
                for date in dates {
                    let day = date.start_of_day();
                    if !selection.days.contains(&day) {
                        selection.days.push(day);
                    }
                }
            }
        }
        debug!(
            mode = selection.mode.as_key(),
            seeded = selection.days.len(),
            "initialised selection"
        );
        selection
    }

    pub fn mode(&self) -> PickMode {
        self.mode
    }

    pub fn days(&self) -> &[Instant] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    pub fn is_selected(&self, time: Instant) -> bool {
        self.days.iter().any(|day| day.is_same_day(time))
    }

    /// Strictly inside a finished range, endpoints excluded.
    pub fn in_range(&self, time: Instant) -> bool {
        match (self.mode, self.days.as_slice()) {
            (PickMode::Range, [from, to]) => time.is_after_day(*from) && time.is_before_day(*to),
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        match self.mode {
            PickMode::Single => self.days.len() == 1,
            PickMode::Range => self.days.len() == 2,
            PickMode::Multi => !self.days.is_empty(),
        }
    }

    /// Applies a tap on `day` under the pick-mode rules.
    pub fn select(&mut self, day: &Day, options: &Options) -> SelectOutcome {
        if day.disabled {
            debug!(time = %day.time, "ignoring tap on disabled day");
            return SelectOutcome::Ignored;
        }

        let time = day.time.start_of_day();
        let outcome = match self.mode {
            PickMode::Single => {
                self.days = vec![time];
                SelectOutcome::Complete
            }
            PickMode::Range => self.select_range(time, options),
            PickMode::Multi => {
                match self.days.iter().position(|d| d.is_same_day(time)) {
                    Some(idx) => {
                        self.days.remove(idx);
                    }
                    None => self.days.push(time),
                }
                SelectOutcome::Changed
            }
        };
        debug!(%time, ?outcome, selected = self.days.len(), "selection updated");
        outcome
    }

    fn select_range(&mut self, time: Instant, options: &Options) -> SelectOutcome {
        match self.days.as_slice() {
            [from] => {
                let from = *from;
                if !time.is_before_day(from) {
                    self.days.push(time);
                    SelectOutcome::Complete
                } else if options.can_backwards_selected {
                    self.days.insert(0, time);
                    SelectOutcome::Complete
                } else {
                    self.days = vec![time];
                    SelectOutcome::Changed
                }
            }
            _ => {
                self.days = vec![time];
                if options.default_end_date_to_start_date {
                    self.days.push(time);
                    SelectOutcome::Complete
                } else {
                    SelectOutcome::Changed
                }
            }
        }
    }

    /// Wraps the current days into the pick-mode shape.
    pub fn to_result(&self) -> Option<PickResult> {
        wrap_instants(&self.days, self.mode)
    }
}
