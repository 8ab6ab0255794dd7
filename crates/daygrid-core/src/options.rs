//! Calendar options: the raw partial layer callers and config files supply,
//! and the validated record the engine reads.
//!
//! Resolution merges three layers, lowest precedence first: built-in
//! defaults, the process-wide defaults installed with
//! [`set_default_options`], and the call-site [`PartialOptions`].

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::OptionsError;
use crate::format;
use crate::instant::Instant;

pub const DEFAULT_STEP: u32 = 12;
pub const DEFAULT_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const DEFAULT_MONTH_FORMAT: &str = "MMM YYYY";
pub const DEFAULT_YEAR_FORMAT: &str = "YYYY";
pub const DEFAULT_COLOR: &str = "primary";
pub const DEFAULT_TITLE: &str = "CALENDAR";
pub const DEFAULT_CLOSE_LABEL: &str = "CANCEL";
pub const DEFAULT_DONE_LABEL: &str = "DONE";
pub const DEFAULT_WEEKDAY_LABELS: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

static DEFAULT_OPTIONS: OnceLock<PartialOptions> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickMode {
    #[default]
    Single,
    Range,
    Multi,
}

impl PickMode {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Range => "range",
            Self::Multi => "multi",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "range" => Some(Self::Range),
            "multi" => Some(Self::Multi),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Month,
    Week,
}

impl DisplayMode {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "month" => Some(Self::Month),
            "week" => Some(Self::Week),
            _ => None,
        }
    }
}

/// First column of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Weekday number of the first column, 0 = Sunday.
    pub fn index(self) -> u32 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
        }
    }

    pub fn from_index(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Sunday),
            1 => Some(Self::Monday),
            _ => None,
        }
    }
}

/// Representation handed back for a selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    /// Text rendered with the date format.
    #[default]
    String,
    /// A zoned date-time value.
    JsDate,
    /// Raw milliseconds.
    Time,
    /// Field-decomposed object.
    Object,
}

impl OutputType {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::JsDate => "js-date",
            Self::Time => "time",
            Self::Object => "object",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "js-date" | "date" => Some(Self::JsDate),
            "time" => Some(Self::Time),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

/// A date as supplied by a caller: epoch milliseconds or text in the date
/// format (ISO 8601 is always accepted too).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

impl From<Instant> for DateInput {
    fn from(value: Instant) -> Self {
        Self::Millis(value.millis())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDayConfig {
    pub date: DateInput,
    #[serde(default)]
    pub disable: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub marked: Option<bool>,
    #[serde(default)]
    pub css_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDateRange {
    #[serde(default)]
    pub from: Option<DateInput>,
    #[serde(default)]
    pub to: Option<DateInput>,
}

/// Caller-supplied options; every field is optional and enum-like values are
/// kept raw until [`resolve_options`] validates them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialOptions {
    pub id: Option<String>,
    pub from: Option<DateInput>,
    pub to: Option<DateInput>,
    pub pick_mode: Option<String>,
    pub can_backwards_selected: Option<bool>,
    pub disable_weeks: Option<Vec<i64>>,
    pub days_config: Option<Vec<PartialDayConfig>>,
    pub week_start: Option<i64>,
    pub show_adjacent_month_day: Option<bool>,
    pub display_mode: Option<String>,
    pub weeks: Option<i64>,
    pub continuous: Option<bool>,
    pub step: Option<i64>,
    pub default_title: Option<String>,
    pub default_subtitle: Option<String>,
    pub month_format: Option<String>,
    pub year_format: Option<String>,
    pub date_format: Option<String>,
    pub output_type: Option<String>,
    pub color: Option<String>,
    pub css_class: Option<String>,
    pub title: Option<String>,
    pub close_label: Option<String>,
    pub done_label: Option<String>,
    pub clear_label: Option<String>,
    pub close_icon: Option<bool>,
    pub done_icon: Option<bool>,
    pub auto_done: Option<bool>,
    pub is_save_history: Option<bool>,
    pub show_year_picker: Option<bool>,
    pub default_end_date_to_start_date: Option<bool>,
    pub weekdays: Option<Vec<String>>,
    pub default_scroll_to: Option<DateInput>,
    pub default_date: Option<DateInput>,
    pub default_dates: Option<Vec<DateInput>>,
    pub default_date_range: Option<PartialDateRange>,
}

fn pick<T: Clone>(top: &Option<T>, base: &Option<T>) -> Option<T> {
    top.clone().or_else(|| base.clone())
}

impl PartialOptions {
    /// Field-wise merge: values set on `self` win over `base`.
    ///
    /// The pre-existing selection and the scroll target belong to one call
    /// site and never come from `base`.
    pub fn layered_over(&self, base: &PartialOptions) -> PartialOptions {
        PartialOptions {
            id: pick(&self.id, &base.id),
            from: pick(&self.from, &base.from),
            to: pick(&self.to, &base.to),
            pick_mode: pick(&self.pick_mode, &base.pick_mode),
            can_backwards_selected: pick(
                &self.can_backwards_selected,
                &base.can_backwards_selected,
            ),
            disable_weeks: pick(&self.disable_weeks, &base.disable_weeks),
            days_config: pick(&self.days_config, &base.days_config),
            week_start: pick(&self.week_start, &base.week_start),
            show_adjacent_month_day: pick(
                &self.show_adjacent_month_day,
                &base.show_adjacent_month_day,
            ),
            display_mode: pick(&self.display_mode, &base.display_mode),
            weeks: pick(&self.weeks, &base.weeks),
            continuous: pick(&self.continuous, &base.continuous),
            step: pick(&self.step, &base.step),
            default_title: pick(&self.default_title, &base.default_title),
            default_subtitle: pick(&self.default_subtitle, &base.default_subtitle),
            month_format: pick(&self.month_format, &base.month_format),
            year_format: pick(&self.year_format, &base.year_format),
            date_format: pick(&self.date_format, &base.date_format),
            output_type: pick(&self.output_type, &base.output_type),
            color: pick(&self.color, &base.color),
            css_class: pick(&self.css_class, &base.css_class),
            title: pick(&self.title, &base.title),
            close_label: pick(&self.close_label, &base.close_label),
            done_label: pick(&self.done_label, &base.done_label),
            clear_label: pick(&self.clear_label, &base.clear_label),
            close_icon: pick(&self.close_icon, &base.close_icon),
            done_icon: pick(&self.done_icon, &base.done_icon),
            auto_done: pick(&self.auto_done, &base.auto_done),
            is_save_history: pick(&self.is_save_history, &base.is_save_history),
            show_year_picker: pick(&self.show_year_picker, &base.show_year_picker),
            default_end_date_to_start_date: pick(
                &self.default_end_date_to_start_date,
                &base.default_end_date_to_start_date,
            ),
            weekdays: pick(&self.weekdays, &base.weekdays),
            default_scroll_to: self.default_scroll_to.clone(),
            default_date: self.default_date.clone(),
            default_dates: self.default_dates.clone(),
            default_date_range: self.default_date_range.clone(),
        }
    }
}

/// A per-day override. `None` fields leave the computed value alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayConfig {
    pub date: Instant,
    pub disable: Option<bool>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub marked: Option<bool>,
    pub css_class: Option<String>,
}

/// The caller's pre-existing selection, shaped by the pick mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DefaultSelection {
    #[default]
    None,
    Single { date: Instant },
    Range { from: Option<Instant>, to: Option<Instant> },
    Multi { dates: Vec<Instant> },
}

/// Fully resolved options for one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub id: String,
    pub from: Instant,
    /// `None` means "up to now", evaluated when a day is built.
    pub to: Option<Instant>,
    pub pick_mode: PickMode,
    pub can_backwards_selected: bool,
    /// Weekday numbers, 0 = Sunday.
    pub disable_weeks: BTreeSet<u32>,
    pub days_config: Vec<DayConfig>,
    pub week_start: WeekStart,
    pub show_adjacent_month_day: bool,
    pub display_mode: DisplayMode,
    /// Weeks advanced per page in week mode.
    pub weeks: u32,
    /// Week paging ignores month boundaries when set.
    pub continuous: bool,
    /// Months per scroll page, for collaborators that render a month list.
    pub step: u32,
    pub default_title: String,
    pub default_subtitle: String,
    pub month_format: String,
    pub year_format: String,
    pub date_format: String,
    pub output_type: OutputType,
    pub color: String,
    pub css_class: String,
    pub title: String,
    pub close_label: String,
    pub done_label: String,
    pub clear_label: Option<String>,
    pub close_icon: bool,
    pub done_icon: bool,
    pub auto_done: bool,
    pub is_save_history: bool,
    pub show_year_picker: bool,
    pub default_end_date_to_start_date: bool,
    pub weekdays: Vec<String>,
    pub default_scroll_to: Instant,
    pub default_selection: DefaultSelection,
}

impl Options {
    /// Built-in defaults with `from` and the scroll target at `now`.
    pub fn defaults(now: Instant) -> Self {
        Self {
            id: String::new(),
            from: now,
            to: None,
            pick_mode: PickMode::Single,
            can_backwards_selected: false,
            disable_weeks: BTreeSet::new(),
            days_config: Vec::new(),
            week_start: WeekStart::Sunday,
            show_adjacent_month_day: true,
            display_mode: DisplayMode::Month,
            weeks: 1,
            continuous: false,
            step: DEFAULT_STEP,
            default_title: String::new(),
            default_subtitle: String::new(),
            month_format: DEFAULT_MONTH_FORMAT.to_string(),
            year_format: DEFAULT_YEAR_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            output_type: OutputType::String,
            color: DEFAULT_COLOR.to_string(),
            css_class: String::new(),
            title: DEFAULT_TITLE.to_string(),
            close_label: DEFAULT_CLOSE_LABEL.to_string(),
            done_label: DEFAULT_DONE_LABEL.to_string(),
            clear_label: None,
            close_icon: false,
            done_icon: false,
            auto_done: false,
            is_save_history: false,
            show_year_picker: false,
            default_end_date_to_start_date: false,
            weekdays: DEFAULT_WEEKDAY_LABELS.iter().map(|s| s.to_string()).collect(),
            default_scroll_to: now,
            default_selection: DefaultSelection::None,
        }
    }

    /// First override for the calendar day of `time`.
    pub fn find_day_config(&self, time: Instant) -> Option<&DayConfig> {
        self.days_config.iter().find(|cfg| cfg.date.is_same_day(time))
    }

    /// The upper selectable bound, with an unset `to` read as `now`.
    pub fn effective_to(&self, now: Instant) -> Instant {
        self.to.unwrap_or(now)
    }
}

/// Installs the process-wide defaults layer. Only the first call succeeds.
pub fn set_default_options(defaults: PartialOptions) -> Result<(), OptionsError> {
    DEFAULT_OPTIONS
        .set(defaults)
        .map_err(|_| OptionsError::DefaultsAlreadySet)
}

pub fn default_options() -> Option<&'static PartialOptions> {
    DEFAULT_OPTIONS.get()
}

/// Resolves `partial` over the process-wide defaults and the built-ins.
pub fn resolve_options(partial: &PartialOptions, now: Instant) -> Result<Options, OptionsError> {
    resolve_layered(default_options(), partial, now)
}

#[tracing::instrument(skip_all)]
pub fn resolve_layered(
    defaults: Option<&PartialOptions>,
    partial: &PartialOptions,
    now: Instant,
) -> Result<Options, OptionsError> {
    let merged = match defaults {
        Some(base) => partial.layered_over(base),
        None => partial.layered_over(&PartialOptions::default()),
    };
    let mut opts = Options::defaults(now);

    if let Some(date_format) = merged.date_format {
        opts.date_format = date_format;
    }
    let pattern = opts.date_format.clone();

    if let Some(from) = resolve_date("from", merged.from.as_ref(), &pattern)? {
        opts.from = from;
    }
    opts.to = resolve_date("to", merged.to.as_ref(), &pattern)?;
    // A zero `to` is the "unbounded" sentinel.
    if opts.to == Some(Instant::from_millis(0)) {
        opts.to = None;
    }

    if let Some(raw) = merged.pick_mode {
        opts.pick_mode =
            PickMode::from_key(&raw).ok_or(OptionsError::UnknownPickMode { value: raw })?;
    }
    if let Some(raw) = merged.display_mode {
        opts.display_mode =
            DisplayMode::from_key(&raw).ok_or(OptionsError::UnknownDisplayMode { value: raw })?;
    }
    if let Some(raw) = merged.output_type {
        opts.output_type =
            OutputType::from_key(&raw).ok_or(OptionsError::UnknownOutputType { value: raw })?;
    }
    if let Some(raw) = merged.week_start {
        opts.week_start =
            WeekStart::from_index(raw).ok_or(OptionsError::InvalidWeekStart { value: raw })?;
    }

    if let Some(raw) = merged.disable_weeks {
        opts.disable_weeks = raw
            .into_iter()
            .map(|value| match u32::try_from(value) {
                Ok(day) if day <= 6 => Ok(day),
                _ => Err(OptionsError::InvalidWeekday { value }),
            })
            .collect::<Result<_, _>>()?;
    }

    if let Some(raw) = merged.weeks {
        opts.weeks = positive("weeks", raw)?;
    }
    if let Some(raw) = merged.step {
        opts.step = positive("step", raw)?;
    }

    if let Some(raw) = merged.days_config {
        opts.days_config = raw
            .into_iter()
            .map(|cfg| -> Result<DayConfig, OptionsError> {
                let date = resolve_date("days_config.date", Some(&cfg.date), &pattern)?
                    .unwrap_or(now);
                Ok(DayConfig {
                    date,
                    disable: cfg.disable,
                    title: cfg.title,
                    subtitle: cfg.subtitle,
                    marked: cfg.marked,
                    css_class: cfg.css_class,
                })
            })
            .collect::<Result<_, _>>()?;
    }

    set_if(&mut opts.id, merged.id);
    set_if(&mut opts.can_backwards_selected, merged.can_backwards_selected);
    set_if(&mut opts.show_adjacent_month_day, merged.show_adjacent_month_day);
    set_if(&mut opts.continuous, merged.continuous);
    set_if(&mut opts.default_title, merged.default_title);
    set_if(&mut opts.default_subtitle, merged.default_subtitle);
    set_if(&mut opts.month_format, merged.month_format);
    set_if(&mut opts.year_format, merged.year_format);
    set_if(&mut opts.color, merged.color);
    set_if(&mut opts.css_class, merged.css_class);
    set_if(&mut opts.title, merged.title);
    set_if(&mut opts.close_label, merged.close_label);
    set_if(&mut opts.done_label, merged.done_label);
    set_if(&mut opts.close_icon, merged.close_icon);
    set_if(&mut opts.done_icon, merged.done_icon);
    set_if(&mut opts.auto_done, merged.auto_done);
    set_if(&mut opts.is_save_history, merged.is_save_history);
    set_if(&mut opts.show_year_picker, merged.show_year_picker);
    set_if(
        &mut opts.default_end_date_to_start_date,
        merged.default_end_date_to_start_date,
    );
    set_if(&mut opts.weekdays, merged.weekdays);
    opts.clear_label = merged.clear_label;

    opts.default_scroll_to =
        resolve_date("default_scroll_to", merged.default_scroll_to.as_ref(), &pattern)?
            .unwrap_or(opts.from);

    opts.default_selection = match opts.pick_mode {
        PickMode::Single => {
            match resolve_date("default_date", merged.default_date.as_ref(), &pattern)? {
                Some(date) => DefaultSelection::Single { date },
                None => DefaultSelection::None,
            }
        }
        PickMode::Range => match merged.default_date_range {
            Some(range) => {
                let from = resolve_date("default_date_range.from", range.from.as_ref(), &pattern)?;
                let to = resolve_date("default_date_range.to", range.to.as_ref(), &pattern)?;
                if from.is_none() && to.is_none() {
                    DefaultSelection::None
                } else {
                    DefaultSelection::Range { from, to }
                }
            }
            None => DefaultSelection::None,
        },
        PickMode::Multi => {
            let dates = merged
                .default_dates
                .unwrap_or_default()
                .iter()
                .map(|raw| resolve_date("default_dates", Some(raw), &pattern))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect::<Vec<_>>();
            if dates.is_empty() {
                DefaultSelection::None
            } else {
                DefaultSelection::Multi { dates }
            }
        }
    };

    debug!(
        pick_mode = opts.pick_mode.as_key(),
        display_mode = opts.display_mode.as_key(),
        week_start = opts.week_start.index(),
        from = %opts.from,
        to = ?opts.to.map(|t| t.to_string()),
        overrides = opts.days_config.len(),
        "resolved calendar options"
    );
    Ok(opts)
}

fn set_if<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn positive(field: &'static str, raw: i64) -> Result<u32, OptionsError> {
    match u32::try_from(raw) {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(OptionsError::NonPositive { field, value: raw }),
    }
}

fn resolve_date(
    field: &'static str,
    raw: Option<&DateInput>,
    pattern: &str,
) -> Result<Option<Instant>, OptionsError> {
    match raw {
        None => Ok(None),
        Some(DateInput::Millis(ms)) => Ok(Some(Instant::from_millis(*ms))),
        Some(DateInput::Text(text)) => {
            trace!(field, text = %text, "parsing date option");
            format::parse_flexible(text, pattern)
                .map(Some)
                .ok_or_else(|| OptionsError::InvalidDate {
                    field,
                    value: text.clone(),
                    pattern: pattern.to_string(),
                })
        }
    }
}
