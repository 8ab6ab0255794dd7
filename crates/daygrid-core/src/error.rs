//! Error types for option resolution.

/// Rejections raised while resolving calendar options.
///
/// Grid, day and result operations never fail; only the configuration
/// boundary does.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    /// `week_start` was outside `0..=1`.
    #[error("week_start must be 0 (Sunday) or 1 (Monday), got {value}")]
    InvalidWeekStart { value: i64 },

    /// A disabled weekday was outside `0..=6`.
    #[error("disabled weekday must be within 0..=6, got {value}")]
    InvalidWeekday { value: i64 },

    #[error("unknown pick mode {value:?}; expected single, range or multi")]
    UnknownPickMode { value: String },

    #[error("unknown display mode {value:?}; expected month or week")]
    UnknownDisplayMode { value: String },

    #[error("unknown output type {value:?}; expected string, js-date, time or object")]
    UnknownOutputType { value: String },

    /// A count option (`weeks`, `step`) was zero or negative.
    #[error("{field} must be >= 1, got {value}")]
    NonPositive { field: &'static str, value: i64 },

    /// A date given as text matched neither the date format nor ISO 8601.
    #[error("{field}: cannot parse date {value:?} with pattern {pattern:?}")]
    InvalidDate {
        field: &'static str,
        value: String,
        pattern: String,
    },

    /// The process-wide defaults were already installed.
    #[error("process-wide default options are already set")]
    DefaultsAlreadySet,
}
