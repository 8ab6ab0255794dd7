//! Wrapping selected days into the shapes handed back to callers.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::day::Day;
use crate::format;
use crate::instant::Instant;
use crate::options::{DEFAULT_DATE_FORMAT, OutputType, PickMode};

/// Every common view of one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultUnit {
    pub time: Instant,
    /// Whole seconds since the epoch.
    pub unix: i64,
    pub date_obj: DateTime<FixedOffset>,
    /// `YYYY-MM-DD`, independent of the configured date format.
    pub string: String,
    pub years: i32,
    /// 1 to 12.
    pub months: u32,
    pub date: u32,
}

pub fn multi_format(time: Instant) -> ResultUnit {
    ResultUnit {
        time,
        unix: time.unix_seconds(),
        date_obj: time.to_local().fixed_offset(),
        string: format::format_instant(time, DEFAULT_DATE_FORMAT),
        years: time.year(),
        months: time.month(),
        date: time.day(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PickResult {
    Single(ResultUnit),
    Range { from: ResultUnit, to: ResultUnit },
    Multi(Vec<ResultUnit>),
}

/// Shapes `days` for `pick_mode`; `None` when nothing is selected.
///
/// A range with only a start reports the start as both ends.
pub fn wrap_result(days: &[Day], pick_mode: PickMode) -> Option<PickResult> {
    let times: Vec<Instant> = days.iter().map(|day| day.time).collect();
    wrap_instants(&times, pick_mode)
}

pub fn wrap_instants(times: &[Instant], pick_mode: PickMode) -> Option<PickResult> {
    let first = *times.first()?;
    let result = match pick_mode {
        PickMode::Single => PickResult::Single(multi_format(first)),
        PickMode::Range => PickResult::Range {
            from: multi_format(first),
            to: multi_format(times.get(1).copied().unwrap_or(first)),
        },
        PickMode::Multi => PickResult::Multi(times.iter().copied().map(multi_format).collect()),
    };
    Some(result)
}

/// Calendar fields of an instant in the calendar timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
}

impl DateFields {
    pub fn of(time: Instant) -> Self {
        let local = time.to_local();
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
            millisecond: local.timestamp_subsec_millis(),
        }
    }
}

/// One date in the caller's requested representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    String(String),
    Date(DateTime<FixedOffset>),
    Time(i64),
    Object(DateFields),
}

impl Payload {
    /// Recovers the instant a payload stands for.
    pub fn to_instant(&self, pattern: &str) -> Option<Instant> {
        match self {
            Self::String(text) => parse_payload(text, pattern),
            Self::Date(dt) => Some(Instant::from_utc(dt.to_utc())),
            Self::Time(ms) => Some(Instant::from_millis(*ms)),
            Self::Object(fields) => {
                let date =
                    chrono::NaiveDate::from_ymd_opt(fields.year, fields.month, fields.day)?;
                let naive = date.and_hms_milli_opt(
                    fields.hour,
                    fields.minute,
                    fields.second,
                    fields.millisecond,
                )?;
                Some(Instant::from_local_datetime(naive))
            }
        }
    }
}

pub fn to_payload(time: Instant, output_type: OutputType, pattern: &str) -> Payload {
    match output_type {
        OutputType::String => Payload::String(format::format_instant(time, pattern)),
        OutputType::JsDate => Payload::Date(time.to_local().fixed_offset()),
        OutputType::Time => Payload::Time(time.millis()),
        OutputType::Object => Payload::Object(DateFields::of(time)),
    }
}

/// Payload counterpart of [`PickResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PayloadResult {
    Single(Payload),
    Range { from: Payload, to: Payload },
    Multi(Vec<Payload>),
}

impl PickResult {
    pub fn to_payloads(&self, output_type: OutputType, pattern: &str) -> PayloadResult {
        let convert = |unit: &ResultUnit| to_payload(unit.time, output_type, pattern);
        match self {
            Self::Single(unit) => PayloadResult::Single(convert(unit)),
            Self::Range { from, to } => PayloadResult::Range {
                from: convert(from),
                to: convert(to),
            },
            Self::Multi(units) => PayloadResult::Multi(units.iter().map(convert).collect()),
        }
    }

    pub fn instants(&self) -> Vec<Instant> {
        match self {
            Self::Single(unit) => vec![unit.time],
            Self::Range { from, to } => vec![from.time, to.time],
            Self::Multi(units) => units.iter().map(|unit| unit.time).collect(),
        }
    }
}

/// Parses a string payload back into an instant.
pub fn parse_payload(text: &str, pattern: &str) -> Option<Instant> {
    let parsed = format::parse_flexible(text, pattern);
    if parsed.is_none() {
        warn!(text, pattern, "payload matched neither the pattern nor ISO 8601");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> Instant {
        Instant::from_ymd(year, month, day).expect("valid date")
    }

    #[test]
    fn multi_format_fills_every_field() {
        let time = ymd(2024, 2, 29);
        let unit = multi_format(time);
        assert_eq!(unit.time, time);
        assert_eq!(unit.unix, time.millis() / 1000);
        assert_eq!(unit.string, "2024-02-29");
        assert_eq!((unit.years, unit.months, unit.date), (2024, 2, 29));
        assert_eq!(unit.date_obj.timestamp_millis(), time.millis());
    }

    #[test]
    fn empty_input_wraps_to_none() {
        for mode in [PickMode::Single, PickMode::Range, PickMode::Multi] {
            assert!(wrap_instants(&[], mode).is_none());
        }
    }

    #[test]
    fn range_with_one_day_repeats_it() {
        let Some(PickResult::Range { from, to }) = wrap_instants(&[ymd(2024, 5, 3)], PickMode::Range)
        else {
            panic!("expected a range");
        };
        assert_eq!(from, to);
        assert_eq!(from.date, 3);
    }

    #[test]
    fn single_takes_first_and_multi_keeps_order() {
        let times = [ymd(2024, 5, 9), ymd(2024, 5, 2)];
        assert_eq!(
            wrap_instants(&times, PickMode::Single),
            Some(PickResult::Single(multi_format(times[0])))
        );
        let Some(PickResult::Multi(units)) = wrap_instants(&times, PickMode::Multi) else {
            panic!("expected multi");
        };
        let days: Vec<u32> = units.iter().map(|u| u.date).collect();
        assert_eq!(days, vec![9, 2]);
    }

    #[test]
    fn payloads_follow_output_type() {
        let time = ymd(2024, 7, 4);
        assert_eq!(
            to_payload(time, OutputType::String, "DD/MM/YYYY"),
            Payload::String("04/07/2024".to_string())
        );
        assert_eq!(to_payload(time, OutputType::Time, ""), Payload::Time(time.millis()));
        let Payload::Object(fields) = to_payload(time, OutputType::Object, "") else {
            panic!("expected object");
        };
        assert_eq!((fields.year, fields.month, fields.day, fields.hour), (2024, 7, 4, 0));
        let Payload::Date(dt) = to_payload(time, OutputType::JsDate, "") else {
            panic!("expected date");
        };
        assert_eq!(dt.timestamp_millis(), time.millis());
    }

    #[test]
    fn payloads_convert_back_to_instants() {
        let time = ymd(2024, 7, 4);
        for output in [
            OutputType::String,
            OutputType::JsDate,
            OutputType::Time,
            OutputType::Object,
        ] {
            let payload = to_payload(time, output, "DD/MM/YYYY");
            assert_eq!(payload.to_instant("DD/MM/YYYY"), Some(time), "{output:?}");
        }
    }

    #[test]
    fn parse_payload_falls_back_to_iso() {
        assert_eq!(parse_payload("2024-07-04", "DD/MM/YYYY"), Some(ymd(2024, 7, 4)));
        assert_eq!(parse_payload("04/07/2024", "DD/MM/YYYY"), Some(ymd(2024, 7, 4)));
        assert_eq!(parse_payload("tomorrow", "DD/MM/YYYY"), None);
    }

    #[test]
    fn range_payloads_keep_shape() {
        let result = wrap_instants(&[ymd(2024, 1, 1), ymd(2024, 1, 9)], PickMode::Range)
            .expect("non-empty");
        let payloads = result.to_payloads(OutputType::Time, "");
        assert_eq!(
            payloads,
            PayloadResult::Range {
                from: Payload::Time(ymd(2024, 1, 1).millis()),
                to: Payload::Time(ymd(2024, 1, 9).millis()),
            }
        );
        assert_eq!(result.instants(), vec![ymd(2024, 1, 1), ymd(2024, 1, 9)]);
    }
}
