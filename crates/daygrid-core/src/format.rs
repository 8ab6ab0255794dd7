//! Pattern formatting and parsing for instants.
//!
//! Patterns use the token set familiar from JavaScript date libraries:
//!
//! | token | output |
//! |---|---|
//! | `YYYY` / `YY` | 4-digit / 2-digit year |
//! | `MMMM` / `MMM` / `MM` / `M` | month name / short name / padded / plain |
//! | `Do` / `DD` / `D` | ordinal / padded / plain day of month |
//! | `dddd` / `ddd` / `dd` / `d` | weekday name / short / min / number (0 = Sunday) |
//! | `HH` / `H` / `hh` / `h` | 24h padded / plain, 12h padded / plain |
//! | `mm` / `m`, `ss` / `s`, `SSS` | minutes, seconds, milliseconds |
//! | `A` / `a` | `AM`/`PM`, `am`/`pm` |
//! | `X` / `x` | unix seconds / unix milliseconds |
//! | `[text]` | literal text |
//!
//! Anything else passes through unchanged.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Timelike};
use chrono_tz::Tz;
use regex::Regex;

use crate::instant::Instant;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const TOKEN_PATTERN: &str = r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|Do|DD|D|dddd|ddd|dd|d|HH|H|hh|h|mm|m|SSS|ss|s|A|a|X|x";

fn token_regex() -> Option<&'static Regex> {
    static TOKEN_RE: OnceLock<Option<Regex>> = OnceLock::new();
    TOKEN_RE
        .get_or_init(|| match Regex::new(TOKEN_PATTERN) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::error!(error = %err, "failed to compile format token regex");
                None
            }
        })
        .as_ref()
}

pub fn format_instant(instant: Instant, pattern: &str) -> String {
    let Some(re) = token_regex() else {
        return pattern.to_string();
    };

    let local = instant.to_local();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut last = 0;
    for token in re.find_iter(pattern) {
        out.push_str(&pattern[last..token.start()]);
        out.push_str(&render_token(token.as_str(), &local, instant));
        last = token.end();
    }
    out.push_str(&pattern[last..]);
    out
}

fn render_token(token: &str, local: &DateTime<Tz>, instant: Instant) -> String {
    let month_idx = local.month0() as usize;
    let weekday_idx = local.weekday().num_days_from_sunday() as usize;
    let hour12 = match local.hour() % 12 {
        0 => 12,
        h => h,
    };

    match token {
        "YYYY" => format!("{:04}", local.year()),
        "YY" => format!("{:02}", local.year().rem_euclid(100)),
        "MMMM" => MONTH_NAMES[month_idx].to_string(),
        "MMM" => MONTH_NAMES[month_idx][..3].to_string(),
        "MM" => format!("{:02}", local.month()),
        "M" => local.month().to_string(),
        "Do" => ordinal(local.day()),
        "DD" => format!("{:02}", local.day()),
        "D" => local.day().to_string(),
        "dddd" => WEEKDAY_NAMES[weekday_idx].to_string(),
        "ddd" => WEEKDAY_NAMES[weekday_idx][..3].to_string(),
        "dd" => WEEKDAY_NAMES[weekday_idx][..2].to_string(),
        "d" => weekday_idx.to_string(),
        "HH" => format!("{:02}", local.hour()),
        "H" => local.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", local.minute()),
        "m" => local.minute().to_string(),
        "ss" => format!("{:02}", local.second()),
        "s" => local.second().to_string(),
        "SSS" => format!("{:03}", instant.millis().rem_euclid(1000)),
        "A" => (if local.hour() < 12 { "AM" } else { "PM" }).to_string(),
        "a" => (if local.hour() < 12 { "am" } else { "pm" }).to_string(),
        "X" => instant.unix_seconds().to_string(),
        "x" => instant.millis().to_string(),
        literal if literal.starts_with('[') && literal.ends_with(']') => {
            literal[1..literal.len() - 1].to_string()
        }
        other => other.to_string(),
    }
}

fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year4,
    Year2,
    MonthName,
    Month,
    Day,
    Hour,
    Meridiem,
    Minute,
    Second,
    Millis,
    Ignored,
}

/// Parses `text` with `pattern`, returning `None` when the text does not fit.
///
/// Numeric tokens, month names and the meridiem are read back; weekday names
/// and unix tokens are matched but ignored. Two-digit years above 68 land in
/// the 1900s.
pub fn parse_instant(text: &str, pattern: &str) -> Option<Instant> {
    let re = token_regex()?;

    let mut source = String::from("^");
    let mut fields = Vec::new();
    let mut last = 0;
    for token in re.find_iter(pattern) {
        source.push_str(&regex::escape(&pattern[last..token.start()]));
        last = token.end();

        let (piece, field) = match token.as_str() {
            "YYYY" => (r"(\d{4})", Field::Year4),
            "YY" => (r"(\d{2})", Field::Year2),
            "MMMM" | "MMM" => (r"([A-Za-z]+)", Field::MonthName),
            "MM" | "M" => (r"(\d{1,2})", Field::Month),
            "DD" | "D" => (r"(\d{1,2})", Field::Day),
            "Do" => (r"(\d{1,2})(?:st|nd|rd|th)", Field::Day),
            "HH" | "H" | "hh" | "h" => (r"(\d{1,2})", Field::Hour),
            "mm" | "m" => (r"(\d{1,2})", Field::Minute),
            "ss" | "s" => (r"(\d{1,2})", Field::Second),
            "SSS" => (r"(\d{3})", Field::Millis),
            "A" | "a" => (r"([AaPp][Mm])", Field::Meridiem),
            "dddd" | "ddd" | "dd" => (r"([A-Za-z]+)", Field::Ignored),
            "d" | "X" | "x" => (r"(\d+)", Field::Ignored),
            literal => {
                let inner = literal
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .unwrap_or(literal);
                source.push_str(&regex::escape(inner));
                continue;
            }
        };
        source.push_str(piece);
        fields.push(field);
    }
    source.push_str(&regex::escape(&pattern[last..]));
    source.push('$');

    let parser = Regex::new(&source).ok()?;
    let caps = parser.captures(text.trim())?;

    let mut year = 1970;
    let mut month = 1;
    let mut day = 1;
    let mut hour = 0;
    let mut minute = 0;
    let mut second = 0;
    let mut millis = 0;
    let mut pm = None;

    for (idx, field) in fields.iter().enumerate() {
        let raw = caps.get(idx + 1)?.as_str();
        match field {
            Field::Year4 => year = raw.parse().ok()?,
            Field::Year2 => year = two_digit_year(raw.parse().ok()?),
            Field::MonthName => month = month_from_name(raw)?,
            Field::Month => month = raw.parse().ok()?,
            Field::Day => day = raw.parse().ok()?,
            Field::Hour => hour = raw.parse().ok()?,
            Field::Meridiem => pm = Some(raw.eq_ignore_ascii_case("pm")),
            Field::Minute => minute = raw.parse().ok()?,
            Field::Second => second = raw.parse().ok()?,
            Field::Millis => millis = raw.parse().ok()?,
            Field::Ignored => {}
        }
    }

    match pm {
        Some(true) if hour < 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_milli_opt(hour, minute, second, millis)?;
    Some(Instant::from_local_datetime(naive))
}

fn two_digit_year(yy: i32) -> i32 {
    if yy > 68 { 1900 + yy } else { 2000 + yy }
}

/// Parses a caller-supplied date: the pattern first, then `YYYY-MM-DD`,
/// then RFC 3339.
pub fn parse_flexible(text: &str, pattern: &str) -> Option<Instant> {
    let trimmed = text.trim();
    if let Some(instant) = parse_instant(trimmed, pattern) {
        return Some(instant);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(Instant::from_local_date(date));
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| Instant::from_utc(dt.to_utc()))
}

pub fn month_from_name(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.to_ascii_lowercase().starts_with(&lower))
        .map(|idx| idx as u32 + 1)
}
