use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use regex::Regex;

use crate::format;
use crate::instant::{
  Instant,
  TimeUnit
};

fn relative_regex()
-> anyhow::Result<&'static Regex> {
  static REL_RE: OnceLock<Regex> =
    OnceLock::new();
  if let Some(re) = REL_RE.get() {
    return Ok(re);
  }
  let re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwmy])$"
  )
  .map_err(|e| {
    anyhow!(
      "internal regex compile failure: {e}"
    )
  })?;
  Ok(REL_RE.get_or_init(|| re))
}

/// Parses a date typed on the command
/// line.
///
/// Accepts `now`, `today`, `tomorrow`,
/// `yesterday`, a 4-digit year, a month
/// name (that month of the current year),
/// a weekday name (its next occurrence),
/// relative offsets such as `+3d`, `-2w`,
/// `+1m`, `+1y`, `YYYY-MM`, and finally
/// text in `pattern` or ISO 8601.
#[tracing::instrument(skip(now, pattern), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: Instant,
  pattern: &str
) -> anyhow::Result<Instant> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let today = now.start_of_day();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(
        today.add(TimeUnit::Day, 1)
      );
    }
    | "yesterday" => {
      return Ok(
        today.subtract(TimeUnit::Day, 1)
      );
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().context(
        "invalid 4-digit year"
      )?;
    return Instant::from_ymd(
      year, 1, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid year value: {year}"
      )
    });
  }

  if let Some(weekday) =
    parse_weekday_name(&lower)
  {
    let ahead = (weekday + 7
      - today.weekday())
      % 7;
    let ahead =
      if ahead == 0 { 7 } else { ahead };
    return Ok(today.add(
      TimeUnit::Day,
      i64::from(ahead)
    ));
  }

  if let Some(month) =
    format::month_from_name(&lower)
  {
    return Instant::from_ymd(
      today.year(),
      month,
      1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid month value: {month}"
      )
    });
  }

  if let Some(caps) =
    relative_regex()?.captures(token)
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = match caps
      .name("unit")
      .map(|m| m.as_str())
    {
      | Some("d") => TimeUnit::Day,
      | Some("w") => TimeUnit::Week,
      | Some("m") => TimeUnit::Month,
      | Some("y") => TimeUnit::Year,
      | other => {
        return Err(anyhow!(
          "unknown relative unit: \
           {other:?}"
        ));
      }
    };

    return Ok(if sign == "-" {
      today.subtract(unit, num)
    } else {
      today.add(unit, num)
    });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &format!("{token}-01"),
      "%Y-%m-%d"
    )
    && token.len() <= 7
  {
    return Ok(Instant::from_local_date(
      date
    ));
  }

  format::parse_flexible(token, pattern)
    .ok_or_else(|| {
      anyhow!(
        "unrecognized date \
         expression: {input} \
         (expected {pattern}, \
         YYYY-MM-DD or a keyword)"
      )
    })
}

fn parse_weekday_name(
  lower: &str
) -> Option<u32> {
  if lower.len() < 3 {
    return None;
  }
  format::WEEKDAY_NAMES
    .iter()
    .position(|name| {
      name
        .to_ascii_lowercase()
        .starts_with(lower)
    })
    .map(|idx| idx as u32)
}
