use std::fmt;
use std::sync::OnceLock;

use chrono::{
  DateTime,
  Datelike,
  Days,
  LocalResult,
  Months,
  NaiveDate,
  NaiveDateTime,
  SecondsFormat,
  TimeDelta,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};

use crate::format;
use crate::options::WeekStart;

static CALENDAR_TZ: OnceLock<Tz> =
  OnceLock::new();

/// An absolute point in time: milliseconds
/// since 1970-01-01T00:00:00Z.
///
/// Calendar fields and arithmetic are read
/// in the calendar timezone, see
/// [`calendar_timezone`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Instant(i64);

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum TimeUnit {
  Day,
  Week,
  Month,
  Year
}

/// Timezone that calendar fields are
/// read in. UTC unless one was installed
/// before the first read.
pub fn calendar_timezone() -> &'static Tz
{
  CALENDAR_TZ
    .get_or_init(|| chrono_tz::UTC)
}

/// Installs the calendar timezone. Fails
/// with the rejected zone once one is in
/// place or has already been read.
pub fn set_calendar_timezone(
  tz: Tz
) -> Result<(), Tz> {
  CALENDAR_TZ.set(tz)
}

impl Instant {
  pub const fn from_millis(
    millis: i64
  ) -> Self {
    Self(millis)
  }

  pub const fn millis(self) -> i64 {
    self.0
  }

  pub fn unix_seconds(self) -> i64 {
    self.0.div_euclid(1000)
  }

  pub fn from_utc(
    dt: DateTime<Utc>
  ) -> Self {
    Self(dt.timestamp_millis())
  }

  pub fn to_utc(self) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(
      self.0
    )
    .unwrap_or_default()
  }

  pub fn to_local(self) -> DateTime<Tz> {
    self
      .to_utc()
      .with_timezone(calendar_timezone())
  }

  pub fn local_date(self) -> NaiveDate {
    self.to_local().date_naive()
  }

  /// Local midnight of `date`.
  pub fn from_local_date(
    date: NaiveDate
  ) -> Self {
    Self::from_local_datetime(
      date.and_time(
        chrono::NaiveTime::MIN
      )
    )
  }

  pub fn from_local_datetime(
    local_naive: NaiveDateTime
  ) -> Self {
    match calendar_timezone()
      .from_local_datetime(&local_naive)
    {
      | LocalResult::Single(local_dt) => {
        Self::from_utc(
          local_dt.with_timezone(&Utc)
        )
      }
      | LocalResult::Ambiguous(
        first,
        second
      ) => {
        let chosen = if first <= second {
          first
        } else {
          second
        };
        Self::from_utc(
          chosen.with_timezone(&Utc)
        )
      }
      | LocalResult::None => {
        // Skipped wall-clock time; land
        // on the first valid instant after
        // the gap.
        let shifted = local_naive
          + TimeDelta::hours(1);
        tracing::trace!(
          local = %local_naive,
          "local time falls in a gap; shifting forward"
        );
        calendar_timezone()
          .from_local_datetime(&shifted)
          .earliest()
          .map(|dt| {
            Self::from_utc(
              dt.with_timezone(&Utc)
            )
          })
          .unwrap_or_else(|| {
            Self::from_utc(
              local_naive.and_utc()
            )
          })
      }
    }
  }

  pub fn from_ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> Option<Self> {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .map(Self::from_local_date)
  }

  pub fn year(self) -> i32 {
    self.to_local().year()
  }

  /// Month of year, 1 to 12.
  pub fn month(self) -> u32 {
    self.to_local().month()
  }

  pub fn day(self) -> u32 {
    self.to_local().day()
  }

  /// Day of week, 0 = Sunday to 6 =
  /// Saturday.
  pub fn weekday(self) -> u32 {
    self
      .to_local()
      .weekday()
      .num_days_from_sunday()
  }

  pub fn days_in_month(self) -> u32 {
    let date = self.local_date();
    days_in_month(
      date.year(),
      date.month()
    )
  }

  /// Shifts by `count` calendar units,
  /// keeping the local wall time. Month and
  /// year steps clamp the day to the
  /// target month's length.
  pub fn add(
    self,
    unit: TimeUnit,
    count: i64
  ) -> Self {
    let local =
      self.to_local().naive_local();
    let date = local.date();
    let shifted = match unit {
      | TimeUnit::Day => {
        shift_days(date, count)
      }
      | TimeUnit::Week => {
        shift_days(
          date,
          count.saturating_mul(7)
        )
      }
      | TimeUnit::Month => {
        shift_months(date, count)
      }
      | TimeUnit::Year => {
        shift_months(
          date,
          count.saturating_mul(12)
        )
      }
    };

    match shifted {
      | Some(target) => {
        Self::from_local_datetime(
          target.and_time(local.time())
        )
      }
      | None => {
        tracing::warn!(
          instant = self.0,
          ?unit,
          count,
          "calendar shift out of range; keeping instant"
        );
        self
      }
    }
  }

  pub fn subtract(
    self,
    unit: TimeUnit,
    count: i64
  ) -> Self {
    self.add(unit, count.saturating_neg())
  }

  pub fn start_of_day(self) -> Self {
    Self::from_local_date(
      self.local_date()
    )
  }

  pub fn start_of_month(self) -> Self {
    let date = self.local_date();
    Self::from_local_date(
      date.with_day(1).unwrap_or(date)
    )
  }

  /// Same wall time on another day of the
  /// month; out-of-range days clamp to the
  /// month's last day.
  pub fn with_day(
    self,
    day: u32
  ) -> Self {
    let local =
      self.to_local().naive_local();
    let date = local.date();
    let day = day.clamp(
      1,
      days_in_month(
        date.year(),
        date.month()
      )
    );
    let target =
      date.with_day(day).unwrap_or(date);
    Self::from_local_datetime(
      target.and_time(local.time())
    )
  }

  /// Local midnight starting the display
  /// week that contains this instant.
  pub fn start_of_week(
    self,
    week_start: WeekStart
  ) -> Self {
    let date = self.local_date();
    let day_idx = i64::from(
      date
        .weekday()
        .num_days_from_sunday()
    );
    let start_idx =
      i64::from(week_start.index());
    let diff =
      (7 + day_idx - start_idx) % 7;
    Self::from_local_date(
      shift_days(date, -diff)
        .unwrap_or(date)
    )
  }

  pub fn is_same_day(
    self,
    other: Instant
  ) -> bool {
    self.local_date()
      == other.local_date()
  }

  pub fn is_before_day(
    self,
    other: Instant
  ) -> bool {
    self.local_date()
      < other.local_date()
  }

  pub fn is_after_day(
    self,
    other: Instant
  ) -> bool {
    self.local_date()
      > other.local_date()
  }

  /// Inclusive calendar-day range test.
  /// An inverted range holds no day.
  pub fn is_between_days(
    self,
    from: Instant,
    to: Instant
  ) -> bool {
    let date = self.local_date();
    from.local_date() <= date
      && date <= to.local_date()
  }

  pub fn format(
    self,
    pattern: &str
  ) -> String {
    format::format_instant(self, pattern)
  }
}

impl fmt::Display for Instant {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{}",
      self.to_local().to_rfc3339_opts(
        SecondsFormat::Millis,
        true
      )
    )
  }
}

impl From<DateTime<Utc>> for Instant {
  fn from(dt: DateTime<Utc>) -> Self {
    Self::from_utc(dt)
  }
}

pub fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  )
  .and_then(|first| first.pred_opt())
  .map(|last| last.day())
  .unwrap_or(30)
}

pub(crate) fn shift_days(
  date: NaiveDate,
  days: i64
) -> Option<NaiveDate> {
  if days >= 0 {
    date.checked_add_days(Days::new(
      days.unsigned_abs()
    ))
  } else {
    date.checked_sub_days(Days::new(
      days.unsigned_abs()
    ))
  }
}

fn shift_months(
  date: NaiveDate,
  months: i64
) -> Option<NaiveDate> {
  let magnitude = u32::try_from(
    months.unsigned_abs()
  )
  .ok()?;
  if months >= 0 {
    date.checked_add_months(Months::new(
      magnitude
    ))
  } else {
    date.checked_sub_months(Months::new(
      magnitude
    ))
  }
}
