use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::options::PartialOptions;

const CONFIG_ENV: &str =
  "DAYGRID_CONFIG";
const TIMEZONE_ENV: &str =
  "DAYGRID_TIMEZONE";

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
pub struct DisplaySection {
  /// ANSI colors in table output.
  pub color: Option<bool>
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
pub struct TimeSection {
  /// IANA id the calendar is read in.
  pub timezone: Option<String>
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
#[serde(default)]
struct ConfigFile {
  display:  DisplaySection,
  time:     TimeSection,
  #[serde(flatten)]
  calendar: PartialOptions
}

/// Option layers gathered from the
/// defaults file and `--set` flags.
#[derive(Debug, Clone, Default)]
pub struct Config {
  /// Process-wide defaults read from
  /// the file.
  pub defaults:     PartialOptions,
  /// Call-site options from `--set`.
  pub overrides:    PartialOptions,
  pub display:      DisplaySection,
  pub time:         TimeSection,
  /// `DAYGRID_TIMEZONE`, else the
  /// file's `[time] timezone`.
  pub timezone:     Option<Tz>,
  pub loaded_files: Vec<PathBuf>,
  override_table:   toml::Table
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let path = resolve_config_path(
      config_override
    );
    match path {
      | Some(path) if path.exists() => {
        info!(config = %path.display(), "loading calendar defaults");
        cfg.load_file(&path)?;
      }
      | Some(path)
        if config_override
          .is_some() =>
      {
        return Err(anyhow!(
          "config file {} does not \
           exist",
          path.display()
        ));
      }
      | _ => {
        warn!(
          "no calendar defaults file \
           found; using built-ins"
        );
      }
    }

    cfg.timezone = resolve_timezone(
      std::env::var(TIMEZONE_ENV)
        .ok()
        .as_deref(),
      cfg.time.timezone.as_deref()
    )?;
    if let Some(tz) = cfg.timezone {
      debug!(timezone = %tz, "configured calendar timezone");
    }

    Ok(cfg)
  }

  /// Applies `key=value` pairs to the
  /// call-site layer. Values are read as
  /// TOML and fall back to plain
  /// strings.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key =
        k.trim().replace('-', "_");
      let value = parse_value(&v);
      debug!(key = %key, value = %value, "applying override");
      self
        .override_table
        .insert(key, value);
    }

    self.overrides = toml::Value::Table(
      self.override_table.clone()
    )
    .try_into()
    .context(
      "invalid --set override"
    )?;
    Ok(())
  }

  pub fn color(&self) -> bool {
    self.display.color.unwrap_or(true)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let file: ConfigFile =
      toml::from_str(&text)
        .with_context(|| {
          format!(
            "failed to parse {}",
            path.display()
          )
        })?;
    trace!(?file.calendar, "parsed calendar defaults");

    self.defaults = file.calendar;
    self.display = file.display;
    self.time = file.time;
    self
      .loaded_files
      .push(path);
    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV)
  {
    if env_path == "/dev/null"
      || env_path.trim().is_empty()
    {
      return None;
    }
    return Some(PathBuf::from(
      env_path
    ));
  }

  dirs::config_dir().map(|dir| {
    dir
      .join("daygrid")
      .join("defaults.toml")
  })
}

/// The env var wins over the file; a
/// blank value counts as unset.
fn resolve_timezone(
  env: Option<&str>,
  file: Option<&str>
) -> anyhow::Result<Option<Tz>> {
  let (raw, source) = match (
    env.map(str::trim),
    file.map(str::trim)
  ) {
    | (Some(raw), _)
      if !raw.is_empty() =>
    {
      (raw, TIMEZONE_ENV)
    }
    | (_, Some(raw))
      if !raw.is_empty() =>
    {
      (raw, "[time] timezone")
    }
    | _ => return Ok(None)
  };

  raw.parse::<Tz>().map(Some).map_err(
    |err| {
      anyhow!(
        "invalid timezone {raw:?}          from {source}: {err}"
      )
    }
  )
}

fn parse_value(raw: &str) -> toml::Value {
  let trimmed = raw.trim();
  format!("value = {trimmed}")
    .parse::<toml::Table>()
    .ok()
    .and_then(|mut table| {
      table.remove("value")
    })
    // Dates stay text; the option
    // resolver parses them.
    .filter(|value| {
      !matches!(
        value,
        toml::Value::Datetime(_)
      )
    })
    .unwrap_or_else(|| {
      toml::Value::String(
        trimmed.to_string()
      )
    })
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::{
    Config,
    parse_value,
    resolve_timezone
  };
  use crate::options::DateInput;

  #[test]
  fn loads_defaults_and_display_section()
  {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      r#"
week_start = 1
pick_mode = "range"
disable_weeks = [0, 6]
from = "2024-01-01"

[display]
color = false
"#
    )
    .expect("write config");

    let cfg =
      Config::load(Some(file.path()))
        .expect("load");
    assert_eq!(
      cfg.defaults.week_start,
      Some(1)
    );
    assert_eq!(
      cfg.defaults.pick_mode.as_deref(),
      Some("range")
    );
    assert_eq!(
      cfg.defaults.disable_weeks,
      Some(vec![0, 6])
    );
    assert_eq!(
      cfg.defaults.from,
      Some(DateInput::Text(
        "2024-01-01".to_string()
      ))
    );
    assert!(!cfg.color());
    assert_eq!(cfg.loaded_files.len(), 1);
  }

  #[test]
  fn time_section_sets_timezone() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      r#"
week_start = 1

[time]
timezone = "Europe/Berlin"
"#
    )
    .expect("write config");

    let cfg =
      Config::load(Some(file.path()))
        .expect("load");
    assert_eq!(
      cfg.time.timezone.as_deref(),
      Some("Europe/Berlin")
    );
    assert_eq!(
      cfg.defaults.week_start,
      Some(1)
    );
  }

  #[test]
  fn env_timezone_wins_over_file() {
    assert_eq!(
      resolve_timezone(
        Some("Asia/Tokyo"),
        Some("Europe/Berlin")
      )
      .expect("resolve"),
      Some(chrono_tz::Asia::Tokyo)
    );
    assert_eq!(
      resolve_timezone(
        Some("  "),
        Some("Europe/Berlin")
      )
      .expect("resolve"),
      Some(chrono_tz::Europe::Berlin)
    );
    assert_eq!(
      resolve_timezone(None, None)
        .expect("resolve"),
      None
    );
  }

  #[test]
  fn unknown_timezone_is_an_error() {
    let err = resolve_timezone(
      None,
      Some("Mars/Olympus")
    )
    .expect_err("should fail");
    assert!(
      format!("{err:#}")
        .contains("[time] timezone")
    );
  }

  #[test]
  fn missing_explicit_file_is_an_error()
  {
    let dir = tempfile::tempdir()
      .expect("temp dir");
    let missing =
      dir.path().join("nope.toml");
    assert!(
      Config::load(Some(&missing))
        .is_err()
    );
  }

  #[test]
  fn malformed_file_is_an_error() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(file, "week_start = [")
      .expect("write config");
    let err =
      Config::load(Some(file.path()))
        .expect_err("should fail");
    assert!(
      format!("{err:#}")
        .contains("failed to parse")
    );
  }

  #[test]
  fn overrides_parse_toml_values() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides([
        (
          "week-start".to_string(),
          "1".to_string()
        ),
        (
          "pick_mode".to_string(),
          "multi".to_string()
        ),
        (
          "disable_weeks".to_string(),
          "[0, 6]".to_string()
        ),
        (
          "to".to_string(),
          "1735603200000".to_string()
        ),
        (
          "default_date".to_string(),
          "2024-05-09".to_string()
        )
      ])
      .expect("apply");

    assert_eq!(
      cfg.overrides.week_start,
      Some(1)
    );
    assert_eq!(
      cfg.overrides.pick_mode.as_deref(),
      Some("multi")
    );
    assert_eq!(
      cfg.overrides.disable_weeks,
      Some(vec![0, 6])
    );
    assert_eq!(
      cfg.overrides.to,
      Some(DateInput::Millis(
        1_735_603_200_000
      ))
    );
    assert_eq!(
      cfg.overrides.default_date,
      Some(DateInput::Text(
        "2024-05-09".to_string()
      ))
    );
    assert!(cfg.defaults.week_start.is_none());
  }

  #[test]
  fn override_type_mismatch_is_reported()
  {
    let mut cfg = Config::default();
    let result = cfg.apply_overrides([(
      "weeks".to_string(),
      "many".to_string()
    )]);
    assert!(result.is_err());
  }

  #[test]
  fn bare_words_stay_strings() {
    assert_eq!(
      parse_value("range"),
      toml::Value::String(
        "range".to_string()
      )
    );
    assert_eq!(
      parse_value("true"),
      toml::Value::Boolean(true)
    );
  }
}
