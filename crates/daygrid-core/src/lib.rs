pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod date_expr;
pub mod day;
pub mod error;
pub mod format;
pub mod grid;
pub mod instant;
pub mod options;
pub mod period;
pub mod render;
pub mod result;
pub mod selection;
pub mod service;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

pub use crate::clock::{
  Clock,
  FixedClock,
  SystemClock
};
pub use crate::day::{
  Day,
  build_day
};
pub use crate::error::OptionsError;
pub use crate::grid::{
  Grid,
  build_month_grid,
  build_week_grid
};
pub use crate::instant::Instant;
pub use crate::options::{
  Options,
  PartialOptions,
  resolve_options,
  set_default_options
};
pub use crate::period::{
  months_for_period,
  weeks_for_period,
  years_for_period
};
pub use crate::result::wrap_result;
pub use crate::selection::Selection;
pub use crate::service::CalendarService;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daygrid"
  );
  debug!(?cli.overrides, "option overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  if let Some(tz) = cfg.timezone
    && instant::set_calendar_timezone(
      tz
    )
    .is_err()
  {
    warn!(
      timezone = %tz,
      "calendar timezone already fixed"
    );
  }
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  options::set_default_options(
    cfg.defaults.clone()
  )
  .context(
    "failed to install default options"
  )?;

  let service =
    service::CalendarService::new(
      &cfg.overrides
    )
    .context(
      "invalid calendar options"
    )?;

  let mut renderer =
    render::Renderer::new(
      &cfg, cli.json
    );

  commands::dispatch(
    &service,
    &mut renderer,
    cli.command
  )?;

  info!("done");
  Ok(())
}
