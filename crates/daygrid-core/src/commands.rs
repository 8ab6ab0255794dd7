use anyhow::Context;
use tracing::{info, warn};

use crate::cli::{Command, NavDirection, NavUnit};
use crate::clock::Clock;
use crate::date_expr::parse_date_expr;
use crate::instant::Instant;
use crate::render::Renderer;
use crate::selection::{SelectOutcome, Selection};
use crate::service::CalendarService;

#[tracing::instrument(skip(service, renderer))]
pub fn dispatch<C: Clock>(
    service: &CalendarService<C>,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let options = service.options();
    let selection = service.selection();

    match command {
        Command::Month { date, count } => {
            let time = resolve_date(service, date.as_deref())?;
            let grids: Vec<_> = service
                .months_for_period(time, count)
                .iter()
                .map(|grid| grid.with_selection(&selection))
                .collect();
            renderer.print_grids(&grids, options)
        }
        Command::Week { date } => {
            let time = resolve_date(service, date.as_deref())?;
            let grids: Vec<_> = service
                .weeks_for_period(time)
                .iter()
                .map(|grid| grid.with_selection(&selection))
                .collect();
            renderer.print_grids(&grids, options)
        }
        Command::Years { year, count } => {
            let start_year = year.unwrap_or_else(|| service.now().year());
            let grids = service.years_for_period(start_year, count);
            renderer.print_grids(&grids, options)
        }
        Command::Day { date } => {
            let time = resolve_date(service, Some(&date))?;
            renderer.print_day(&service.day(time, None))
        }
        Command::Pick { dates } => {
            let selection = pick(service, selection, &dates)?;
            let result = selection.to_result();
            let payload = service.payload(&selection);
            renderer.print_pick(result.as_ref(), payload.as_ref())
        }
        Command::Nav {
            unit,
            direction,
            date,
        } => {
            let time = resolve_date(service, date.as_deref())?;
            let grid = match unit {
                NavUnit::Month => service.month(time),
                NavUnit::Week => service.week(time),
                NavUnit::Year => service.page(time),
            };
            let change = match (unit, direction) {
                (NavUnit::Year, NavDirection::Next) => service.next_year(&grid),
                (NavUnit::Year, NavDirection::Prev) => service.prev_year(&grid),
                (_, NavDirection::Next) => service.next(&grid),
                (_, NavDirection::Prev) => service.prev(&grid),
            };
            let change = crate::period::PageChange {
                grid: change.grid.with_selection(&selection),
                ..change
            };
            renderer.print_page_change(&change, options)
        }
    }
}

/// Taps each date in order, starting from the configured default selection.
fn pick<C: Clock>(
    service: &CalendarService<C>,
    mut selection: Selection,
    dates: &[String],
) -> anyhow::Result<Selection> {
    for raw in dates {
        let time = resolve_date(service, Some(raw))?;
        let day = service.day(time, None);
        match service.select(&mut selection, &day) {
            SelectOutcome::Ignored => warn!(date = %raw, "date is disabled; skipped"),
            SelectOutcome::Complete => info!(date = %raw, "selection complete"),
            SelectOutcome::Changed => {}
        }
    }
    Ok(selection)
}

fn resolve_date<C: Clock>(
    service: &CalendarService<C>,
    raw: Option<&str>,
) -> anyhow::Result<Instant> {
    let options = service.options();
    match raw {
        None => Ok(options.default_scroll_to),
        Some(raw) => parse_date_expr(raw, service.now(), &options.date_format)
            .with_context(|| format!("invalid date argument {raw:?}")),
    }
}
