use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::day::Day;
use crate::grid::{Grid, GridKind};
use crate::options::Options;
use crate::period::{self, PageChange};
use crate::result::{PayloadResult, PickResult};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    json: bool,
}

/// JSON shape of a navigation step.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView<'a> {
    #[serde(flatten)]
    change: &'a PageChange,
    can_next: bool,
    can_prev: bool,
}

#[derive(Serialize)]
struct PickView<'a> {
    result: Option<&'a PickResult>,
    payload: Option<&'a PayloadResult>,
}

impl Renderer {
    pub fn new(cfg: &Config, json: bool) -> Self {
        Self {
            color: cfg.color() && io::stdout().is_terminal(),
            json,
        }
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            json: false,
        }
    }

    #[tracing::instrument(skip_all, fields(grids = grids.len()))]
    pub fn print_grids(&mut self, grids: &[Grid], options: &Options) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        if self.json {
            return write_json(&mut out, &grids);
        }
        for (idx, grid) in grids.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            self.write_grid(&mut out, grid, options)?;
        }
        Ok(())
    }

    pub fn print_day(&mut self, day: &Day) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        if self.json {
            return write_json(&mut out, day);
        }
        write_day(&mut out, day)
    }

    pub fn print_pick(
        &mut self,
        result: Option<&PickResult>,
        payload: Option<&PayloadResult>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        if self.json {
            return write_json(&mut out, &PickView { result, payload });
        }
        match result {
            None => writeln!(out, "(nothing selected)")?,
            Some(PickResult::Single(unit)) => writeln!(out, "date   {}", unit.string)?,
            Some(PickResult::Range { from, to }) => {
                writeln!(out, "from   {}", from.string)?;
                writeln!(out, "to     {}", to.string)?;
            }
            Some(PickResult::Multi(units)) => {
                for unit in units {
                    writeln!(out, "date   {}", unit.string)?;
                }
            }
        }
        if let Some(payload) = payload {
            writeln!(out, "value  {}", serde_json::to_string(payload)?)?;
        }
        Ok(())
    }

    pub fn print_page_change(
        &mut self,
        change: &PageChange,
        options: &Options,
    ) -> anyhow::Result<()> {
        let can_next = period::can_next(&change.grid, options);
        let can_prev = period::can_prev(&change.grid, options);
        let mut out = io::stdout().lock();
        if self.json {
            let view = PageView {
                change,
                can_next,
                can_prev,
            };
            return write_json(&mut out, &view);
        }
        writeln!(out, "{} -> {}", change.old.string, change.new.string)?;
        if change.month_changed {
            writeln!(out, "month changed")?;
        }
        writeln!(out, "can prev: {can_prev}  can next: {can_next}")?;
        writeln!(out)?;
        self.write_grid(&mut out, &change.grid, options)
    }

    fn write_grid<W: Write>(&self, mut out: W, grid: &Grid, options: &Options) -> anyhow::Result<()> {
        let title = match grid.kind {
            GridKind::Month => period::month_title(grid.original.time, options),
            GridKind::Week => format!(
                "{} .. {}",
                grid.original.time.format(&options.date_format),
                grid.original.last_time.format(&options.date_format)
            ),
        };
        writeln!(out, "{title}")?;

        let headers = period::weekday_labels(options);
        let rows = grid
            .rows()
            .map(|row| row.iter().map(|slot| self.cell(slot.as_ref())).collect())
            .collect();
        write_table(&mut out, headers, rows)
    }

    fn cell(&self, day: Option<&Day>) -> String {
        let Some(day) = day else {
            return String::new();
        };
        let mut text = day.title.clone();
        if day.marked {
            text.push('*');
        }
        if day.selected {
            self.paint(&text, "7")
        } else if day.is_today {
            self.paint(&text, "1;4")
        } else if day.disabled {
            self.paint(&text, "2")
        } else if day.belongs_to_prior_month || day.belongs_to_next_month {
            self.paint(&text, "90")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(mut out: W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_day<W: Write>(mut out: W, day: &Day) -> anyhow::Result<()> {
    writeln!(out, "time      {}", day.time)?;
    writeln!(out, "title     {}", day.title)?;
    writeln!(out, "subtitle  {}", day.subtitle)?;
    writeln!(out, "today     {}", day.is_today)?;
    writeln!(out, "disabled  {}", day.disabled)?;
    writeln!(out, "marked    {}", day.marked)?;
    if !day.css_class.is_empty() {
        writeln!(out, "class     {}", day.css_class)?;
    }
    writeln!(out, "first     {}", day.is_first_of_month)?;
    writeln!(out, "last      {}", day.is_last_of_month)?;
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad_left(header, *width))
        .collect();
    writeln!(writer, "{}", header_line.join(" ").trim_end())?;

    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad_left(cell, *width))
            .collect();
        writeln!(writer, "{}", line.join(" ").trim_end())?;
    }

    Ok(())
}

/// Right-aligns `cell` to `width` visible columns.
fn pad_left(cell: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    format!("{}{}", " ".repeat(width.saturating_sub(visible)), cell)
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }
        if ch == '\x1b' {
            escaped = true;
            continue;
        }
        out.push(ch);
    }

    out
}
