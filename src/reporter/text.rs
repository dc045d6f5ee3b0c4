use crossterm::style::{StyledContent, Stylize};
use itertools::Itertools;
use std::{cmp::Reverse, io::Write};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Margin, Padding, Style,
        object::{Cell, Columns, FirstColumn, LastColumn, Object, Rows},
        themes::Colorization,
    },
};

use super::{format, roles};
use crate::{accumulator::Snapshot, histogram::PERCENTAGES, report::LoadTestReport};

/// Plain text reporter with terminal colors.
pub struct TextReporter;

impl super::LoadTestReporter for TextReporter {
    fn print(&self, w: &mut dyn Write, report: &LoadTestReport) -> anyhow::Result<()> {
        print_summary(w, report)?;
        writeln!(w)?;

        print_results(w, report)?;
        writeln!(w)?;

        for (role, snapshot) in roles(report) {
            print_latency(w, role, snapshot)?;
        }

        for (role, snapshot) in roles(report) {
            print_errors(w, role, snapshot)?;
        }

        Ok(())
    }
}

fn render_success_ratio(success_rate: f64) -> StyledContent<String> {
    let text = format!("{:.2}%", success_rate);
    if success_rate >= 100.0 {
        text.green().bold()
    } else if success_rate >= 99.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

#[rustfmt::skip]
fn print_summary(w: &mut dyn Write, report: &LoadTestReport) -> anyhow::Result<()> {
    let results = &report.results;

    writeln!(w, "{}", "Summary".h1())?;
    writeln!(w,       "  Mode:          {}", results.mode.to_string().green().bold())?;
    writeln!(w,       "  Started:       {}", results.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().green())?;
    writeln!(w,       "  Time:          {}", format!("{:.2}s", results.elapsed.as_secs_f64()).green().bold())?;
    writeln!(w,       "  Payload:       {}", format::bytes(report.payload_size).green())?;
    writeln!(w,       "  Planned:       {}", format!("{} sends, {} receives", report.produce_count, report.consume_count).green())?;
    for (role, snapshot) in roles(report) {
        writeln!(w,   "  Success ratio: {} ({role})", render_success_ratio(100.0 * snapshot.success_ratio()))?;
    }
    Ok(())
}

fn print_results(w: &mut dyn Write, report: &LoadTestReport) -> anyhow::Result<()> {
    writeln!(w, "{}", "Results".h1())?;

    let header = ["", "Total", "Success", "Failed", "Elapsed", "Bytes", "Accum. size", "Time ratio", "Sec/payload"];
    let mut rows = vec![header.map(String::from).to_vec()];
    for (role, s) in roles(report) {
        rows.push(vec![
            role.to_owned(),
            s.iterations().to_string(),
            s.success_count.to_string(),
            s.failure_count.to_string(),
            format::duration(s.total_elapsed),
            format::bytes(s.total_payload_bytes),
            s.accumulative_payload_size().to_string(),
            format::metric(s.throughput_metric(), 3),
            format::metric(s.seconds_per_payload(), 6),
        ]);
    }
    let n = rows.len();

    let mut table = Builder::from(rows).build();
    table
        .with(Style::empty())
        .with(Alignment::center())
        .with(Padding::new(2, 2, 0, 0))
        .with(Colorization::exact([Color::BOLD], Rows::first()))
        .with(Colorization::exact([Color::FG_GREEN], Rows::new(1..n).not(Columns::first())))
        .with(Colorization::exact([Color::FG_RED], Rows::new(1..n).intersect(Columns::new(3..=3))));
    writeln!(w, "{}", table)?;
    Ok(())
}

fn print_latency(w: &mut dyn Write, role: &str, snapshot: &Snapshot) -> anyhow::Result<()> {
    let hist = &snapshot.latency;
    writeln!(w, "{}", format!("Latencies ({role})").h1())?;
    if hist.is_empty() {
        writeln!(w, "  {}", "no successful operations".red())?;
        writeln!(w)?;
        return Ok(());
    }

    let stats = vec![
        vec!["Avg".into(), "Min".into(), "Med".into(), "Max".into(), "Stdev".into()],
        vec![
            format::duration(hist.mean()),
            format::duration(hist.min()),
            format::duration(hist.median()),
            format::duration(hist.max()),
            format::duration(hist.stdev()),
        ],
    ];
    let mut stats = Builder::from(stats).build();
    stats
        .with(Style::empty())
        .with(Margin::new(1, 0, 0, 0))
        .with(Alignment::center())
        .with(Colorization::exact([Color::FG_GREEN], Rows::new(1..=1)))
        .with(Colorization::exact([Color::FG_BLUE], Cell::new(0, 0)))
        .with(Colorization::exact([Color::FG_CYAN], Cell::new(0, 1)))
        .with(Colorization::exact([Color::FG_YELLOW], Cell::new(0, 2)))
        .with(Colorization::exact([Color::FG_RED], Cell::new(0, 3)))
        .with(Colorization::exact([Color::FG_MAGENTA], Cell::new(0, 4)));
    writeln!(w, "{}", stats)?;
    writeln!(w)?;

    writeln!(w, "{}", "  Percentiles".h2())?;
    let percentiles = hist
        .percentiles(PERCENTAGES)
        .map(|(p, v)| vec![format!("{:.2}%", p), " in ".to_owned(), format::duration(v)]);
    let mut percentiles = Builder::from_iter(percentiles).build();
    percentiles
        .with(Style::empty())
        .with(Margin::new(3, 0, 0, 0))
        .with(Alignment::center())
        .with(Padding::zero())
        .with(Colorization::exact([Color::FG_GREEN], FirstColumn))
        .with(Colorization::exact([Color::FG_GREEN], LastColumn))
        .modify(LastColumn, Alignment::right());
    writeln!(w, "{}", percentiles)?;
    writeln!(w)?;
    Ok(())
}

fn print_errors(w: &mut dyn Write, role: &str, snapshot: &Snapshot) -> anyhow::Result<()> {
    let errors = snapshot
        .error_dist
        .iter()
        .sorted_unstable_by_key(|(_, cnt)| Reverse(**cnt))
        .collect_vec();
    if let Some(max) = errors.iter().map(|(_, cnt)| **cnt).max() {
        let width = max.to_string().len();
        writeln!(w, "{}", format!("Error distribution ({role})").h1())?;
        for (error, count) in errors {
            writeln!(w, "{}", format!("  [{count:>width$}] {error}").red())?;
        }
        writeln!(w)?;
    }
    Ok(())
}

trait ReportStyle {
    fn h1(&self) -> StyledContent<&str>;
    fn h2(&self) -> StyledContent<&str>;
}

impl<T: AsRef<str>> ReportStyle for T {
    fn h1(&self) -> StyledContent<&str> {
        self.as_ref().bold().underlined().yellow()
    }

    fn h2(&self) -> StyledContent<&str> {
        self.as_ref().bold().cyan()
    }
}
