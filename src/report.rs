//! Human-readable rendering of comparisons and ledger history.
//!
//! The comparison report prints a `Speedup: <n>x` line per family, which is
//! the line [`crate::protocol::scrape_speedups`] reads back.

use std::fmt;

use crate::compare::{ComparisonResult, Tier};
use crate::ledger::{MetricDelta, PerformanceRecord, Progress, Trend};

const RULE_WIDTH: usize = 60;
const RESET: &str = "\x1b[0m";

/// Rendering options.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    pub color: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self { color: true }
    }
}

impl Style {
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn paint<T: fmt::Display>(self, code: &'static str, value: T) -> Painted<T> {
        Painted {
            code: self.color.then_some(code),
            value,
        }
    }
}

struct Painted<T> {
    code: Option<&'static str>,
    value: T,
}

impl<T: fmt::Display> fmt::Display for Painted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code}{}{RESET}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

struct Rule(usize);

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("=")?;
        }
        Ok(())
    }
}

fn tier_color(tier: Tier) -> &'static str {
    match tier {
        Tier::Excellent => "\x1b[1;32m",
        Tier::Good => "\x1b[32m",
        Tier::Pass => "\x1b[33m",
        Tier::NeedsWork => "\x1b[31m",
    }
}

struct Headline<'a>(&'a ComparisonResult);

impl fmt::Display for Headline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Speedup: {:.2}x  [{}]", self.0.speedup, self.0.tier.rating())
    }
}

/// Both runs, the speedup with its rating, and the gain or loss percentage.
pub struct ComparisonReport<'a> {
    pub result: &'a ComparisonResult,
    pub style: Style,
}

impl fmt::Display for ComparisonReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        for run in [&result.baseline, &result.submission] {
            writeln!(
                f,
                "  {:<10} hash={} time_sec={:.6}",
                run.label.as_str(),
                run.output_digest,
                run.elapsed_seconds
            )?;
        }

        let rule = Rule(RULE_WIDTH);
        writeln!(f)?;
        writeln!(f, "  {rule}")?;
        let headline = self.style.paint(tier_color(result.tier), Headline(result));
        writeln!(f, "  {headline}")?;

        if result.speedup > 1.0 {
            writeln!(f, "  Performance gain: {:.1}%", (result.speedup - 1.0) * 100.0)?;
        } else if result.speedup < 1.0 {
            writeln!(f, "  Performance loss: {:.1}%", (1.0 - result.speedup) * 100.0)?;
        }
        writeln!(f, "  {rule}")
    }
}

/// Confirmation printed after `save`.
pub struct SavedReport<'a> {
    pub record_number: usize,
    pub record: &'a PerformanceRecord,
}

impl fmt::Display for SavedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✓ Performance data saved (record #{})", self.record_number)?;
        write_speedups(f, self.record)?;
        if let Some(note) = self.record.note() {
            writeln!(f, "  Note: {note}")?;
        }
        Ok(())
    }
}

pub struct HistoryReport<'a>(pub &'a [PerformanceRecord]);

impl fmt::Display for HistoryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.0;
        if records.is_empty() {
            return writeln!(f, "No performance records yet");
        }

        writeln!(f, "Performance Optimization History ({} records)\n", records.len())?;
        writeln!(f, "{}", Rule(80))?;
        for (i, record) in records.iter().enumerate() {
            writeln!(
                f,
                "\n#{} - {} [SIZE={}]",
                i + 1,
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.size
            )?;
            write_speedups(f, record)?;
            if let Some(note) = record.note() {
                writeln!(f, "  Note: {note}")?;
            }
        }
        Ok(())
    }
}

pub struct ProgressReport<'a> {
    pub progress: &'a Progress,
    pub style: Style,
}

impl fmt::Display for ProgressReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = self.progress;
        writeln!(f, "Performance Comparison\n")?;
        writeln!(f, "{}", Rule(80))?;

        for (heading, record) in [("Initial", &progress.first), ("Latest", &progress.last)] {
            writeln!(f, "\n{heading} ({})", record.timestamp.format("%Y-%m-%d %H:%M"))?;
            write_speedups(f, record)?;
        }

        writeln!(f, "\nProgress:")?;
        writeln!(f, "  Perlin: {}", DeltaCell(&progress.perlin, self.style))?;
        writeln!(f, "  Splat:  {}", DeltaCell(&progress.splat, self.style))?;
        writeln!(f, "\nTotal optimizations: {}", progress.total_records)
    }
}

fn write_speedups(f: &mut fmt::Formatter<'_>, record: &PerformanceRecord) -> fmt::Result {
    writeln!(f, "  Perlin: {:.2}x", record.perlin_speedup)?;
    writeln!(f, "  Splat:  {:.2}x", record.splat_speedup)
}

struct DeltaCell<'a>(&'a MetricDelta, Style);

impl fmt::Display for DeltaCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let DeltaCell(delta, style) = self;
        match delta.trend {
            Trend::Improved => {
                let text = format!("+{:.2}x ↑", delta.delta);
                write!(f, "{}", style.paint("\x1b[32m", text))
            }
            Trend::Regressed => {
                let text = format!("{:.2}x ↓", delta.delta);
                write!(f, "{}", style.paint("\x1b[31m", text))
            }
            Trend::Unchanged => f.write_str("0.00x →"),
        }
    }
}

pub fn render_comparison(result: &ComparisonResult, style: Style) -> String {
    ComparisonReport { result, style }.to_string()
}

pub fn render_saved(record_number: usize, record: &PerformanceRecord) -> String {
    SavedReport {
        record_number,
        record,
    }
    .to_string()
}

pub fn render_history(records: &[PerformanceRecord]) -> String {
    HistoryReport(records).to_string()
}

pub fn render_progress(progress: &Progress, style: Style) -> String {
    ProgressReport { progress, style }.to_string()
}
