//! A benchmark session: one comparison per family, perlin then splat.
//!
//! Sessions normally run in-process and hand their [`ComparisonResult`]s
//! straight to the ledger. [`scrape_aggregate`] is the older route that shells
//! out to an aggregate command and reads the speedups back from its text.

use std::process::Stdio;

use tracing::{info, warn};

use crate::compare::{Comparator, ComparisonResult};
use crate::config::BenchConfig;
use crate::error::{Error, Result};
use crate::ledger::{Ledger, LedgerStore, PerformanceRecord};
use crate::protocol::{scrape_speedups, ScrapedSpeedups};
use crate::runner::Invocation;
use crate::schema::{FamilyComparison, RunMeta, SessionReport};
use crate::Family;

/// Compare baseline and submission for one family.
pub fn run_family(
    config: &BenchConfig,
    comparator: &Comparator,
    family: Family,
    size: &str,
    seed: u64,
) -> Result<ComparisonResult> {
    let fam = config.family(family);
    let generator = fam.generator(size, seed)?;
    info!(family = family.as_str(), size, seed, "benchmarking");
    comparator.compare(&generator, &fam.baseline(), &fam.submission())
}

/// Both families' results from one session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub size: String,
    pub seed: u64,
    pub perlin: ComparisonResult,
    pub splat: ComparisonResult,
}

impl SessionOutcome {
    pub fn to_record(&self, note: &str) -> PerformanceRecord {
        PerformanceRecord::new(
            self.size.clone(),
            self.perlin.speedup,
            self.splat.speedup,
            note,
        )
    }

    pub fn to_report(&self) -> SessionReport {
        SessionReport {
            run: RunMeta::now(&self.size, self.seed),
            comparisons: vec![
                FamilyComparison {
                    family: Family::Perlin,
                    result: self.perlin.clone(),
                },
                FamilyComparison {
                    family: Family::Splat,
                    result: self.splat.clone(),
                },
            ],
        }
    }
}

/// Run every family in order, calling `on_result` as each one finishes.
///
/// The first failure aborts the session.
pub fn run_session(
    config: &BenchConfig,
    comparator: &Comparator,
    size: &str,
    seed: u64,
    mut on_result: impl FnMut(Family, &ComparisonResult),
) -> Result<SessionOutcome> {
    info!(size, seed, "running benchmark session");

    let perlin = run_family(config, comparator, Family::Perlin, size, seed)?;
    on_result(Family::Perlin, &perlin);
    let splat = run_family(config, comparator, Family::Splat, size, seed)?;
    on_result(Family::Splat, &splat);

    Ok(SessionOutcome {
        size: size.to_string(),
        seed,
        perlin,
        splat,
    })
}

/// A record just appended to the ledger.
#[derive(Debug, Clone)]
pub struct SavedRecord {
    /// 1-based position in the ledger.
    pub record_number: usize,
    pub record: PerformanceRecord,
}

fn append<S: LedgerStore>(
    ledger: &mut Ledger<S>,
    record: PerformanceRecord,
) -> Result<SavedRecord> {
    let record_number = ledger.append(record.clone())?;
    Ok(SavedRecord {
        record_number,
        record,
    })
}

/// Run a full session and append its speedups to `ledger`.
///
/// The ledger is only touched once both families have been measured.
pub fn save_session<S: LedgerStore>(
    ledger: &mut Ledger<S>,
    config: &BenchConfig,
    comparator: &Comparator,
    size: &str,
    seed: u64,
    note: &str,
    on_result: impl FnMut(Family, &ComparisonResult),
) -> Result<SavedRecord> {
    let outcome = run_session(config, comparator, size, seed, on_result)?;
    append(ledger, outcome.to_record(note))
}

/// Scrape both speedups from an aggregate command and append them to `ledger`.
///
/// Nothing is appended if either speedup cannot be extracted.
pub fn save_scraped<S: LedgerStore>(
    ledger: &mut Ledger<S>,
    command: &Invocation,
    size: &str,
    note: &str,
) -> Result<SavedRecord> {
    let speedups = scrape_aggregate(command)?;
    append(
        ledger,
        PerformanceRecord::new(size, speedups.perlin, speedups.splat, note),
    )
}

/// Run an aggregate benchmark command and read both speedups from its output.
///
/// Stdout and stderr are scanned together. A non-zero exit is logged but the
/// output is still scraped; only missing metrics are an error.
pub fn scrape_aggregate(command: &Invocation) -> Result<ScrapedSpeedups> {
    info!(%command, "running aggregate benchmark");
    let output = command
        .command()
        .stdin(Stdio::null())
        .output()
        .map_err(|source| Error::Spawn {
            program: command.program.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        warn!(status = ?output.status.code(), "aggregate benchmark exited unsuccessfully");
    }

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    scrape_speedups(&text)
}
