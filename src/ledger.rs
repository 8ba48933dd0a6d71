//! Append-only history of benchmark sessions.
//!
//! # File layout
//!
//! ```text
//! {
//!   "records": [
//!     {
//!       "timestamp": "2026-03-01T09:30:05.123456",
//!       "size": "S",
//!       "perlin_speedup": 2.5,
//!       "splat_speedup": 1.2,
//!       "note": "tiled loops"
//!     }
//!   ]
//! }
//! ```
//!
//! Insertion order is chronological order. A missing file is an empty ledger;
//! a file that does not parse is an error, never an empty ledger.
//!
//! Every append reads the whole file and rewrites it with no locking, so two
//! concurrent writers lose updates. Callers serialize access themselves.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::speedup_serde;

/// Default ledger file, relative to the working directory.
pub const DEFAULT_LEDGER_PATH: &str = ".performance_log.json";

/// One benchmark session as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: NaiveDateTime,
    pub size: String,
    #[serde(with = "speedup_serde")]
    pub perlin_speedup: f64,
    #[serde(with = "speedup_serde")]
    pub splat_speedup: f64,
    #[serde(default)]
    pub note: String,
}

impl PerformanceRecord {
    /// A record stamped with the current local time.
    pub fn new(
        size: impl Into<String>,
        perlin_speedup: f64,
        splat_speedup: f64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            size: size.into(),
            perlin_speedup,
            splat_speedup,
            note: note.into(),
        }
    }

    /// The annotation, if one was given.
    pub fn note(&self) -> Option<&str> {
        Some(self.note.as_str()).filter(|n| !n.is_empty())
    }
}

#[derive(Deserialize)]
struct LedgerDocument {
    records: Vec<PerformanceRecord>,
}

#[derive(Serialize)]
struct LedgerDocumentRef<'a> {
    records: &'a [PerformanceRecord],
}

/// Backing storage for a [`Ledger`].
pub trait LedgerStore {
    /// Read every record in insertion order.
    fn load(&self) -> Result<Vec<PerformanceRecord>>;

    /// Replace the stored records.
    fn save(&mut self, records: &[PerformanceRecord]) -> Result<()>;
}

/// Ledger persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl LedgerStore for FileStore {
    fn load(&self) -> Result<Vec<PerformanceRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let doc: LedgerDocument =
            serde_json::from_str(&text).map_err(|source| Error::LedgerCorrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(doc.records)
    }

    fn save(&mut self, records: &[PerformanceRecord]) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        // Write beside the target and rename over it, so readers see either
        // the old ledger or the new one.
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &LedgerDocumentRef { records })?;
        tmp.write_all(b"\n")?;

        // Temp files are created owner-only; keep the ledger's own mode.
        match fs::metadata(&self.path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                set_new_ledger_permissions(tmp.as_file())?;
            }
            Err(e) => return Err(e.into()),
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!(path = %self.path.display(), records = records.len(), "ledger rewritten");
        Ok(())
    }
}

#[cfg(unix)]
fn set_new_ledger_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_ledger_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

/// In-memory ledger storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<PerformanceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Vec<PerformanceRecord>> {
        Ok(self.records.clone())
    }

    fn save(&mut self, records: &[PerformanceRecord]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// Direction of a metric between two records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improved,
    Regressed,
    Unchanged,
}

impl Trend {
    /// Sign of `delta`; NaN (e.g. `inf - inf`) counts as unchanged.
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Trend::Improved
        } else if delta < 0.0 {
            Trend::Regressed
        } else {
            Trend::Unchanged
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricDelta {
    pub delta: f64,
    pub trend: Trend,
}

impl MetricDelta {
    pub fn between(first: f64, last: f64) -> Self {
        let delta = last - first;
        Self {
            delta,
            trend: Trend::of(delta),
        }
    }
}

/// First and latest records with per-metric change.
#[derive(Clone, Debug, PartialEq)]
pub struct Progress {
    pub first: PerformanceRecord,
    pub last: PerformanceRecord,
    pub perlin: MetricDelta,
    pub splat: MetricDelta,
    /// Records in the ledger when the comparison was taken.
    pub total_records: usize,
}

impl Progress {
    pub fn between(
        first: PerformanceRecord,
        last: PerformanceRecord,
        total_records: usize,
    ) -> Self {
        let perlin = MetricDelta::between(first.perlin_speedup, last.perlin_speedup);
        let splat = MetricDelta::between(first.splat_speedup, last.splat_speedup);
        Self {
            first,
            last,
            perlin,
            splat,
            total_records,
        }
    }
}

/// The performance ledger over some [`LedgerStore`].
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
}

impl Ledger<FileStore> {
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::open(FileStore::new(path))
    }
}

impl<S: LedgerStore> Ledger<S> {
    pub fn open(store: S) -> Self {
        Self { store }
    }

    /// Append `record` after all existing ones; returns the new record count.
    pub fn append(&mut self, record: PerformanceRecord) -> Result<usize> {
        let mut records = self.store.load()?;
        records.push(record);
        self.store.save(&records)?;
        Ok(records.len())
    }

    pub fn list_all(&self) -> Result<Vec<PerformanceRecord>> {
        self.store.load()
    }

    /// Compare the first record with the most recent one.
    pub fn compare_extremes(&self) -> Result<Progress> {
        let mut records = self.store.load()?;
        if records.len() < 2 {
            return Err(Error::InsufficientHistory {
                count: records.len(),
            });
        }
        let total_records = records.len();
        let last = records.pop().ok_or(Error::InsufficientHistory { count: 0 })?;
        let first = records.swap_remove(0);
        Ok(Progress::between(first, last, total_records))
    }

    /// Release the ledger, handing back its store.
    pub fn close(self) -> S {
        self.store
    }
}
