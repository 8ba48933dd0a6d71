//! Baseline-vs-submission benchmarking for the Perlin terrain and event-splat
//! optimization problems.
//!
//! A comparison pipes one generated problem instance into the baseline and
//! then, from a fresh generator process, into the submission. Each candidate
//! prints a digest on stdout and `time_sec=<float>` on stderr. Session
//! speedups are kept in an append-only JSON ledger.

use clap::ValueEnum;
use serde::Serialize;

pub mod compare;
pub mod config;
pub mod error;
pub mod ledger;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod schema;
pub mod session;

pub use error::{Error, Result};

/// Problem family to benchmark.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Perlin-noise terrain generation.
    Perlin,
    /// Bomb/bullet event splatting.
    Splat,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Perlin => "perlin",
            Family::Splat => "splat",
        }
    }
}
