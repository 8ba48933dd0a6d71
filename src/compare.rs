//! Baseline-vs-submission comparison.

use std::process::Stdio;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::runner::{BenchmarkRun, CandidateRunner, Invocation, RunLabel};
use crate::schema::speedup_serde;

/// Qualitative bucket for a speedup value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Excellent,
    Good,
    Pass,
    NeedsWork,
}

impl Tier {
    /// Thresholds are checked top-down, first match wins.
    pub fn classify(speedup: f64) -> Self {
        if speedup >= 2.0 {
            Tier::Excellent
        } else if speedup >= 1.5 {
            Tier::Good
        } else if speedup >= 1.0 {
            Tier::Pass
        } else {
            Tier::NeedsWork
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Excellent => "excellent",
            Tier::Good => "good",
            Tier::Pass => "pass",
            Tier::NeedsWork => "needs_work",
        }
    }

    /// Human-facing rating, e.g. `✓ Good`.
    pub fn rating(&self) -> &'static str {
        match self {
            Tier::Excellent => "🌟 Excellent",
            Tier::Good => "✓ Good",
            Tier::Pass => "○ Pass",
            Tier::NeedsWork => "✗ Needs work",
        }
    }
}

/// `baseline / submission`, or `+inf` when the submission took zero time.
pub fn speedup(baseline_seconds: f64, submission_seconds: f64) -> f64 {
    if submission_seconds == 0.0 {
        f64::INFINITY
    } else {
        baseline_seconds / submission_seconds
    }
}

/// Both measurements of one session plus the derived figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub baseline: BenchmarkRun,
    pub submission: BenchmarkRun,
    #[serde(with = "speedup_serde")]
    pub speedup: f64,
    pub tier: Tier,
}

impl ComparisonResult {
    pub fn new(baseline: BenchmarkRun, submission: BenchmarkRun) -> Self {
        let speedup = speedup(baseline.elapsed_seconds, submission.elapsed_seconds);
        Self {
            baseline,
            submission,
            speedup,
            tier: Tier::classify(speedup),
        }
    }
}

/// SHA-256 of one generated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceFingerprint {
    pub sha256: String,
    pub len: usize,
}

/// Run the generator to completion and hash what it printed.
pub fn fingerprint_instance(generator: &Invocation) -> Result<InstanceFingerprint> {
    let output = generator
        .command()
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| Error::Spawn {
            program: generator.program.display().to_string(),
            source,
        })?;
    if !output.status.success() {
        return Err(Error::GeneratorFailure {
            code: output.status.code(),
        });
    }

    let digest: [u8; 32] = Sha256::digest(&output.stdout).into();
    Ok(InstanceFingerprint {
        sha256: hex32(digest),
        len: output.stdout.len(),
    })
}

fn hex32(d: [u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in d {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// Runs baseline then submission, each against its own generator process.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    runner: CandidateRunner,
    verify_instance: bool,
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Before measuring, run the generator twice and require identical output.
    pub fn verify_instance(mut self, enabled: bool) -> Self {
        self.verify_instance = enabled;
        self
    }

    pub fn compare(
        &self,
        generator: &Invocation,
        baseline: &Invocation,
        submission: &Invocation,
    ) -> Result<ComparisonResult> {
        if self.verify_instance {
            let first = fingerprint_instance(generator)?;
            let second = fingerprint_instance(generator)?;
            if first != second {
                return Err(Error::NondeterministicInstance {
                    first: first.sha256,
                    second: second.sha256,
                });
            }
            debug!(sha256 = %first.sha256, bytes = first.len, "instance is reproducible");
        }

        let base = self.runner.run(RunLabel::Baseline, baseline, generator)?;
        let sub = self.runner.run(RunLabel::Submission, submission, generator)?;

        let result = ComparisonResult::new(base, sub);
        info!(speedup = result.speedup, tier = result.tier.as_str(), "comparison complete");
        Ok(result)
    }
}
