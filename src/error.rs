//! Error types for benchmark sessions and the performance ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for bomb-bench operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a candidate's stderr did not yield an elapsed time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimingError {
    /// No line starting with `time_sec=` was found
    #[error("no `time_sec=` line on stderr")]
    Missing,

    /// The first `time_sec=` line did not carry a usable duration
    #[error("invalid timing value {0:?}")]
    Invalid(String),
}

/// Errors that can occur while running or recording benchmarks
#[derive(Error, Debug)]
pub enum Error {
    /// The instance generator exited unsuccessfully
    #[error("generator exited with {}", describe_code(.code))]
    GeneratorFailure {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// The candidate's stderr carried no usable timing line
    #[error("unable to parse timing for {label}: {reason}")]
    TimingParseFailure {
        /// Which side was being measured
        label: String,
        /// What was wrong with stderr
        reason: TimingError,
    },

    /// The candidate reported a timing but exited unsuccessfully
    #[error("{label} exited with {}", describe_code(.code))]
    CandidateFailure {
        /// Which side was being measured
        label: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// Aggregate benchmark output did not contain both speedup lines
    #[error("expected 2 `Speedup:` lines in benchmark output, found {found}")]
    MetricExtractionFailure {
        /// Number of usable lines seen
        found: usize,
    },

    /// A `Speedup:` line whose value could not be read
    #[error("unreadable speedup in benchmark output: {line:?}")]
    InvalidMetric {
        /// The offending line, trimmed
        line: String,
    },

    /// Not enough ledger records to compare first and latest
    #[error("need at least 2 records to compare, ledger has {count}")]
    InsufficientHistory {
        /// Records currently in the ledger
        count: usize,
    },

    /// The persisted ledger could not be parsed
    #[error("ledger {} is corrupt: {source}", .path.display())]
    LedgerCorrupt {
        /// Ledger file
        path: PathBuf,
        /// Parser failure
        source: serde_json::Error,
    },

    /// Two runs of the same generator command produced different instances
    #[error("generator is not deterministic: instance sha256 {first} != {second}")]
    NondeterministicInstance {
        /// Digest of the first instance
        first: String,
        /// Digest of the second instance
        second: String,
    },

    /// A subprocess could not be started
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code to terminate with for this failure.
    ///
    /// Subprocess failures pass through the subprocess's own code when it is
    /// known; everything else maps to `1`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        let code = match self {
            Error::GeneratorFailure { code } | Error::CandidateFailure { code, .. } => *code,
            _ => None,
        };
        match code {
            Some(c) if (1..=255).contains(&c) => c as u8,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_passes_through_subprocess_code() {
        assert_eq!(Error::GeneratorFailure { code: Some(3) }.exit_code(), 3);
        let err = Error::CandidateFailure {
            label: "submission".into(),
            code: Some(139),
        };
        assert_eq!(err.exit_code(), 139);
    }

    #[test]
    fn test_exit_code_falls_back_to_one() {
        assert_eq!(Error::GeneratorFailure { code: None }.exit_code(), 1);
        assert_eq!(Error::GeneratorFailure { code: Some(0) }.exit_code(), 1);
        assert_eq!(Error::GeneratorFailure { code: Some(300) }.exit_code(), 1);
        assert_eq!(Error::InsufficientHistory { count: 1 }.exit_code(), 1);
    }

    #[test]
    fn test_messages() {
        let err = Error::GeneratorFailure { code: Some(1) };
        assert_eq!(err.to_string(), "generator exited with code 1");

        let err = Error::TimingParseFailure {
            label: "baseline".into(),
            reason: TimingError::Missing,
        };
        assert_eq!(
            err.to_string(),
            "unable to parse timing for baseline: no `time_sec=` line on stderr"
        );
    }
}
