//! Text protocols spoken by candidates and by the aggregate benchmark command.
//!
//! Candidates report their elapsed time on stderr as a `time_sec=<float>` line
//! and their correctness digest on stdout. The aggregate command (historically
//! `make benchmark`) prints one `Speedup: <n>x` line per family, perlin first.
//!
//! Everything here is pure text processing so it can be tested without
//! spawning processes.

use crate::error::{Error, Result, TimingError};

/// Prefix of the timing line a candidate writes to stderr.
pub const TIMING_PREFIX: &str = "time_sec=";

/// Marker scanned for in aggregate benchmark output.
pub const SPEEDUP_MARKER: &str = "Speedup:";

/// Unit suffix that terminates the number after [`SPEEDUP_MARKER`].
pub const SPEEDUP_UNIT: char = 'x';

/// Extract the elapsed seconds from a candidate's stderr.
///
/// Only the first line starting with [`TIMING_PREFIX`] is considered. A
/// missing line is an error, never zero: a fabricated zero would turn into an
/// infinite speedup downstream.
pub fn parse_timing(stderr: &str) -> std::result::Result<f64, TimingError> {
    let raw = stderr
        .lines()
        .find_map(|line| line.strip_prefix(TIMING_PREFIX))
        .ok_or(TimingError::Missing)?;

    let value = raw.trim();
    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(TimingError::Invalid(value.to_string())),
    }
}

/// The correctness digest a candidate printed on stdout.
pub fn parse_digest(stdout: &str) -> String {
    stdout.trim().to_string()
}

/// Speedup figures recovered from aggregate benchmark output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrapedSpeedups {
    pub perlin: f64,
    pub splat: f64,
}

/// Pull the perlin and splat speedups out of aggregate benchmark output.
///
/// The first line containing `Speedup:` is perlin, the second splat; anything
/// after the second is ignored. Either of the two carrying an unreadable
/// number fails the whole scrape rather than shifting later lines up.
pub fn scrape_speedups(output: &str) -> Result<ScrapedSpeedups> {
    let mut found = output.lines().filter(|line| line.contains(SPEEDUP_MARKER));

    let perlin = found
        .next()
        .ok_or(Error::MetricExtractionFailure { found: 0 })?;
    let splat = found
        .next()
        .ok_or(Error::MetricExtractionFailure { found: 1 })?;

    Ok(ScrapedSpeedups {
        perlin: speedup_in_line(perlin)?,
        splat: speedup_in_line(splat)?,
    })
}

fn speedup_in_line(line: &str) -> Result<f64> {
    let rest = line
        .split_once(SPEEDUP_MARKER)
        .map_or("", |(_, rest)| rest);
    let number = rest.split(SPEEDUP_UNIT).next().unwrap_or("").trim();
    number.parse().map_err(|_| Error::InvalidMetric {
        line: line.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timing_first_match_wins() {
        let stderr = "warming up\ntime_sec=1.0\ntime_sec=9.0\n";
        assert_eq!(parse_timing(stderr), Ok(1.0));
    }

    #[test]
    fn test_parse_timing_tolerates_whitespace_and_crlf() {
        assert_eq!(parse_timing("time_sec= 0.25 \r\n"), Ok(0.25));
    }

    #[test]
    fn test_parse_timing_missing_is_not_zero() {
        assert_eq!(parse_timing(""), Err(TimingError::Missing));
        assert_eq!(
            parse_timing("elapsed: 1.0\n  time_sec=2.0\n"),
            Err(TimingError::Missing)
        );
    }

    #[test]
    fn test_parse_timing_rejects_garbage() {
        assert_eq!(
            parse_timing("time_sec=fast\n"),
            Err(TimingError::Invalid("fast".into()))
        );
        assert_eq!(
            parse_timing("time_sec=-1.5\n"),
            Err(TimingError::Invalid("-1.5".into()))
        );
        assert!(matches!(
            parse_timing("time_sec=inf\n"),
            Err(TimingError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_digest_trims() {
        assert_eq!(parse_digest("  abc\n"), "abc");
        assert_eq!(parse_digest(""), "");
    }

    #[test]
    fn test_scrape_two_lines() {
        let out = "perlin...\n  Speedup: 2.50x  [Excellent]\nsplat...\n  Speedup: 1.20x  [Pass]\n";
        let s = scrape_speedups(out).unwrap();
        assert_eq!(s.perlin, 2.50);
        assert_eq!(s.splat, 1.20);
    }

    #[test]
    fn test_scrape_ignores_ansi_and_extra_lines() {
        let out = "\x1b[1;32mSpeedup: 3.00x\x1b[0m\n\x1b[31mSpeedup: 0.80x\x1b[0m\nSpeedup: 9.99x\n";
        let s = scrape_speedups(out).unwrap();
        assert_eq!(s.perlin, 3.0);
        assert_eq!(s.splat, 0.8);
    }

    #[test]
    fn test_scrape_unreadable_value_does_not_shift_families() {
        let out = "Speedup: N/Ax  [perlin crashed]\nSpeedup: 1.20x\nSpeedup: 3.00x\n";
        match scrape_speedups(out) {
            Err(Error::InvalidMetric { line }) => {
                assert_eq!(line, "Speedup: N/Ax  [perlin crashed]");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let out = "Speedup: 2.00x\nSpeedup: ??x\nSpeedup: 3.00x\n";
        assert!(matches!(
            scrape_speedups(out),
            Err(Error::InvalidMetric { .. })
        ));
    }

    #[test]
    fn test_scrape_too_few_lines() {
        assert!(matches!(
            scrape_speedups("nothing here\n"),
            Err(Error::MetricExtractionFailure { found: 0 })
        ));
        assert!(matches!(
            scrape_speedups("Speedup: 1.10x\n"),
            Err(Error::MetricExtractionFailure { found: 1 })
        ));
    }
}
