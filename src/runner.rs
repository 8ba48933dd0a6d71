//! Candidate runner: pipes a generator into one candidate executable.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::{parse_digest, parse_timing};

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Invoke a candidate binary by path.
    ///
    /// A bare file name is taken relative to the working directory instead of
    /// being looked up on `PATH`.
    pub fn executable(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.components().count() == 1 && path.is_relative() {
            Self::new(Path::new(".").join(path))
        } else {
            Self::new(path)
        }
    }

    /// Build from an argv list; the first element is the program.
    pub fn from_argv<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv
            .next()
            .ok_or_else(|| Error::Config("empty command line".to_string()))?;
        Ok(Self {
            program: PathBuf::from(program),
            args: argv.collect(),
        })
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Which side of a comparison a run measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLabel {
    Baseline,
    Submission,
}

impl RunLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunLabel::Baseline => "baseline",
            RunLabel::Submission => "submission",
        }
    }
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one candidate invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRun {
    pub label: RunLabel,
    pub output_digest: String,
    pub elapsed_seconds: f64,
}

/// Runs one candidate against a freshly spawned generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateRunner;

impl CandidateRunner {
    pub fn new() -> Self {
        Self
    }

    /// Pipe `generator`'s stdout into `executable` and read back its digest and timing.
    ///
    /// Failure checks run in a fixed order: generator exit status, then the
    /// timing line, then the candidate's own exit status.
    pub fn run(
        &self,
        label: RunLabel,
        executable: &Invocation,
        generator: &Invocation,
    ) -> Result<BenchmarkRun> {
        debug!(%generator, "spawning generator");
        let mut gen = generator
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| generator.spawn_error(e))?;

        let Some(instance) = gen.stdout.take() else {
            reap(&mut gen);
            return Err(Error::Io(std::io::Error::other(
                "generator stdout was not captured",
            )));
        };

        debug!(%executable, %label, "spawning candidate");
        let output = executable
            .command()
            .stdin(Stdio::from(instance))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                reap(&mut gen);
                return Err(executable.spawn_error(e));
            }
        };

        let gen_status = gen.wait()?;
        if !gen_status.success() {
            return Err(Error::GeneratorFailure {
                code: gen_status.code(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let elapsed_seconds =
            parse_timing(&stderr).map_err(|reason| Error::TimingParseFailure {
                label: label.to_string(),
                reason,
            })?;

        if !output.status.success() {
            return Err(Error::CandidateFailure {
                label: label.to_string(),
                code: output.status.code(),
            });
        }

        let output_digest = parse_digest(&String::from_utf8_lossy(&output.stdout));
        info!(%label, digest = %output_digest, elapsed_seconds, "run complete");

        Ok(BenchmarkRun {
            label,
            output_digest,
            elapsed_seconds,
        })
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
