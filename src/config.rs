//! Benchmark configuration.
//!
//! Loaded from an optional JSON file; every top-level field has a default that
//! matches the problem repository layout, so an empty `{}` is a valid config.
//! Command templates substitute `{size}` and `{seed}` in each argument.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::DEFAULT_LEDGER_PATH;
use crate::runner::Invocation;
use crate::Family;

pub const DEFAULT_SIZE: &str = "S";
pub const DEFAULT_SEED: u64 = 42;

/// Generator and candidates for one problem family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyConfig {
    /// Generator argv template.
    pub generator: Vec<String>,
    pub baseline: PathBuf,
    pub submission: PathBuf,
}

impl FamilyConfig {
    fn conventional(dir: &str, stem: &str) -> Self {
        Self {
            generator: vec![
                "python3".into(),
                format!("{dir}/gen_{stem}.py"),
                "--size".into(),
                "{size}".into(),
                "--seed".into(),
                "{seed}".into(),
            ],
            baseline: PathBuf::from(format!("{dir}/baseline_{stem}")),
            submission: PathBuf::from(format!("{dir}/submit_{stem}")),
        }
    }

    pub fn generator(&self, size: &str, seed: u64) -> Result<Invocation> {
        Invocation::from_argv(expand(&self.generator, size, seed))
            .map_err(|_| Error::Config("generator command is empty".to_string()))
    }

    pub fn baseline(&self) -> Invocation {
        Invocation::executable(&self.baseline)
    }

    pub fn submission(&self) -> Invocation {
        Invocation::executable(&self.submission)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub ledger: PathBuf,
    pub size: String,
    pub seed: u64,
    pub perlin: FamilyConfig,
    pub splat: FamilyConfig,
    /// Command whose output carries one `Speedup:` line per family.
    pub aggregate_command: Vec<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from(DEFAULT_LEDGER_PATH),
            size: DEFAULT_SIZE.to_string(),
            seed: DEFAULT_SEED,
            perlin: FamilyConfig::conventional("perlin", "perlin"),
            splat: FamilyConfig::conventional("splat", "splat"),
            aggregate_command: vec!["make".into(), "benchmark".into(), "SIZE={size}".into()],
        }
    }
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn family(&self, family: Family) -> &FamilyConfig {
        match family {
            Family::Perlin => &self.perlin,
            Family::Splat => &self.splat,
        }
    }

    pub fn family_mut(&mut self, family: Family) -> &mut FamilyConfig {
        match family {
            Family::Perlin => &mut self.perlin,
            Family::Splat => &mut self.splat,
        }
    }

    pub fn aggregate(&self, size: &str, seed: u64) -> Result<Invocation> {
        Invocation::from_argv(expand(&self.aggregate_command, size, seed))
            .map_err(|_| Error::Config("aggregate_command is empty".to_string()))
    }
}

fn expand(template: &[String], size: &str, seed: u64) -> Vec<String> {
    let seed = seed.to_string();
    template
        .iter()
        .map(|arg| arg.replace("{size}", size).replace("{seed}", &seed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_follow_repository_layout() {
        let cfg = BenchConfig::default();
        assert_eq!(cfg.ledger, PathBuf::from(".performance_log.json"));

        let gen = cfg.family(Family::Perlin).generator("M", 7).unwrap();
        assert_eq!(gen.to_string(), "python3 perlin/gen_perlin.py --size M --seed 7");
        assert_eq!(
            cfg.family(Family::Splat).submission().program,
            PathBuf::from("splat/submit_splat")
        );
        assert_eq!(cfg.aggregate("L", 42).unwrap().to_string(), "make benchmark SIZE=L");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(
            &path,
            r#"{"seed": 9, "splat": {"generator": ["./gen", "{size}-{seed}"], "baseline": "b", "submission": "s"}}"#,
        )
        .unwrap();

        let cfg = BenchConfig::load(&path).unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.size, "S");
        assert_eq!(cfg.perlin, BenchConfig::default().perlin);
        assert_eq!(
            cfg.splat.generator("S", 9).unwrap().to_string(),
            "./gen S-9"
        );
        assert_eq!(cfg.splat.baseline().program, PathBuf::from("./b"));
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, r#"{"sede": 1}"#).unwrap();
        assert!(matches!(BenchConfig::load(&path), Err(Error::Config(_))));

        let mut cfg = BenchConfig::default();
        cfg.perlin.generator.clear();
        assert!(matches!(cfg.family(Family::Perlin).generator("S", 1), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        assert!(BenchConfig::load_or_default(Some(dir.path().join("nope.json").as_path())).is_err());
        assert_eq!(BenchConfig::load_or_default(None).unwrap(), BenchConfig::default());
    }
}
