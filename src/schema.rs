use serde::Serialize;

use crate::compare::ComparisonResult;
use crate::Family;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub tool_version: String,
    pub size: String,
    pub seed: u64,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

impl RunMeta {
    pub fn now(size: &str, seed: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            size: size.to_string(),
            seed,
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
            git_sha: git_sha_short(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyComparison {
    pub family: Family,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub run: RunMeta,
    pub comparisons: Vec<FamilyComparison>,
}

fn git_sha_short() -> Option<String> {
    // Best-effort: read from environment set by CI/build scripts.
    std::env::var("GIT_SHA")
        .ok()
        .or_else(|| std::env::var("GITHUB_SHA").ok())
        .map(|s| s.chars().take(12).collect())
}

/// Speedups may be `+inf`, which JSON cannot represent: write it as `null`
/// and read `null` back as `+inf`.
pub mod speedup_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
