// src/config/engine.rs
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::info;

use crate::clustering::ClusterParams;
use crate::weighting::ContextTable;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/clustering.toml";

pub const ENV_CONFIG_PATH: &str = "FLOW_CONFIG_PATH";
pub const ENV_SIMILARITY_THRESHOLD: &str = "FLOW_SIMILARITY_THRESHOLD";
pub const ENV_MIN_MERGE_SIMILARITY: &str = "FLOW_MIN_MERGE_SIMILARITY";

/// Everything the engine can be tuned with. All sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clustering: ClusterParams,
    pub contexts: ContextTable,
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_unit_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

impl EngineConfig {
    /// Load using `FLOW_CONFIG_PATH`, else `config/clustering.toml`, then
    /// apply env overrides.
    ///
    /// A missing file at the default path means built-in defaults; a path
    /// given explicitly through the env var must exist.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(PathBuf::from(p))?,
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from_file(&path)?
                } else {
                    info!(
                        path = %path.display(),
                        "no clustering config found, using defaults"
                    );
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read clustering config at {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid clustering config at {}", path.display()))
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(toml_str)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `FLOW_SIMILARITY_THRESHOLD` / `FLOW_MIN_MERGE_SIMILARITY`; unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(t) = parse_unit_env(env::var(ENV_SIMILARITY_THRESHOLD).ok()) {
            self.clustering.similarity_threshold = t;
        }
        if let Some(m) = parse_unit_env(env::var(ENV_MIN_MERGE_SIMILARITY).ok()) {
            self.clustering.min_merge_similarity = m;
        }
    }

    fn sanitize(&mut self) {
        self.clustering = std::mem::take(&mut self.clustering).sanitized();
    }
}
