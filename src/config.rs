//! Startup configuration for the predictor

use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

use crate::model::{TreeConfig, DEFAULT_SEED};

/// Bundled dataset, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "data/tire_strategy_data.csv";

pub const ENV_DATA_PATH: &str = "TIRE_DATA_PATH";
pub const ENV_SEED: &str = "TIRE_MODEL_SEED";
pub const ENV_MAX_DEPTH: &str = "TIRE_MAX_DEPTH";

/// Everything needed to build a model at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorConfig {
    pub data_path: PathBuf,
    pub seed: u64,
    pub tree: TreeConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            seed: DEFAULT_SEED,
            tree: TreeConfig::default(),
        }
    }
}

impl PredictorConfig {
    pub fn new<P: Into<PathBuf>>(data_path: P) -> Self {
        Self {
            data_path: data_path.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `TIRE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DATA_PATH).filter(|p| !p.trim().is_empty()) {
            config.data_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_SEED) {
            match raw.trim().parse() {
                Ok(seed) => config.seed = seed,
                Err(_) => warn!("Ignoring invalid {}={:?}", ENV_SEED, raw),
            }
        }

        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.tree.max_depth = None,
                Ok(depth) => config.tree.max_depth = Some(depth),
                Err(_) => warn!("Ignoring invalid {}={:?}", ENV_MAX_DEPTH, raw),
            }
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
