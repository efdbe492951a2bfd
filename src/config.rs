//! Layered configuration: defaults, optional TOML file, `POOLSTATS__*` environment
//!
//! Only execution knobs are configurable. The statistical constants (365
//! compounding periods, the 1.5 IQR multiplier, the deprecated-project list)
//! are fixed.

use crate::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `POOLSTATS__PIPELINE__PARALLEL=false`
pub const ENV_PREFIX: &str = "POOLSTATS";

/// Pipeline execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fan per-pool stages out across rayon workers
    pub parallel: bool,
    /// Minimum batch size before going parallel
    pub parallel_threshold: usize,
    /// Dedicated worker count; `None` uses the global rayon pool
    pub worker_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 1024,
            worker_threads: None,
        }
    }
}

impl PipelineConfig {
    /// Sequential execution regardless of batch size
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Whether a batch of `len` pools should run in parallel
    pub fn runs_parallel(&self, len: usize) -> bool {
        self.parallel && len >= self.parallel_threshold
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
