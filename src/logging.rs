//! tracing-subscriber setup

use crate::config::LoggingConfig;
use crate::errors::{Result, StatsError};
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    };

    installed.map_err(|e| StatsError::Logging {
        message: e.to_string(),
    })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.level).map_err(|e| StatsError::Logging {
        message: format!("invalid log level {:?}: {}", config.level, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_directive() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let cfg = LoggingConfig {
            level: "poolstats=loud".to_string(),
            json: false,
        };
        assert!(build_filter(&cfg).is_err());
    }

    #[test]
    fn test_accepts_module_directive() {
        let cfg = LoggingConfig {
            level: "poolstats=debug,warn".to_string(),
            json: false,
        };
        assert!(build_filter(&cfg).is_ok());
    }
}
