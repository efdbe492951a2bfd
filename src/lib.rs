//! # Poolstats
//!
//! Online statistics and outlier classification for DeFi yield pools.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//! use poolstats::{PoolObservation, StatisticsPipeline};
//!
//! let pipeline = StatisticsPipeline::new();
//!
//! // First cycle: no prior aggregates yet
//! let cycle1 = vec![PoolObservation::new("p1", "demo", Some("Demo"), "Ethereum", 10.0)];
//! let out1 = pipeline.run(&cycle1, &HashMap::new()).unwrap();
//! assert_eq!(out1.pools[0].metrics.mu, 10.0);
//!
//! // Second cycle folds into the aggregates from the first
//! let cycle2 = vec![PoolObservation::new("p1", "demo", Some("Demo"), "Ethereum", 12.0)];
//! let out2 = pipeline.run(&cycle2, &out1.aggregates).unwrap();
//! assert_eq!(out2.pools[0].metrics.updated_count, 2);
//! assert!(out2.pools[0].metrics.sigma > 0.0);
//! ```
//!
//! ## Algorithm
//!
//! 1. **Normalize**: drop unlisted/deprecated projects, convert APY to a daily
//!    return `(1 + apy/100)^(1/365) - 1`
//! 2. **Merge**: fold the daily return into the pool's running aggregate (Welford)
//! 3. **Derive**: annualized volatility `sigma` and compounded mean `mu`, in percent
//! 4. **Classify**: flag pools outside `median ± 1.5·IQR` on `mu` or `sigma`
//!
//! Steps 1-3 are per pool and run in parallel for large batches; step 4 needs
//! the whole batch.

pub mod adapters;
pub mod aggregate;
pub mod config;
pub mod errors;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod normalizer;
pub mod outliers;
pub mod pipeline;
pub mod types;

// Re-export commonly used types for convenience
pub use aggregate::{RunningAggregate, merge};
pub use config::{AppConfig, LoggingConfig, PipelineConfig};
pub use errors::{Result, StatsError};
pub use metrics::derive;
pub use normalizer::{NormalizedObservation, normalize, period_return};
pub use outliers::{Classification, Metric, MetricSource, OutlierBoundary, classify, quantile};
pub use pipeline::{PipelineOutput, StatisticsPipeline};
pub use types::{AnnotatedPool, DerivedPoolMetrics, PoolObservation, PublishedPoolStats};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Install default logging (`info`, or `RUST_LOG` when set)
pub fn init() -> Result<()> {
    logging::init_logging(&LoggingConfig::default())
}
