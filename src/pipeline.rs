//! Batch pipeline: normalize -> merge -> derive -> classify
//!
//! The first three stages are independent per pool and fan out over rayon for
//! large batches. Classification needs the whole batch and runs once after the
//! gather.

use crate::aggregate::{RunningAggregate, merge};
use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::metrics::derive;
use crate::normalizer::{NormalizedObservation, normalize};
use crate::outliers::{OutlierBoundary, classify};
use crate::types::{AnnotatedPool, PoolObservation};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything one refresh cycle produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    /// Eligible pools with metrics and outlier flags, in input order
    pub pools: Vec<AnnotatedPool>,
    /// Next cycle's priors: every incoming prior, with successors replacing
    /// the entries of pools processed in this batch
    pub aggregates: HashMap<String, RunningAggregate>,
    /// Per-metric fences used for this batch
    pub boundaries: Vec<OutlierBoundary>,
}

impl PipelineOutput {
    pub fn outliers(&self) -> impl Iterator<Item = &AnnotatedPool> {
        self.pools.iter().filter(|p| p.is_outlier())
    }

    pub fn outlier_count(&self) -> usize {
        self.outliers().count()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Merge and derive for a single eligible pool
pub fn process_pool(
    normalized: NormalizedObservation,
    priors: &HashMap<String, RunningAggregate>,
) -> Result<(AnnotatedPool, RunningAggregate)> {
    let NormalizedObservation {
        observation,
        period_return,
    } = normalized;

    let prior = priors.get(&observation.pool_id);
    let updated = merge(prior, period_return);
    let metrics = derive(prior, &updated, period_return, observation.apy_percent)?;

    Ok((
        AnnotatedPool {
            observation,
            metrics,
        },
        updated,
    ))
}

/// Stateless statistics pipeline
///
/// Holds only execution settings; all pool state comes in through `run`.
pub struct StatisticsPipeline {
    config: PipelineConfig,
    thread_pool: Option<rayon::ThreadPool>,
}

impl Default for StatisticsPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsPipeline {
    /// Pipeline with default settings on the global rayon pool
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            thread_pool: None,
        }
    }

    /// Pipeline with explicit settings; builds a dedicated pool if `worker_threads` is set
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        let thread_pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("poolstats-{i}"))
                    .build()?,
            ),
            None => None,
        };

        Ok(Self {
            config,
            thread_pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one refresh cycle over a batch of observations
    pub fn run(
        &self,
        observations: &[PoolObservation],
        priors: &HashMap<String, RunningAggregate>,
    ) -> Result<PipelineOutput> {
        let start = Instant::now();
        let normalized = normalize(observations);
        let parallel = self.config.runs_parallel(normalized.len());

        debug!(
            pools = normalized.len(),
            priors = priors.len(),
            parallel,
            "merging and deriving"
        );

        let processed: Vec<(AnnotatedPool, RunningAggregate)> = if parallel {
            let work = || {
                normalized
                    .into_par_iter()
                    .map(|n| process_pool(n, priors))
                    .collect::<Result<Vec<_>>>()
            };
            match &self.thread_pool {
                Some(pool) => pool.install(work)?,
                None => work()?,
            }
        } else {
            normalized
                .into_iter()
                .map(|n| process_pool(n, priors))
                .collect::<Result<Vec<_>>>()?
        };

        // Pools absent or ineligible this cycle keep their prior untouched
        let mut aggregates = priors.clone();
        let mut seen = HashSet::with_capacity(processed.len());
        let mut pools = Vec::with_capacity(processed.len());
        for (pool, aggregate) in processed {
            if !seen.insert(pool.observation.pool_id.clone()) {
                warn!(pool = %pool.observation.pool_id, "duplicate pool id in batch, last one wins");
            }
            aggregates.insert(pool.observation.pool_id.clone(), aggregate);
            pools.push(pool);
        }

        let classification = classify(pools);

        info!(
            observations = observations.len(),
            pools = classification.pools.len(),
            outliers = classification.outlier_count(),
            new_pools = classification
                .pools
                .iter()
                .filter(|p| !priors.contains_key(p.pool_id()))
                .count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pool statistics computed"
        );

        Ok(PipelineOutput {
            pools: classification.pools,
            aggregates,
            boundaries: classification.boundaries,
        })
    }
}
