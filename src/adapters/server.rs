//! Server-side page-data loader

use crate::aggregate::RunningAggregate;
use crate::errors::Result;
use crate::outliers::OutlierBoundary;
use crate::pipeline::StatisticsPipeline;
use crate::types::{AnnotatedPool, PoolObservation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Props handed to the yields page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub pools: Vec<AnnotatedPool>,
    pub boundaries: Vec<OutlierBoundary>,
    pub pool_count: usize,
    pub outlier_count: usize,
    pub generated_at: DateTime<Utc>,
    /// Next cycle's priors; persisted by the caller, not shipped to the page
    #[serde(skip)]
    pub aggregates: HashMap<String, RunningAggregate>,
}

/// Run the pipeline and package the result as page props
pub fn load_page_data(
    pipeline: &StatisticsPipeline,
    observations: &[PoolObservation],
    priors: &HashMap<String, RunningAggregate>,
) -> Result<PageData> {
    let output = pipeline.run(observations, priors)?;
    let outlier_count = output.outlier_count();

    Ok(PageData {
        pool_count: output.pools.len(),
        outlier_count,
        pools: output.pools,
        boundaries: output.boundaries,
        generated_at: Utc::now(),
        aggregates: output.aggregates,
    })
}
