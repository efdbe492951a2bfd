//! Direct call with default pipeline settings

use crate::aggregate::RunningAggregate;
use crate::errors::Result;
use crate::pipeline::{PipelineOutput, StatisticsPipeline};
use crate::types::PoolObservation;
use std::collections::HashMap;

/// Annotate a batch of observations against prior aggregates
pub fn annotate_pools(
    observations: &[PoolObservation],
    priors: &HashMap<String, RunningAggregate>,
) -> Result<PipelineOutput> {
    StatisticsPipeline::new().run(observations, priors)
}
