//! Annualized mu/sigma derivation from running aggregates

use crate::aggregate::RunningAggregate;
use crate::errors::{Result, StatsError};
use crate::normalizer::PERIODS_PER_YEAR;
use crate::types::DerivedPoolMetrics;

/// Derive annualized statistics for one pool
///
/// With no prior aggregate the pool is on its first observation: `sigma` is 0
/// and `mu` falls back to the reported APY. Otherwise:
///
/// - `sigma = sqrt(M2 / (n - 1) * 365) * 100`
/// - `mu = (((1 + r) * prior_product)^(365 / n) - 1) * 100`
///
/// Returns [`StatsError::InsufficientSamples`] if a prior exists but `updated`
/// has fewer than two periods, which only happens when the caller pairs a prior
/// with an aggregate that was not merged from it.
pub fn derive(
    prior: Option<&RunningAggregate>,
    updated: &RunningAggregate,
    period_return: f64,
    apy_percent: f64,
) -> Result<DerivedPoolMetrics> {
    let Some(prior) = prior else {
        return Ok(DerivedPoolMetrics {
            period_return,
            sigma: 0.0,
            mu: apy_percent,
            updated_count: 1,
            is_outlier: false,
        });
    };

    let variance = updated
        .sample_variance()
        .ok_or(StatsError::InsufficientSamples {
            count: updated.count,
        })?;

    let sigma = (variance * PERIODS_PER_YEAR).sqrt() * 100.0;

    let compounded = (1.0 + period_return) * prior.return_product;
    let mu = (compounded.powf(PERIODS_PER_YEAR / updated.count as f64) - 1.0) * 100.0;

    Ok(DerivedPoolMetrics {
        period_return,
        sigma,
        mu,
        updated_count: updated.count,
        is_outlier: false,
    })
}
