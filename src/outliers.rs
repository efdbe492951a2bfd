//! Batch-level outlier classification
//!
//! Boundaries are computed per metric over the whole batch, so this stage is a
//! barrier: every pool's metrics must be derived before any pool is flagged.
//!
//! The fence is centered on the median, `median ± 1.5·IQR`, not on the quartiles
//! as in Tukey's rule. Flagged pools feed the "No Outliers" yield filter, so the
//! fence must stay median-centered for results to match.

use crate::types::{AnnotatedPool, DerivedPoolMetrics, PublishedPoolStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// IQR multiplier for the outlier fence
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Metric an outlier boundary applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Mu,
    Sigma,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Mu, Metric::Sigma];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Mu => write!(f, "mu"),
            Metric::Sigma => write!(f, "sigma"),
        }
    }
}

/// Anything carrying mu/sigma that can be flagged as an outlier
pub trait MetricSource {
    /// Value of `metric`, or `None` when the record has no value for it
    fn metric(&self, metric: Metric) -> Option<f64>;

    fn outlier(&self) -> bool;

    fn set_outlier(&mut self, outlier: bool);
}

impl MetricSource for DerivedPoolMetrics {
    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Mu => Some(self.mu),
            Metric::Sigma => Some(self.sigma),
        }
    }

    fn outlier(&self) -> bool {
        self.is_outlier
    }

    fn set_outlier(&mut self, outlier: bool) {
        self.is_outlier = outlier;
    }
}

impl MetricSource for AnnotatedPool {
    fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.metric(metric)
    }

    fn outlier(&self) -> bool {
        self.metrics.is_outlier
    }

    fn set_outlier(&mut self, outlier: bool) {
        self.metrics.set_outlier(outlier);
    }
}

impl MetricSource for PublishedPoolStats {
    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Mu => self.mu,
            Metric::Sigma => self.sigma,
        }
    }

    fn outlier(&self) -> bool {
        self.outlier
    }

    fn set_outlier(&mut self, outlier: bool) {
        self.outlier = outlier;
    }
}

/// Outlier fence for one metric over one batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierBoundary {
    pub metric: Metric,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub iqr: f64,
    pub sample_size: usize,
}

impl OutlierBoundary {
    /// Compute the fence from unsorted values; `None` for an empty set
    ///
    /// NaN values are not filtered. `total_cmp` sorts them after every number,
    /// so each NaN still counts toward `sample_size` and pushes the quartile
    /// positions upward, moving the fence for every other pool in the batch.
    /// If a NaN lands next to a quartile position that quartile is NaN too,
    /// and then no value compares outside the fence.
    pub fn from_values(metric: Metric, values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;

        Some(Self {
            metric,
            lower_bound: median - IQR_MULTIPLIER * iqr,
            upper_bound: median + IQR_MULTIPLIER * iqr,
            q1,
            median,
            q3,
            iqr,
            sample_size: sorted.len(),
        })
    }

    /// Whether `value` lies outside `[lower_bound, upper_bound]`
    ///
    /// NaN is never outside: both comparisons are false.
    pub fn is_outside(&self, value: f64) -> bool {
        value < self.lower_bound || value > self.upper_bound
    }
}

/// Linear-interpolation quantile of an ascending slice
///
/// Position `p * (n - 1)`, interpolating between neighbours (R-7, the default of
/// NumPy and d3). Returns `None` for an empty slice or `p` outside `[0, 1]`.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let lower = sorted[lo];

    if lo == hi {
        return Some(lower);
    }

    Some(lower + (sorted[hi] - lower) * (pos - lo as f64))
}

/// Result of classifying one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification<P> {
    pub boundaries: Vec<OutlierBoundary>,
    pub pools: Vec<P>,
}

impl<P: MetricSource> Classification<P> {
    pub fn boundary(&self, metric: Metric) -> Option<&OutlierBoundary> {
        self.boundaries.iter().find(|b| b.metric == metric)
    }

    pub fn outlier_count(&self) -> usize {
        self.pools.iter().filter(|p| p.outlier()).count()
    }
}

/// Compute per-metric boundaries for a batch without flagging anything
pub fn compute_boundaries<P: MetricSource>(pools: &[P]) -> Vec<OutlierBoundary> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let values: Vec<f64> = pools.iter().filter_map(|p| p.metric(metric)).collect();
            OutlierBoundary::from_values(metric, &values)
        })
        .collect()
}

/// Classify every pool of a batch against median-centered IQR fences
///
/// A pool is an outlier if any of its present metrics falls outside that
/// metric's fence. An empty batch yields no boundaries and flags nothing.
pub fn classify<P: MetricSource>(mut pools: Vec<P>) -> Classification<P> {
    let boundaries = compute_boundaries(&pools);

    let mut flagged = 0usize;
    for pool in pools.iter_mut() {
        let outlier = boundaries
            .iter()
            .any(|b| pool.metric(b.metric).is_some_and(|v| b.is_outside(v)));
        pool.set_outlier(outlier);
        flagged += outlier as usize;
    }

    for b in &boundaries {
        debug!(
            metric = %b.metric,
            lower = b.lower_bound,
            upper = b.upper_bound,
            n = b.sample_size,
            "outlier boundary"
        );
    }
    debug!(pools = pools.len(), flagged, "classified batch");

    Classification { boundaries, pools }
}

/// Classify backend-published statistics rows
pub fn classify_published(rows: Vec<PublishedPoolStats>) -> Classification<PublishedPoolStats> {
    classify(rows)
}
