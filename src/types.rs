//! Pool observation and derived metric types

use serde::{Deserialize, Serialize};

/// Raw yield observation for one pool in one refresh cycle
///
/// Field names on the wire follow the upstream yields API (`pool`, `project`,
/// `projectName`, `apy`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolObservation {
    /// Stable identifier, unique per yield-bearing position
    #[serde(rename = "pool")]
    pub pool_id: String,

    #[serde(rename = "project")]
    pub project_slug: String,

    /// Display name; `None` when the project is not listed
    #[serde(rename = "projectName", default)]
    pub project_name: Option<String>,

    pub chain: String,

    /// Annualized percentage yield as reported upstream
    #[serde(rename = "apy")]
    pub apy_percent: f64,
}

impl PoolObservation {
    pub fn new(
        pool_id: impl Into<String>,
        project_slug: impl Into<String>,
        project_name: Option<&str>,
        chain: impl Into<String>,
        apy_percent: f64,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            project_slug: project_slug.into(),
            project_name: project_name.map(str::to_string),
            chain: chain.into(),
            apy_percent,
        }
    }
}

/// Statistics derived for a pool in the current cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedPoolMetrics {
    /// Daily-equivalent return implied by the reported APY
    pub period_return: f64,
    /// Annualized volatility, percent
    pub sigma: f64,
    /// Annualized compounded mean return, percent
    pub mu: f64,
    #[serde(rename = "count")]
    pub updated_count: u64,
    #[serde(rename = "outlier")]
    pub is_outlier: bool,
}

/// Eligible observation annotated with its derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPool {
    #[serde(flatten)]
    pub observation: PoolObservation,
    #[serde(flatten)]
    pub metrics: DerivedPoolMetrics,
}

impl AnnotatedPool {
    pub fn pool_id(&self) -> &str {
        &self.observation.pool_id
    }

    pub fn is_outlier(&self) -> bool {
        self.metrics.is_outlier
    }
}

/// Pre-aggregated statistics row published by the yields backend
///
/// Unlike locally derived metrics, `mu` and `sigma` may be missing for pools the
/// backend has not scored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedPoolStats {
    #[serde(rename = "pool")]
    pub pool_id: String,
    #[serde(default)]
    pub mu: Option<f64>,
    #[serde(default)]
    pub sigma: Option<f64>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub outlier: bool,
}
