//! Eligibility filtering and APY to daily-return conversion

use crate::types::PoolObservation;
use serde::Serialize;
use tracing::{debug, trace};

/// Compounding periods per year. Daily compounding over a 365-day year.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Projects that are permanently excluded from statistics.
///
/// `anchor` is the defunct UST savings protocol; its pools still appear upstream
/// with frozen APYs.
pub const DEPRECATED_PROJECTS: &[&str] = &["anchor"];

/// Observation that passed eligibility, with its daily-equivalent return
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedObservation {
    pub observation: PoolObservation,
    pub period_return: f64,
}

/// Daily return implied by an annualized percentage yield
///
/// `(1 + apy/100)^(1/365) - 1`
#[inline]
pub fn period_return(apy_percent: f64) -> f64 {
    (1.0 + apy_percent / 100.0).powf(1.0 / PERIODS_PER_YEAR) - 1.0
}

/// Whether a project slug is on the permanent exclusion list
pub fn is_deprecated(project_slug: &str) -> bool {
    DEPRECATED_PROJECTS.contains(&project_slug)
}

/// Whether an observation may enter the statistics pipeline
pub fn is_eligible(observation: &PoolObservation) -> bool {
    observation.project_name.is_some() && !is_deprecated(&observation.project_slug)
}

/// Drop ineligible observations and attach daily returns, preserving input order
pub fn normalize(observations: &[PoolObservation]) -> Vec<NormalizedObservation> {
    let normalized: Vec<NormalizedObservation> = observations
        .iter()
        .filter(|obs| {
            let eligible = is_eligible(obs);
            if !eligible {
                trace!(pool = %obs.pool_id, project = %obs.project_slug, "dropping ineligible pool");
            }
            eligible
        })
        .map(|obs| NormalizedObservation {
            period_return: period_return(obs.apy_percent),
            observation: obs.clone(),
        })
        .collect();

    debug!(
        input = observations.len(),
        eligible = normalized.len(),
        "normalized pool observations"
    );

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pool: &str, project: &str, name: Option<&str>, apy: f64) -> PoolObservation {
        PoolObservation::new(pool, project, name, "Ethereum", apy)
    }

    #[test]
    fn test_period_return_ten_percent() {
        let r = period_return(10.0);
        let expected = 1.1f64.powf(1.0 / 365.0) - 1.0;

        assert_eq!(r, expected);
        assert!((r - 0.000_261_16).abs() < 1e-8);
    }

    #[test]
    fn test_period_return_zero_and_negative() {
        assert_eq!(period_return(0.0), 0.0);
        assert!(period_return(-5.0) < 0.0);
    }

    #[test]
    fn test_period_return_compounds_back_to_apy() {
        let r = period_return(12.0);
        let annual = ((1.0 + r).powf(365.0) - 1.0) * 100.0;
        assert!((annual - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_drops_missing_project_name() {
        let input = vec![obs("a", "demo", None, 5.0), obs("b", "demo", Some("Demo"), 5.0)];
        let out = normalize(&input);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].observation.pool_id, "b");
    }

    #[test]
    fn test_drops_deprecated_project() {
        let input = vec![
            obs("a", "anchor", Some("Anchor"), 19.5),
            obs("b", "lido", Some("Lido"), 3.1),
        ];
        let out = normalize(&input);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].observation.project_slug, "lido");
    }

    #[test]
    fn test_preserves_order() {
        let input: Vec<_> = (0..10)
            .map(|i| obs(&format!("p{i}"), "demo", Some("Demo"), i as f64))
            .collect();
        let ids: Vec<_> = normalize(&input)
            .into_iter()
            .map(|n| n.observation.pool_id)
            .collect();

        let expected: Vec<_> = (0..10).map(|i| format!("p{i}")).collect();
        assert_eq!(ids, expected);
    }
}
