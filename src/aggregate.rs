//! Running per-pool aggregates updated with Welford's online algorithm
//!
//! Each refresh cycle folds exactly one daily return into a pool's aggregate.
//! Aggregates are immutable values: [`merge`] returns the successor and the
//! caller replaces the stored snapshot wholesale.

use serde::{Deserialize, Serialize};

/// Running (count, mean, M2, product) state for one pool
///
/// Wire names match the yields backend's stats table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningAggregate {
    /// Periods folded in so far, always >= 1
    pub count: u64,
    /// Running mean of daily returns
    #[serde(rename = "meanDR")]
    pub mean: f64,
    /// Running sum of squared deviations from the mean (M2)
    #[serde(rename = "mean2DR")]
    pub sum_squared_deviation: f64,
    /// Running product of `(1 + r)`, used for the compounded mean
    #[serde(rename = "productDR")]
    pub return_product: f64,
}

impl RunningAggregate {
    /// Aggregate for a pool seen for the first time
    pub fn first(period_return: f64) -> Self {
        Self {
            count: 1,
            mean: period_return,
            sum_squared_deviation: 0.0,
            return_product: 1.0 + period_return,
        }
    }

    /// Fold one more daily return into this aggregate
    ///
    /// `return_product` is carried through unchanged; compounding of the new
    /// period happens in metric derivation against the prior product.
    pub fn fold(&self, period_return: f64) -> Self {
        let count = self.count + 1;
        let delta = period_return - self.mean;
        let mean = self.mean + delta / count as f64;
        let delta2 = period_return - mean;

        Self {
            count,
            mean,
            sum_squared_deviation: self.sum_squared_deviation + delta * delta2,
            return_product: self.return_product,
        }
    }

    /// Sample variance `M2 / (n - 1)`, `None` until two periods are folded
    pub fn sample_variance(&self) -> Option<f64> {
        if self.count > 1 {
            Some(self.sum_squared_deviation / (self.count - 1) as f64)
        } else {
            None
        }
    }

    pub fn is_first_observation(&self) -> bool {
        self.count == 1
    }
}

/// Merge a daily return into an optional prior aggregate
pub fn merge(prior: Option<&RunningAggregate>, period_return: f64) -> RunningAggregate {
    match prior {
        Some(prior) => prior.fold(period_return),
        None => RunningAggregate::first(period_return),
    }
}
