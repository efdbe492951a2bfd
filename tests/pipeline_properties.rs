//! End-to-end properties of the pool statistics pipeline

use std::collections::HashMap;

use poolstats::{
    DerivedPoolMetrics, Metric, PoolObservation, RunningAggregate, StatisticsPipeline, classify,
    derive, merge, normalize, period_return,
};
use statrs::statistics::Statistics;

fn listed(pool: &str, apy: f64) -> PoolObservation {
    PoolObservation::new(pool, "demo", Some("demo"), "Ethereum", apy)
}

fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        actual.abs()
    } else {
        ((actual - expected) / expected).abs()
    }
}

#[test]
fn test_first_observation_identity() {
    for apy in [0.0, 0.01, 3.7, 10.0, 250.0, -4.5] {
        let r = period_return(apy);
        let updated = merge(None, r);
        let metrics = derive(None, &updated, r, apy).unwrap();

        assert_eq!(metrics.sigma, 0.0, "apy {apy}");
        assert_eq!(metrics.mu, apy, "apy {apy}");
        assert_eq!(metrics.updated_count, 1);
    }
}

#[test]
fn test_welford_matches_two_pass() {
    // APYs drifting between ~2% and ~30% with a few spikes
    let apys: Vec<f64> = (0..400)
        .map(|i| {
            let base = 8.0 + 6.0 * ((i as f64) * 0.37).sin();
            if i % 53 == 0 { base * 3.5 } else { base }
        })
        .collect();
    let returns: Vec<f64> = apys.iter().map(|&a| period_return(a)).collect();

    let mut agg: Option<RunningAggregate> = None;
    for &r in &returns {
        agg = Some(merge(agg.as_ref(), r));
    }
    let agg = agg.unwrap();

    let naive_mean = returns.iter().mean();
    let naive_variance = returns.iter().variance();

    assert_eq!(agg.count, returns.len() as u64);
    assert!(relative_error(agg.mean, naive_mean) < 1e-9);
    assert!(relative_error(agg.sample_variance().unwrap(), naive_variance) < 1e-9);
}

#[test]
fn test_quartile_boundary_example() {
    let pools: Vec<DerivedPoolMetrics> = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0]
        .into_iter()
        .map(|mu| DerivedPoolMetrics {
            period_return: 0.0,
            sigma: 2.0,
            mu,
            updated_count: 30,
            is_outlier: false,
        })
        .collect();

    let result = classify(pools);
    let mu = result.boundary(Metric::Mu).unwrap();

    assert_eq!(mu.q1, 2.25);
    assert_eq!(mu.q3, 4.75);
    assert_eq!(mu.median, 3.5);
    assert_eq!(mu.iqr, 2.5);
    assert_eq!((mu.lower_bound, mu.upper_bound), (-0.25, 7.25));

    let flagged: Vec<f64> = result
        .pools
        .iter()
        .filter(|p| p.is_outlier)
        .map(|p| p.mu)
        .collect();
    assert_eq!(flagged, vec![100.0]);
}

#[test]
fn test_exclusion_rules() {
    let unlisted = PoolObservation::new("unlisted", "ghost", None, "Ethereum", 12.0);
    let deprecated = PoolObservation::new("ust", "anchor", Some("Anchor"), "Terra", 19.5);
    let input = vec![unlisted, listed("keep", 4.0), deprecated];

    let normalized = normalize(&input);
    assert_eq!(normalized.len(), 1);

    let mut priors = HashMap::new();
    let ust = RunningAggregate::first(period_return(19.5));
    priors.insert("ust".to_string(), ust);
    let out = StatisticsPipeline::new().run(&input, &priors).unwrap();

    let ids: Vec<&str> = out.pools.iter().map(|p| p.pool_id()).collect();
    assert_eq!(ids, vec!["keep"]);
    // Excluded pools are not updated, but an existing history is kept
    assert_eq!(out.aggregates["ust"], ust);
    assert!(!out.aggregates.contains_key("unlisted"));
}

#[test]
fn test_count_is_monotonic() {
    let mut agg: Option<RunningAggregate> = None;
    for k in 1..=25u64 {
        let next = merge(agg.as_ref(), period_return(5.0 + k as f64 * 0.1));
        assert_eq!(next.count, k);
        agg = Some(next);
    }
}

#[test]
fn test_two_cycle_scenario() {
    let pipeline = StatisticsPipeline::new();

    let cycle1 = pipeline.run(&[listed("p1", 10.0)], &HashMap::new()).unwrap();
    let first = &cycle1.pools[0].metrics;

    assert!((first.period_return - (1.1f64.powf(1.0 / 365.0) - 1.0)).abs() < 1e-15);
    assert!((first.period_return - 0.000_261_16).abs() < 1e-8);
    assert_eq!(first.sigma, 0.0);
    assert_eq!(first.mu, 10.0);
    assert_eq!(first.updated_count, 1);

    let cycle2 = pipeline.run(&[listed("p1", 12.0)], &cycle1.aggregates).unwrap();
    let second = &cycle2.pools[0].metrics;

    assert_eq!(second.updated_count, 2);
    assert!(second.sigma > 0.0);
    assert!(second.mu > 10.0 && second.mu < 12.0);
    assert!((second.mu - (1.232f64.sqrt() - 1.0) * 100.0).abs() < 1e-9);
    assert_eq!(cycle2.aggregates["p1"].count, 2);
}

#[test]
fn test_history_survives_skipped_cycles() {
    let pipeline = StatisticsPipeline::new();

    let cycle1 = pipeline.run(&[listed("p1", 10.0)], &HashMap::new()).unwrap();
    let cycle2 = pipeline.run(&[listed("p1", 12.0)], &cycle1.aggregates).unwrap();
    let after_two = cycle2.aggregates["p1"];

    // Listed without a project name for one cycle
    let unnamed = PoolObservation::new("p1", "demo", None, "Ethereum", 40.0);
    let cycle3 = pipeline.run(&[unnamed], &cycle2.aggregates).unwrap();
    assert!(cycle3.pools.is_empty());
    assert_eq!(cycle3.aggregates["p1"], after_two);

    // Missing from the batch entirely
    let cycle4 = pipeline.run(&[listed("p2", 5.0)], &cycle3.aggregates).unwrap();
    assert_eq!(cycle4.aggregates["p1"], after_two);
    assert_eq!(cycle4.aggregates["p2"].count, 1);

    let cycle5 = pipeline.run(&[listed("p1", 11.0)], &cycle4.aggregates).unwrap();
    let back = &cycle5.pools[0].metrics;

    assert_eq!(back.updated_count, 3);
    assert!(back.sigma > 0.0);
    assert_eq!(cycle5.aggregates["p1"], after_two.fold(period_return(11.0)));
    assert_eq!(cycle5.aggregates["p2"].count, 1);
}

#[test]
fn test_many_cycles_keep_sigma_finite() {
    let pipeline = StatisticsPipeline::new();
    let mut priors = HashMap::new();

    for cycle in 0..60 {
        let apy = 6.0 + (cycle % 7) as f64;
        let out = pipeline.run(&[listed("p1", apy)], &priors).unwrap();
        let m = &out.pools[0].metrics;

        assert!(m.sigma.is_finite() && m.sigma >= 0.0);
        assert!(m.mu.is_finite());
        assert_eq!(m.updated_count, cycle + 1);
        priors = out.aggregates;
    }
}

#[test]
fn test_batch_flags_spiking_pool() {
    let pipeline = StatisticsPipeline::new();
    let mut priors = HashMap::new();

    let ids: Vec<String> = (0..12).map(|i| format!("p{i}")).collect();
    for cycle in 0..10 {
        let batch: Vec<PoolObservation> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let steady = 4.0 + i as f64 * 0.25;
                // p11 alternates between a tiny and a huge APY
                let apy = if i == 11 && cycle % 2 == 0 { 900.0 } else { steady };
                listed(id, apy)
            })
            .collect();
        priors = pipeline.run(&batch, &priors).unwrap().aggregates;
    }

    let last: Vec<PoolObservation> = ids.iter().map(|id| listed(id, 5.0)).collect();
    let out = pipeline.run(&last, &priors).unwrap();

    let outliers: Vec<&str> = out.outliers().map(|p| p.pool_id()).collect();
    assert!(outliers.contains(&"p11"));
    assert!(!outliers.contains(&"p0"));
}
