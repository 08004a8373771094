//! Bootstrap confidence intervals for the micro/macro F1 point estimates.
//!
//! Resampling happens at statement granularity only: each iteration draws a
//! corpus-sized sample of statements with replacement, recomputes the
//! micro/macro F1, and the 95% interval is the [2.5, 97.5] percentile of the
//! recorded distributions. Every iteration seeds its own RNG from the master
//! seed and the iteration index, so the whole procedure is byte-for-byte
//! reproducible at any rayon worker count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{compute_aggregate_metrics, compute_component_metrics, AggregateMetric};
use crate::statement::AggregatedStatement;

/// Invalid bootstrap configuration. The estimator refuses to run rather
/// than degrade silently: percentiles over an empty or never-sampled
/// distribution have no meaning.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("bootstrap requires a non-empty aggregated corpus")]
    EmptyCorpus,
    #[error("bootstrap_iterations must be >= 1, got {0}")]
    ZeroIterations(usize),
}

/// Aggregate metric with a 95% bootstrap interval on F1.
///
/// Precision and recall are the full-corpus point estimates, carried
/// through unmodified; only F1 gets an interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetricWithCi {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// (lo, hi) with 0 <= lo <= hi <= 1.
    pub ci: (f64, f64),
}

/// Micro and macro averages with confidence intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CiSummary {
    pub micro: AggregateMetricWithCi,
    #[serde(rename = "macro")]
    pub macro_: AggregateMetricWithCi,
}

/// Full-corpus point estimates plus bootstrap 95% CIs on micro/macro F1.
pub fn compute_aggregate_metrics_with_ci(
    statements: &[AggregatedStatement],
    bootstrap_iterations: usize,
    seed: u64,
) -> Result<CiSummary, MetricsError> {
    if statements.is_empty() {
        return Err(MetricsError::EmptyCorpus);
    }
    if bootstrap_iterations == 0 {
        return Err(MetricsError::ZeroIterations(bootstrap_iterations));
    }

    let point = compute_aggregate_metrics(&compute_component_metrics(statements));

    // Iterations are independent; indexed collect keeps the recorded F1
    // distributions in iteration order regardless of scheduling.
    let scores: Vec<(f64, f64)> = (0..bootstrap_iterations)
        .into_par_iter()
        .map(|iteration| {
            let mut rng = StdRng::seed_from_u64(sub_seed(seed, iteration as u64));
            let resample = (0..statements.len())
                .map(|_| &statements[rng.gen_range(0..statements.len())]);
            let summary = compute_aggregate_metrics(&compute_component_metrics(resample));
            (summary.micro.f1, summary.macro_.f1)
        })
        .collect();

    let micro_scores: Vec<f64> = scores.iter().map(|s| s.0).collect();
    let macro_scores: Vec<f64> = scores.iter().map(|s| s.1).collect();

    Ok(CiSummary {
        micro: with_ci(point.micro, &micro_scores),
        macro_: with_ci(point.macro_, &macro_scores),
    })
}

fn with_ci(point: AggregateMetric, f1_scores: &[f64]) -> AggregateMetricWithCi {
    AggregateMetricWithCi {
        precision: point.precision,
        recall: point.recall,
        f1: point.f1,
        ci: (percentile(f1_scores, 2.5), percentile(f1_scores, 97.5)),
    }
}

/// Per-iteration sub-seed via a splitmix64-style mixer over (master, index).
fn sub_seed(master: u64, index: u64) -> u64 {
    let mut z = master ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Linear-interpolation percentile over a non-empty sample, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::ComponentMap;

    fn statement(expected: &[(&str, &[&str])], actual: &[(&str, &[&str])]) -> AggregatedStatement {
        let to_map = |pairs: &[(&str, &[&str])]| -> ComponentMap {
            pairs
                .iter()
                .map(|(s, vs)| (s.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect()
        };
        AggregatedStatement {
            input: "test".into(),
            expected_components: to_map(expected),
            actual_components: to_map(actual),
        }
    }

    fn mixed_corpus() -> Vec<AggregatedStatement> {
        vec![
            statement(&[("A", &["x"])], &[("A", &["x"])]),
            statement(&[("A", &["y"])], &[("A", &["z"])]),
            statement(&[("D", &["shall"])], &[("D", &["shall", "must"])]),
            statement(&[("I", &["act"])], &[]),
        ]
    }

    #[test]
    fn rejects_empty_corpus() {
        let err = compute_aggregate_metrics_with_ci(&[], 100, 42).unwrap_err();
        assert_eq!(err, MetricsError::EmptyCorpus);
    }

    #[test]
    fn rejects_zero_iterations() {
        let corpus = mixed_corpus();
        let err = compute_aggregate_metrics_with_ci(&corpus, 0, 42).unwrap_err();
        assert_eq!(err, MetricsError::ZeroIterations(0));
    }

    #[test]
    fn interval_is_ordered_and_bounded() {
        let corpus = mixed_corpus();
        let summary = compute_aggregate_metrics_with_ci(&corpus, 200, 42).unwrap();
        for m in [summary.micro, summary.macro_] {
            let (lo, hi) = m.ci;
            assert!(lo <= hi);
            assert!((0.0..=1.0).contains(&lo));
            assert!((0.0..=1.0).contains(&hi));
        }
    }

    #[test]
    fn identical_seed_is_bit_identical() {
        let corpus = mixed_corpus();
        let a = compute_aggregate_metrics_with_ci(&corpus, 300, 7).unwrap();
        let b = compute_aggregate_metrics_with_ci(&corpus, 300, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let corpus = mixed_corpus();
        let a = compute_aggregate_metrics_with_ci(&corpus, 300, 1).unwrap();
        let b = compute_aggregate_metrics_with_ci(&corpus, 300, 2).unwrap();
        // Point estimates match; intervals come from different draws.
        assert_eq!(a.micro.f1, b.micro.f1);
        assert!(a.micro.ci != b.micro.ci || a.macro_.ci != b.macro_.ci);
    }

    #[test]
    fn degenerate_corpus_yields_zero_interval() {
        // No true positives anywhere: every resample scores 0.0.
        let corpus = vec![statement(&[("A", &["x"])], &[("A", &["y"])])];
        let summary = compute_aggregate_metrics_with_ci(&corpus, 50, 9).unwrap();
        assert_eq!(summary.micro.ci, (0.0, 0.0));
        assert_eq!(summary.macro_.ci, (0.0, 0.0));
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 0.0);
        assert_eq!(percentile(&values, 50.0), 2.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 2.5) - 0.1).abs() < 1e-12);
        assert!((percentile(&values, 97.5) - 3.9).abs() < 1e-12);
    }

    #[test]
    fn sub_seeds_are_distinct() {
        let seeds: std::collections::HashSet<u64> = (0..1000).map(|i| sub_seed(42, i)).collect();
        assert_eq!(seeds.len(), 1000);
    }
}
