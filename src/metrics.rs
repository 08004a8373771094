//! Per-symbol and corpus-level precision/recall/F1 over consensus results.
//!
//! Scoring is set-based: each symbol's variant list collapses to a set of
//! distinct strings, and tp/fp/fn come from set intersection and difference
//! against the expected variants. Symbols absent from both sides of a
//! statement contribute nothing (no true-negative padding). Every
//! division-by-zero resolves to 0.0, never an error or NaN.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::statement::{AggregatedStatement, Variants};

/// Accumulated counts and derived scores for one symbol across the corpus.
///
/// Invariants after [`compute_component_metrics`]: `tp + fp ==
/// aggregated_count` and `tp + fn == expected_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetric {
    pub tp: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub expected_count: usize,
    pub aggregated_count: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Precision/recall/F1 triple for one averaging scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetric {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Micro and macro averages over all symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub micro: AggregateMetric,
    #[serde(rename = "macro")]
    pub macro_: AggregateMetric,
}

/// Tally set-based tp/fp/fn per symbol over a corpus and derive P/R/F1.
///
/// Accepts any iterator of statements so bootstrap resamples of borrowed
/// statements reuse it without cloning.
pub fn compute_component_metrics<'a, I>(statements: I) -> BTreeMap<String, ComponentMetric>
where
    I: IntoIterator<Item = &'a AggregatedStatement>,
{
    let mut metrics: BTreeMap<String, ComponentMetric> = BTreeMap::new();

    for statement in statements {
        let expected = &statement.expected_components;
        let actual = &statement.actual_components;

        let symbols: std::collections::BTreeSet<&str> = expected
            .keys()
            .chain(actual.keys())
            .map(String::as_str)
            .collect();

        for symbol in symbols {
            let expected_set = expected
                .get(symbol)
                .map(|v| Variants::from_ordered(v.iter().cloned()))
                .unwrap_or_default();
            let actual_set = actual
                .get(symbol)
                .map(|v| Variants::from_ordered(v.iter().cloned()))
                .unwrap_or_default();
            let expected_set = expected_set.as_set();
            let actual_set = actual_set.as_set();

            let tp = expected_set.intersection(&actual_set).count();
            let entry = metrics.entry(symbol.to_string()).or_default();
            entry.tp += tp;
            entry.fp += actual_set.len() - tp;
            entry.fn_ += expected_set.len() - tp;
            entry.expected_count += expected_set.len();
            entry.aggregated_count += actual_set.len();
        }
    }

    for metric in metrics.values_mut() {
        metric.precision = ratio(metric.tp, metric.tp + metric.fp);
        metric.recall = ratio(metric.tp, metric.tp + metric.fn_);
        metric.f1 = f1_score(metric.precision, metric.recall);
    }

    metrics
}

/// Micro (pooled counts) and macro (unweighted mean) averages.
///
/// Micro weights symbols by frequency; macro weights them equally. Zero
/// symbols yields all-zero metrics.
pub fn compute_aggregate_metrics(
    component_metrics: &BTreeMap<String, ComponentMetric>,
) -> AggregateSummary {
    let total_tp: usize = component_metrics.values().map(|m| m.tp).sum();
    let total_fp: usize = component_metrics.values().map(|m| m.fp).sum();
    let total_fn: usize = component_metrics.values().map(|m| m.fn_).sum();

    let micro_precision = ratio(total_tp, total_tp + total_fp);
    let micro_recall = ratio(total_tp, total_tp + total_fn);
    let micro = AggregateMetric {
        precision: micro_precision,
        recall: micro_recall,
        f1: f1_score(micro_precision, micro_recall),
    };

    let n = component_metrics.len();
    let macro_ = if n == 0 {
        AggregateMetric::default()
    } else {
        let mean = |f: fn(&ComponentMetric) -> f64| {
            component_metrics.values().map(f).sum::<f64>() / n as f64
        };
        AggregateMetric {
            precision: mean(|m| m.precision),
            recall: mean(|m| m.recall),
            f1: mean(|m| m.f1),
        }
    };

    AggregateSummary { micro, macro_ }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

// =============================================================================
// TESTS
// =============================================================================
