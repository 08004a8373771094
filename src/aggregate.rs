//! Majority-vote consensus over repeated extraction runs.
//!
//! Each statement carries N independent run results mapping symbols to
//! variant lists. Aggregation counts variant occurrences across all runs and
//! keeps the ones reaching the acceptance threshold, so a single hallucinated
//! span in one run out of five never survives into the consensus.

use std::collections::HashMap;

use crate::statement::{AggregatedStatement, ComponentMap, StatementRecord};

/// Minimum occurrence count for a variant to qualify, given N runs.
///
/// N = 1 passes everything through; otherwise a true majority with a floor
/// of two corroborating runs. A tie at exactly half qualifies (N = 4 needs
/// only 2).
pub fn acceptance_threshold(total_runs: usize) -> usize {
    if total_runs <= 1 {
        1
    } else {
        total_runs.div_ceil(2).max(2)
    }
}

/// Collapse one statement's runs into a consensus component map.
///
/// Occurrences are tallied per distinct variant string: a variant repeated
/// within the same run counts once per repetition, not once per run.
/// Qualifying variants are ordered by first appearance in run 0; variants
/// that qualified without ever appearing in run 0 follow, in the order they
/// were first encountered scanning the remaining runs in sequence. Symbols
/// with zero qualifying variants are omitted entirely.
pub fn aggregate_statement(record: &StatementRecord) -> AggregatedStatement {
    let threshold = acceptance_threshold(record.results.len());

    // Occurrence counts and first-encounter order, per symbol. The encounter
    // list visits run 0 first, so filtering it preserves the ordering rule.
    let mut counts: HashMap<&str, HashMap<&str, usize>> = HashMap::new();
    let mut encounter_order: HashMap<&str, Vec<&str>> = HashMap::new();

    for run in &record.results {
        for (symbol, variants) in run {
            let symbol_counts = counts.entry(symbol).or_default();
            let order = encounter_order.entry(symbol).or_default();
            for variant in variants {
                let count = symbol_counts.entry(variant).or_insert(0);
                *count += 1;
                if *count == 1 {
                    order.push(variant);
                }
            }
        }
    }

    // Run-0 variants must lead even when a later run introduced some other
    // variant for the same symbol first; re-rank the encounter list so run-0
    // members keep their run-0 relative order up front.
    let run0 = record.results.first();
    let mut actual_components = ComponentMap::new();
    for (symbol, order) in encounter_order {
        let mut run0_order: Vec<&str> = Vec::new();
        if let Some(variants) = run0.and_then(|run| run.get(symbol)) {
            for variant in variants {
                if !run0_order.contains(&variant.as_str()) {
                    run0_order.push(variant);
                }
            }
        }

        let symbol_counts = &counts[symbol];
        let qualifies = |variant: &&str| symbol_counts[*variant] >= threshold;

        let mut accepted: Vec<String> = run0_order
            .iter()
            .copied()
            .filter(qualifies)
            .map(str::to_string)
            .collect();
        accepted.extend(
            order
                .iter()
                .copied()
                .filter(|v| !run0_order.contains(v))
                .filter(qualifies)
                .map(str::to_string),
        );

        if !accepted.is_empty() {
            actual_components.insert(symbol.to_string(), accepted);
        }
    }

    AggregatedStatement {
        input: record.input.clone(),
        expected_components: record.expected_components.clone(),
        actual_components,
    }
}

/// Aggregate a whole corpus, preserving input order.
pub fn aggregate(records: &[StatementRecord]) -> Vec<AggregatedStatement> {
    records.iter().map(aggregate_statement).collect()
}

// =============================================================================
// TESTS
// =============================================================================
