//! Markdown table rendering for metric results.
//!
//! Pure string building; printing and file writing stay in the CLI.

use std::collections::BTreeMap;

use crate::bootstrap::CiSummary;
use crate::metrics::ComponentMetric;

/// Render the per-symbol table and the micro/macro table (github-style
/// markdown) for a finished evaluation.
pub fn render_metrics_markdown(
    component_metrics: &BTreeMap<String, ComponentMetric>,
    summary: &CiSummary,
    total_statements: usize,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total statements processed: {total_statements}\n"));

    out.push_str("\nContent-Level Metrics:\n");
    out.push_str("| Component | Precision | Recall | F1 |\n");
    out.push_str("|-----------|-----------|--------|----|\n");
    for (symbol, m) in component_metrics {
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} |\n",
            symbol, m.precision, m.recall, m.f1
        ));
    }

    out.push_str("\nAggregate Content-Level Metrics:\n");
    out.push_str("| Type | Precision | Recall | F1 (95% CI) |\n");
    out.push_str("|------|-----------|--------|-------------|\n");
    for (name, m) in [("micro", summary.micro), ("macro", summary.macro_)] {
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} ({:.3} - {:.3}) |\n",
            name, m.precision, m.recall, m.f1, m.ci.0, m.ci.1
        ));
    }

    out
}

// =============================================================================
// TESTS
// =============================================================================
