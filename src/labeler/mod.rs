//! External labeling collaborator: repeated LLM extraction runs.
//!
//! Produces the raw per-run component maps the aggregator consumes. The
//! evaluation core never touches this module; it exists so a corpus can be
//! built end to end from plain statements.

pub mod error;
pub mod provider;
pub mod types;

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

use crate::statement::{validate_components, ComponentMap, StatementKind, StatementRecord};

pub use error::LabelerError;
pub use provider::{ChatLabeler, HttpLabeler};
pub use types::{LabelerConfig, Provider};

/// Parse-failure retry budget per statement, as a multiple of `runs`.
const ATTEMPT_MULTIPLIER: usize = 10;

/// Pull the first JSON object out of raw model output, tolerating markdown
/// fences and surrounding prose.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, LabelerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LabelerError::Parse("empty output".into()));
    }

    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?\s*|\s*```$").unwrap());
    let stripped = fence.replace_all(trimmed, "");

    if let Ok(value) = serde_json::from_str(stripped.trim()) {
        return Ok(value);
    }

    // Fall back to scanning for the first balanced object.
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in stripped.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(open) = start.take() {
                        let candidate = &stripped[open..=idx];
                        if let Ok(value) = serde_json::from_str(candidate) {
                            return Ok(value);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Err(LabelerError::Parse(
        "no valid JSON object found in output".into(),
    ))
}

/// Deserialize an extracted JSON value into a schema-validated component map.
fn validate_value(
    kind: StatementKind,
    value: serde_json::Value,
) -> Result<ComponentMap, LabelerError> {
    let map: ComponentMap =
        serde_json::from_value(value).map_err(|e| LabelerError::Parse(e.to_string()))?;
    Ok(validate_components(kind, map))
}

/// Parse one run's output into a schema-validated component map.
fn parse_run(kind: StatementKind, raw: &str) -> Result<ComponentMap, LabelerError> {
    validate_value(kind, extract_json(raw)?)
}

/// Run the labeler `runs` times for one statement, retrying malformed
/// outputs up to `runs * 10` attempts.
///
/// When `lo_prompt` is set, each run's parsed output goes through a second
/// refinement call: the logical-operator prompt becomes the system text, the
/// original statement plus the first-pass JSON becomes the user text, and
/// the refined output replaces the first pass. A refinement that fails to
/// parse counts against the same attempt budget as the first pass.
pub async fn extract_components(
    labeler: &dyn ChatLabeler,
    kind: StatementKind,
    system_prompt: &str,
    lo_prompt: Option<&str>,
    input: &str,
    runs: usize,
) -> Result<Vec<ComponentMap>, LabelerError> {
    let max_attempts = runs.saturating_mul(ATTEMPT_MULTIPLIER);
    let mut out = Vec::with_capacity(runs);
    let mut attempts = 0usize;

    while out.len() < runs {
        attempts += 1;
        let raw = labeler.chat(system_prompt, input).await?;

        let value = match extract_json(&raw) {
            Ok(value) => match lo_prompt {
                Some(lo) => {
                    let lo_input = format!("Input: {input}\n{value}");
                    let raw_lo = labeler.chat(lo, &lo_input).await?;
                    extract_json(&raw_lo)
                }
                None => Ok(value),
            },
            Err(err) => Err(err),
        };

        match value.and_then(|v| validate_value(kind, v)) {
            Ok(components) => out.push(components),
            Err(err) => {
                warn!(attempt = attempts, error = %err, "labeler output unparseable");
                if attempts >= max_attempts {
                    return Err(LabelerError::TooManyParseFailures { attempts, runs });
                }
            }
        }
    }

    Ok(out)
}

/// Fill in `results` for every statement in a corpus, preserving order.
pub async fn label_statements(
    labeler: &dyn ChatLabeler,
    kind: StatementKind,
    system_prompt: &str,
    lo_prompt: Option<&str>,
    statements: &[StatementRecord],
    runs: usize,
) -> Result<Vec<StatementRecord>, LabelerError> {
    let mut out = Vec::with_capacity(statements.len());
    for statement in statements {
        let results = extract_components(
            labeler,
            kind,
            system_prompt,
            lo_prompt,
            &statement.input,
            runs,
        )
        .await?;
        out.push(StatementRecord {
            input: statement.input.clone(),
            expected_components: statement.expected_components.clone(),
            results,
        });
    }
    Ok(out)
}

// =============================================================================
// TESTS
// =============================================================================
