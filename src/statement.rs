//! Data model for statements, extraction runs, and consensus results.
//!
//! A *symbol* names a semantic role (`"A"` for actor, `"D"` for deontic,
//! `"Bdir,p"` for a direct-object property, ...). A *variant* is a text span
//! one extraction run proposed for that role. Symbols are corpus-defined;
//! the core never hardcodes a symbol universe. The labeler, by contrast,
//! validates against a closed schema per statement kind (see
//! [`StatementKind`]).

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Mapping from symbol to the variants proposed for it, keys sorted
/// lexicographically. One of these per extraction run, per expected-truth
/// annotation, and per consensus result.
pub type ComponentMap = BTreeMap<String, Vec<String>>;

// =============================================================================
// Variant views
// =============================================================================

/// One symbol's variants as a canonical ordered sequence with duplicates
/// removed.
///
/// Scoring treats variants as a set (symmetric-difference counting) while
/// output keeps presentation order; both views derive from this one
/// canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Variants(Vec<String>);

impl Variants {
    /// Build from an ordered sequence, dropping repeated strings while
    /// keeping first-appearance order.
    pub fn from_ordered<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for item in items {
            let item = item.into();
            if seen.insert(item.clone()) {
                out.push(item);
            }
        }
        Self(out)
    }

    /// Ordered view, used for presentation and serialization.
    pub fn ordered(&self) -> &[String] {
        &self.0
    }

    /// Set view, used for scoring.
    pub fn as_set(&self) -> HashSet<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Variants> for Vec<String> {
    fn from(v: Variants) -> Self {
        v.0
    }
}

// =============================================================================
// Records
// =============================================================================

/// One statement with ground truth and the raw per-run extraction results.
///
/// `results` and `expected_components` are optional on the wire: a record
/// missing either deserializes with empty containers rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub input: String,
    #[serde(default)]
    pub expected_components: ComponentMap,
    #[serde(default)]
    pub results: Vec<ComponentMap>,
}

/// Consensus result for one statement, produced by the aggregator.
///
/// A symbol appears in `actual_components` only if at least one variant
/// qualified; empty lists are never stored. Both maps serialize with keys
/// in lexicographic order (BTreeMap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedStatement {
    pub input: String,
    pub expected_components: ComponentMap,
    pub actual_components: ComponentMap,
}

/// Serialize a corpus snapshot: UTF-8 JSON array, 2-space indent, array
/// order matching input order, object keys sorted within each map.
pub fn to_snapshot_json(statements: &[AggregatedStatement]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(statements)
}

// =============================================================================
// Statement kinds and symbol schemas
// =============================================================================

/// Regulative symbols: aim, actor (+property), direct and indirect objects
/// (+properties), deontic, activation/execution conditions, or-else.
const REGULATIVE_SYMBOLS: &[&str] = &[
    "I", "A", "A,p", "Bdir", "Bdir,p", "Bind", "Bind,p", "D", "Cac", "Cex", "O",
];

/// Constitutive symbols: constituted entity (+property), function, properties,
/// modal, conditions, or-else.
const CONSTITUTIVE_SYMBOLS: &[&str] = &["E", "E,p", "F", "P", "P,p", "M", "Cac", "Cex", "O"];

/// Which institutional-grammar schema a statement is labeled under.
///
/// The core aggregation and metrics accept arbitrary symbol sets; the
/// schema is used by the labeler to validate model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Regulative,
    Constitutive,
}

impl StatementKind {
    pub fn symbols(&self) -> &'static [&'static str] {
        match self {
            Self::Regulative => REGULATIVE_SYMBOLS,
            Self::Constitutive => CONSTITUTIVE_SYMBOLS,
        }
    }

    pub fn allows(&self, symbol: &str) -> bool {
        self.symbols().contains(&symbol)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regulative => "regulative",
            Self::Constitutive => "constitutive",
        }
    }
}

/// Keep only schema symbols with non-empty variant lists, preserving the
/// run's ordering within each list. Unknown symbols are dropped silently;
/// the model emitting extra keys is noise, not an error.
pub fn validate_components(kind: StatementKind, raw: ComponentMap) -> ComponentMap {
    raw.into_iter()
        .filter(|(symbol, variants)| kind.allows(symbol) && !variants.is_empty())
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
