#![forbid(unsafe_code)]

//! # consensus-harness
//!
//! Majority-vote consensus and precision/recall/F1 metrics for noisy,
//! repeated LLM extractions of institutional-grammar components.
//!
//! An external labeler runs N independent extraction passes per statement,
//! each producing a mapping from component symbol (actor, deontic, object,
//! condition, ...) to text spans. The [`aggregate`] module collapses those
//! runs into one consensus mapping per statement via an occurrence-count
//! majority vote; the [`metrics`] and [`bootstrap`] modules score the
//! consensus against ground truth per symbol and corpus-wide, with seeded
//! bootstrap confidence intervals on the micro/macro F1.
//!
//! The core (aggregation, metrics, bootstrap) is pure and synchronous; the
//! [`labeler`] module is the async collaborator that builds corpora in the
//! first place.

pub mod aggregate;
pub mod bootstrap;
pub mod labeler;
pub mod metrics;
pub mod prompts;
pub mod report;
pub mod statement;

pub use aggregate::{acceptance_threshold, aggregate, aggregate_statement};
pub use bootstrap::{
    compute_aggregate_metrics_with_ci, AggregateMetricWithCi, CiSummary, MetricsError,
};
pub use metrics::{
    compute_aggregate_metrics, compute_component_metrics, AggregateMetric, AggregateSummary,
    ComponentMetric,
};
pub use statement::{AggregatedStatement, ComponentMap, StatementKind, StatementRecord, Variants};
