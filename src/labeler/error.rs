//! Error types for the extraction labeler.

use thiserror::Error;

/// Errors from the labeling collaborator. The evaluation core never sees
/// these; they surface in the CLI's extract phase.
#[derive(Debug, Error)]
pub enum LabelerError {
    /// Configuration error (missing API key, unknown template, etc.).
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP/network error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error payload or an unusable response shape.
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Provider returned an empty completion.
    #[error("empty response from provider")]
    EmptyResponse,

    /// No parseable JSON object in the model output.
    #[error("could not parse model output: {0}")]
    Parse(String),

    /// Retry budget for malformed outputs exhausted.
    #[error("too many failed attempts parsing labeler output ({attempts} attempts for {runs} runs)")]
    TooManyParseFailures { attempts: usize, runs: usize },
}

impl LabelerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
        }
    }
}
