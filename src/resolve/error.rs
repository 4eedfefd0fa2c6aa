//! Error taxonomy for the resolution engine.
//!
//! `AttemptError` stays inside the resolution loop: the orchestrator records it in
//! the attempt trail and moves on. `ResolveError` is the only thing a caller sees.

use thiserror::Error;

/// Failure of a single source attempt. Always recovered by the orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    #[error("attempt timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("result rejected by acceptance policy: {reason}")]
    Rejected { reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    #[error("invalid upstream response: {0}")]
    Invalid(String),

    #[error("payload is empty")]
    EmptyPayload,
}

impl AttemptError {
    /// Short, stable label used for metrics and the attempt trail.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout { .. } => "timeout",
            AttemptError::Rejected { .. } => "rejected",
            AttemptError::Transport(_) => "transport",
            AttemptError::Status { .. } => "status",
            AttemptError::Invalid(_) => "invalid",
            AttemptError::EmptyPayload => "empty_payload",
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured duration; 0 marks "client-side ceiling".
            AttemptError::Timeout { timeout_ms: 0 }
        } else if let Some(status) = e.status() {
            AttemptError::Status {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            AttemptError::Invalid(e.to_string())
        } else {
            AttemptError::Transport(e.to_string())
        }
    }
}

/// Terminal outcome of `Resolver::resolve` when no answer can be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no source produced an accepted result ({tried} attempts tried)")]
    NoResult { tried: usize },

    #[error("no transcript cleared the confidence threshold ({tried} configurations tried)")]
    NoTranscript { tried: usize },

    #[error("resolution cancelled")]
    Cancelled,

    /// Pre-flight failure detected before any attempt ran (e.g. empty audio).
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}
