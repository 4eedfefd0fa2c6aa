//! Acceptance policies (the confidence gate).
//!
//! A policy decides whether a *successful* attempt is good enough to stop the
//! search. Declined results are never accepted.

use super::types::{AttemptResult, PayloadContent};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

pub trait AcceptancePolicy<P>: Send + Sync {
    fn accepts(&self, result: &AttemptResult<P>) -> bool;

    fn describe(&self) -> String;
}

/// Binary gate: success with a non-empty payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptySuccess;

impl<P: PayloadContent> AcceptancePolicy<P> for NonEmptySuccess {
    fn accepts(&self, result: &AttemptResult<P>) -> bool {
        result.payload().is_some_and(|p| !p.is_empty())
    }

    fn describe(&self) -> String {
        "success with non-empty payload".to_string()
    }
}

/// Strict `confidence > threshold`. Missing confidence never passes.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceAbove {
    threshold: f32,
}

impl ConfidenceAbove {
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold.is_nan() {
            DEFAULT_CONFIDENCE_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl Default for ConfidenceAbove {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl<P> AcceptancePolicy<P> for ConfidenceAbove {
    fn accepts(&self, result: &AttemptResult<P>) -> bool {
        result.is_success() && result.confidence().is_some_and(|c| c > self.threshold)
    }

    fn describe(&self) -> String {
        format!("confidence > {:.2}", self.threshold)
    }
}
