// src/resolve/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Bundles the types of one domain instantiation (prices, transcription, ...).
pub trait Lookup: Send + Sync + 'static {
    type Query: Send + Sync;
    type Context: Send + Sync;
    type Payload: PayloadContent + Send + Sync;

    /// Label used in logs and metrics.
    const LABEL: &'static str;
}

/// Lets generic policies ask whether a payload carries anything useful.
pub trait PayloadContent {
    fn is_empty(&self) -> bool;
}

impl PayloadContent for String {
    fn is_empty(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> PayloadContent for Vec<T> {
    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// One lookup: what is asked, for whom, and as of which calendar date.
pub struct ResolveRequest<L: Lookup> {
    query: L::Query,
    context: L::Context,
    as_of: NaiveDate,
}

impl<L: Lookup> ResolveRequest<L> {
    pub fn new(query: L::Query, context: L::Context, as_of: NaiveDate) -> Self {
        Self {
            query,
            context,
            as_of,
        }
    }

    pub fn query(&self) -> &L::Query {
        &self.query
    }

    pub fn context(&self) -> &L::Context {
        &self.context
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }
}

/// What a single attempt produced. A declined attempt never carries a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult<P> {
    Success { payload: P, confidence: Option<f32> },
    Declined { reason: String },
}

impl<P> AttemptResult<P> {
    /// Success with implicit (binary) confidence.
    pub fn success(payload: P) -> Self {
        AttemptResult::Success {
            payload,
            confidence: None,
        }
    }

    /// Success with a confidence score; clamped into `[0,1]`, NaN treated as 0.
    pub fn scored(payload: P, confidence: f32) -> Self {
        let c = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        AttemptResult::Success {
            payload,
            confidence: Some(c),
        }
    }

    pub fn declined(reason: impl Into<String>) -> Self {
        AttemptResult::Declined {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Success { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            AttemptResult::Success { payload, .. } => Some(payload),
            AttemptResult::Declined { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            AttemptResult::Success { confidence, .. } => *confidence,
            AttemptResult::Declined { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            AttemptResult::Success { payload, .. } => Some(payload),
            AttemptResult::Declined { .. } => None,
        }
    }
}

/// Which tier produced the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Live(String),
    Synthetic,
}

impl Provenance {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Provenance::Synthetic)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live(name) => write!(f, "live:{name}"),
            Provenance::Synthetic => f.write_str("synthetic"),
        }
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How an executed attempt ended, as recorded in the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Accepted,
    Rejected,
    Declined,
    TimedOut,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub attempt: String,
    pub status: AttemptStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Final, immutable answer handed back to the tool layer.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAnswer<P> {
    pub payload: P,
    pub provenance: Provenance,
    pub resolved_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
    pub trail: Vec<AttemptRecord>,
}

impl<P> ResolvedAnswer<P> {
    /// Number of attempts that actually executed.
    pub fn attempts_run(&self) -> usize {
        self.trail.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_renders_tag() {
        assert_eq!(Provenance::Live("scrape".into()).to_string(), "live:scrape");
        assert_eq!(Provenance::Synthetic.to_string(), "synthetic");
        let json = serde_json::to_string(&Provenance::Live("api".into())).unwrap();
        assert_eq!(json, "\"live:api\"");
    }

    #[test]
    fn scored_clamps_confidence() {
        let r = AttemptResult::scored("x".to_string(), 1.7);
        assert_eq!(r.confidence(), Some(1.0));
        let r = AttemptResult::scored("x".to_string(), f32::NAN);
        assert_eq!(r.confidence(), Some(0.0));
    }

    #[test]
    fn declined_has_no_payload() {
        let r: AttemptResult<String> = AttemptResult::declined("nope");
        assert!(!r.is_success());
        assert!(r.payload().is_none());
        assert!(r.confidence().is_none());
    }
}
