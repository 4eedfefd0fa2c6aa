// src/resolve/mod.rs
//! Tiered resolution engine: ordered source attempts, an acceptance policy,
//! and an optional deterministic fallback.

pub mod attempt;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod policy;
pub mod types;

pub use attempt::SourceAttempt;
pub use error::{AttemptError, ResolveError};
pub use fallback::{FallbackSynthesizer, Synthesized};
pub use orchestrator::{Resolver, ResolverBuilder};
pub use policy::{AcceptancePolicy, ConfidenceAbove, NonEmptySuccess, DEFAULT_CONFIDENCE_THRESHOLD};
pub use types::{
    AttemptRecord, AttemptResult, AttemptStatus, Lookup, PayloadContent, Provenance,
    ResolveRequest, ResolvedAnswer,
};
