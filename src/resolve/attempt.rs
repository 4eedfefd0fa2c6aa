// src/resolve/attempt.rs
use std::time::Duration;

use super::error::AttemptError;
use super::types::{AttemptResult, Lookup};

/// One data-acquisition strategy. Implementations hold only their own
/// configuration (clients, URLs, codec settings) and never touch request state.
#[async_trait::async_trait]
pub trait SourceAttempt<L: Lookup>: Send + Sync {
    fn name(&self) -> &str;

    /// Lower runs first.
    fn priority(&self) -> u32;

    /// Upper bound enforced by the orchestrator around `attempt`.
    fn timeout(&self) -> Duration;

    async fn attempt(
        &self,
        query: &L::Query,
        context: &L::Context,
    ) -> Result<AttemptResult<L::Payload>, AttemptError>;
}
