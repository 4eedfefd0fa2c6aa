// src/resolve/fallback.rs
use chrono::NaiveDate;

use super::types::Lookup;

/// Output of a synthesizer: a substitute payload and the caveat shown with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized<P> {
    pub payload: P,
    pub caveat: String,
}

/// Deterministic last tier. Must not read clocks or randomness: the date comes
/// from the request.
pub trait FallbackSynthesizer<L: Lookup>: Send + Sync {
    fn synthesize(
        &self,
        query: &L::Query,
        context: &L::Context,
        as_of: NaiveDate,
    ) -> Synthesized<L::Payload>;
}
