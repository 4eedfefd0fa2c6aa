// src/resolve/orchestrator.rs
//! Runs source attempts in priority order and stops at the first accepted result.
//!
//! Attempt-level failures (errors, timeouts, declines, policy rejections) are
//! recorded in the trail and logged, never surfaced. Only exhaustion without a
//! fallback, a bad configuration, or caller cancellation reach the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::attempt::SourceAttempt;
use super::error::{AttemptError, ResolveError};
use super::fallback::FallbackSynthesizer;
use super::policy::{AcceptancePolicy, NonEmptySuccess};
use super::types::{
    AttemptRecord, AttemptResult, AttemptStatus, Lookup, Provenance, ResolveRequest,
    ResolvedAnswer,
};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "resolve_attempts_total",
            "Source attempts executed, by lookup, attempt and outcome."
        );
        describe_counter!(
            "resolve_answers_total",
            "Answers returned, by lookup and provenance (live/synthetic)."
        );
        describe_counter!(
            "resolve_failures_total",
            "Resolutions that ended without an answer."
        );
        describe_histogram!("resolve_attempt_ms", "Source attempt latency in milliseconds.");
    });
}

fn status_label(status: AttemptStatus) -> &'static str {
    match status {
        AttemptStatus::Accepted => "accepted",
        AttemptStatus::Rejected => "rejected",
        AttemptStatus::Declined => "declined",
        AttemptStatus::TimedOut => "timed_out",
        AttemptStatus::Failed => "failed",
    }
}

pub struct Resolver<L: Lookup> {
    attempts: Vec<Arc<dyn SourceAttempt<L>>>,
    policy: Arc<dyn AcceptancePolicy<L::Payload>>,
    fallback: Option<Arc<dyn FallbackSynthesizer<L>>>,
}

pub struct ResolverBuilder<L: Lookup> {
    attempts: Vec<Arc<dyn SourceAttempt<L>>>,
    policy: Option<Arc<dyn AcceptancePolicy<L::Payload>>>,
    fallback: Option<Arc<dyn FallbackSynthesizer<L>>>,
}

impl<L: Lookup> Default for ResolverBuilder<L> {
    fn default() -> Self {
        Self {
            attempts: Vec::new(),
            policy: None,
            fallback: None,
        }
    }
}

impl<L: Lookup> ResolverBuilder<L> {
    pub fn attempt<A: SourceAttempt<L> + 'static>(mut self, attempt: A) -> Self {
        self.attempts.push(Arc::new(attempt));
        self
    }

    pub fn policy<P: AcceptancePolicy<L::Payload> + 'static>(mut self, policy: P) -> Self {
        self.policy = Some(Arc::new(policy));
        self
    }

    pub fn fallback<F: FallbackSynthesizer<L> + 'static>(mut self, fallback: F) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Sorts attempts by priority (stable for ties). Fails when there is
    /// nothing to try and nothing to fall back on.
    pub fn build(mut self) -> Result<Resolver<L>, ResolveError> {
        if self.attempts.is_empty() && self.fallback.is_none() {
            return Err(ResolveError::Configuration(format!(
                "{} resolver has no source attempts and no fallback",
                L::LABEL
            )));
        }
        self.attempts.sort_by_key(|a| a.priority());
        Ok(Resolver {
            attempts: self.attempts,
            policy: self
                .policy
                .unwrap_or_else(|| Arc::new(NonEmptySuccess) as Arc<dyn AcceptancePolicy<_>>),
            fallback: self.fallback,
        })
    }
}

impl<L: Lookup> Resolver<L> {
    pub fn builder() -> ResolverBuilder<L> {
        ResolverBuilder::default()
    }

    /// Attempt names in execution order.
    pub fn attempt_names(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.name()).collect()
    }

    pub async fn resolve(
        &self,
        request: &ResolveRequest<L>,
    ) -> Result<ResolvedAnswer<L::Payload>, ResolveError> {
        self.resolve_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn resolve_with_cancel(
        &self,
        request: &ResolveRequest<L>,
        cancel: &CancellationToken,
    ) -> Result<ResolvedAnswer<L::Payload>, ResolveError> {
        ensure_metrics_described();
        let mut trail: Vec<AttemptRecord> = Vec::with_capacity(self.attempts.len());

        for attempt in &self.attempts {
            if cancel.is_cancelled() {
                return Err(self.cancelled(trail.len()));
            }

            let name = attempt.name().to_string();
            let limit = attempt.timeout();
            let started = Instant::now();

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(trail.len())),
                r = tokio::time::timeout(limit, attempt.attempt(request.query(), request.context())) => r,
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            histogram!("resolve_attempt_ms", "lookup" => L::LABEL).record(elapsed_ms as f64);

            let result = outcome.unwrap_or(Err(AttemptError::Timeout {
                timeout_ms: limit.as_millis() as u64,
            }));

            let record = match result {
                Ok(AttemptResult::Declined { reason }) => {
                    debug!(target: "resolve", lookup = L::LABEL, attempt = %name, %reason, "attempt declined");
                    AttemptRecord {
                        attempt: name,
                        status: AttemptStatus::Declined,
                        elapsed_ms,
                        confidence: None,
                        detail: Some(reason),
                    }
                }
                Ok(result @ AttemptResult::Success { .. }) if !self.policy.accepts(&result) => {
                    let confidence = result.confidence();
                    let rejection = AttemptError::Rejected {
                        reason: self.policy.describe(),
                    };
                    info!(
                        target: "resolve",
                        lookup = L::LABEL,
                        attempt = %name,
                        confidence = ?confidence,
                        "attempt succeeded but failed acceptance; trying next"
                    );
                    AttemptRecord {
                        attempt: name,
                        status: AttemptStatus::Rejected,
                        elapsed_ms,
                        confidence,
                        detail: Some(rejection.to_string()),
                    }
                }
                Ok(AttemptResult::Success {
                    payload,
                    confidence,
                }) => {
                    trail.push(AttemptRecord {
                        attempt: name.clone(),
                        status: AttemptStatus::Accepted,
                        elapsed_ms,
                        confidence,
                        detail: None,
                    });
                    counter!(
                        "resolve_attempts_total",
                        "lookup" => L::LABEL,
                        "attempt" => name.clone(),
                        "outcome" => status_label(AttemptStatus::Accepted)
                    )
                    .increment(1);
                    counter!("resolve_answers_total", "lookup" => L::LABEL, "provenance" => "live")
                        .increment(1);
                    info!(target: "resolve", lookup = L::LABEL, attempt = %name, elapsed_ms, "accepted live result");
                    return Ok(ResolvedAnswer {
                        payload,
                        provenance: Provenance::Live(name),
                        resolved_at: Utc::now(),
                        caveat: None,
                        trail,
                    });
                }
                Err(e) => {
                    let status = match e {
                        AttemptError::Timeout { .. } => AttemptStatus::TimedOut,
                        _ => AttemptStatus::Failed,
                    };
                    warn!(
                        target: "resolve",
                        lookup = L::LABEL,
                        attempt = %name,
                        error = %e,
                        kind = e.kind(),
                        elapsed_ms,
                        "attempt failed; trying next"
                    );
                    AttemptRecord {
                        attempt: name,
                        status,
                        elapsed_ms,
                        confidence: None,
                        detail: Some(e.to_string()),
                    }
                }
            };

            counter!(
                "resolve_attempts_total",
                "lookup" => L::LABEL,
                "attempt" => record.attempt.clone(),
                "outcome" => status_label(record.status)
            )
            .increment(1);
            trail.push(record);
        }

        if cancel.is_cancelled() {
            return Err(self.cancelled(trail.len()));
        }

        match &self.fallback {
            Some(fallback) => {
                let synthesized =
                    fallback.synthesize(request.query(), request.context(), request.as_of());
                counter!("resolve_answers_total", "lookup" => L::LABEL, "provenance" => "synthetic")
                    .increment(1);
                info!(
                    target: "resolve",
                    lookup = L::LABEL,
                    tried = trail.len(),
                    "no live source accepted; returning synthetic estimate"
                );
                Ok(ResolvedAnswer {
                    payload: synthesized.payload,
                    provenance: Provenance::Synthetic,
                    resolved_at: Utc::now(),
                    caveat: Some(synthesized.caveat),
                    trail,
                })
            }
            None => {
                counter!("resolve_failures_total", "lookup" => L::LABEL).increment(1);
                warn!(target: "resolve", lookup = L::LABEL, tried = trail.len(), "all attempts exhausted");
                Err(ResolveError::NoResult { tried: trail.len() })
            }
        }
    }

    fn cancelled(&self, tried: usize) -> ResolveError {
        counter!("resolve_failures_total", "lookup" => L::LABEL).increment(1);
        info!(target: "resolve", lookup = L::LABEL, tried, "resolution cancelled by caller");
        ResolveError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::fallback::Synthesized;
    use chrono::NaiveDate;
    use std::time::Duration;

    struct Echo;
    impl Lookup for Echo {
        type Query = String;
        type Context = ();
        type Payload = String;
        const LABEL: &'static str = "echo";
    }

    struct Fixed(&'static str, u32, Option<&'static str>);

    #[async_trait::async_trait]
    impl SourceAttempt<Echo> for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn priority(&self) -> u32 {
            self.1
        }
        fn timeout(&self) -> Duration {
            Duration::from_millis(200)
        }
        async fn attempt(&self, _q: &String, _c: &()) -> Result<AttemptResult<String>, AttemptError> {
            Ok(match self.2 {
                Some(v) => AttemptResult::success(v.to_string()),
                None => AttemptResult::declined("no data"),
            })
        }
    }

    struct Upper;
    impl FallbackSynthesizer<Echo> for Upper {
        fn synthesize(&self, q: &String, _c: &(), _d: NaiveDate) -> Synthesized<String> {
            Synthesized {
                payload: q.to_uppercase(),
                caveat: "estimate".into(),
            }
        }
    }

    fn req(q: &str) -> ResolveRequest<Echo> {
        ResolveRequest::new(q.to_string(), (), NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())
    }

    #[test]
    fn build_without_attempts_or_fallback_is_configuration_error() {
        let err = Resolver::<Echo>::builder().build().err().unwrap();
        assert!(matches!(err, ResolveError::Configuration(_)));
    }

    #[test]
    fn attempts_are_ordered_by_priority() {
        let r = Resolver::<Echo>::builder()
            .attempt(Fixed("late", 5, None))
            .attempt(Fixed("early", 1, None))
            .attempt(Fixed("middle", 3, None))
            .build()
            .unwrap();
        assert_eq!(r.attempt_names(), vec!["early", "middle", "late"]);
    }

    #[tokio::test]
    async fn fallback_only_resolver_is_synthetic() {
        let r = Resolver::<Echo>::builder().fallback(Upper).build().unwrap();
        let ans = r.resolve(&req("wheat")).await.unwrap();
        assert_eq!(ans.payload, "WHEAT");
        assert_eq!(ans.provenance, Provenance::Synthetic);
        assert_eq!(ans.caveat.as_deref(), Some("estimate"));
        assert_eq!(ans.attempts_run(), 0);
    }

    #[tokio::test]
    async fn empty_payload_is_rejected_by_default_policy() {
        let r = Resolver::<Echo>::builder()
            .attempt(Fixed("blank", 0, Some("")))
            .attempt(Fixed("real", 1, Some("rice")))
            .build()
            .unwrap();
        let ans = r.resolve(&req("q")).await.unwrap();
        assert_eq!(ans.provenance.to_string(), "live:real");
        assert_eq!(ans.trail[0].status, AttemptStatus::Rejected);
    }
}
