// tests/resolve_orchestrator.rs
//
// Orchestrator behaviour with scripted attempts (no network):
// - priority order and short-circuit on the first accepted result
// - timeouts, errors, declines and low-confidence successes fall through
// - exhaustion with and without a fallback
// - caller cancellation skips the remaining tiers and the fallback

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use kisan_mitra::resolve::{
    AttemptError, AttemptResult, AttemptStatus, ConfidenceAbove, FallbackSynthesizer, Lookup,
    Provenance, ResolveError, ResolveRequest, Resolver, SourceAttempt, Synthesized,
};

struct Words;

impl Lookup for Words {
    type Query = String;
    type Context = String;
    type Payload = String;
    const LABEL: &'static str = "words";
}

#[derive(Clone)]
enum Script {
    Answer(&'static str, Option<f32>),
    Decline,
    Fail,
    Hang,
}

struct Scripted {
    name: &'static str,
    priority: u32,
    timeout: Duration,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(name: &'static str, priority: u32, script: Script) -> Self {
        Self {
            name,
            priority,
            timeout: Duration::from_millis(200),
            script,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SourceAttempt<Words> for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(
        &self,
        _query: &String,
        _context: &String,
    ) -> Result<AttemptResult<String>, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.clone() {
            Script::Answer(text, None) => Ok(AttemptResult::success(text.to_string())),
            Script::Answer(text, Some(c)) => Ok(AttemptResult::scored(text.to_string(), c)),
            Script::Decline => Ok(AttemptResult::declined("nothing here")),
            Script::Fail => Err(AttemptError::Transport("connection refused".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(AttemptResult::success("too late".to_string()))
            }
        }
    }
}

struct Estimate;

impl FallbackSynthesizer<Words> for Estimate {
    fn synthesize(&self, query: &String, context: &String, as_of: NaiveDate) -> Synthesized<String> {
        Synthesized {
            payload: format!("{query}@{context}@{as_of}"),
            caveat: "estimated".to_string(),
        }
    }
}

fn request() -> ResolveRequest<Words> {
    ResolveRequest::new(
        "wheat".to_string(),
        "Ludhiana".to_string(),
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
    )
}

#[tokio::test]
async fn first_accepted_result_short_circuits() {
    let a = Scripted::new("a", 0, Script::Decline);
    let b = Scripted::new("b", 1, Script::Answer("rice", None));
    let c = Scripted::new("c", 2, Script::Answer("never", None));
    let (ca, cb, cc) = (a.counter(), b.counter(), c.counter());

    let resolver = Resolver::builder()
        .attempt(c)
        .attempt(a)
        .attempt(b)
        .fallback(Estimate)
        .build()
        .unwrap();

    let ans = resolver.resolve(&request()).await.unwrap();
    assert_eq!(ans.payload, "rice");
    assert_eq!(ans.provenance, Provenance::Live("b".into()));
    assert!(ans.caveat.is_none());
    assert_eq!(ans.attempts_run(), 2);
    assert_eq!(
        (ca.load(Ordering::SeqCst), cb.load(Ordering::SeqCst), cc.load(Ordering::SeqCst)),
        (1, 1, 0)
    );
}

#[tokio::test]
async fn timeout_then_low_confidence_then_accept() {
    let a = Scripted::new("A", 0, Script::Hang).with_timeout(Duration::from_millis(50));
    let b = Scripted::new("B", 1, Script::Answer("kuch", Some(0.2)));
    let c = Scripted::new("C", 2, Script::Answer("mandi bhav", Some(0.6)));
    let d = Scripted::new("D", 3, Script::Answer("unused", Some(0.9)));
    let (ac, bc, cc, dc) = (a.counter(), b.counter(), c.counter(), d.counter());

    let resolver = Resolver::builder()
        .attempt(a)
        .attempt(b)
        .attempt(c)
        .attempt(d)
        .policy(ConfidenceAbove::new(0.3))
        .build()
        .unwrap();

    let ans = resolver.resolve(&request()).await.unwrap();
    assert_eq!(ans.payload, "mandi bhav");
    assert_eq!(ans.provenance.to_string(), "live:C");

    let statuses: Vec<AttemptStatus> = ans.trail.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            AttemptStatus::TimedOut,
            AttemptStatus::Rejected,
            AttemptStatus::Accepted
        ]
    );
    assert_eq!(ans.trail[1].confidence, Some(0.2));
    assert_eq!(
        (
            ac.load(Ordering::SeqCst),
            bc.load(Ordering::SeqCst),
            cc.load(Ordering::SeqCst),
            dc.load(Ordering::SeqCst)
        ),
        (1, 1, 1, 0)
    );
}

#[tokio::test]
async fn errors_are_recorded_and_skipped() {
    let resolver = Resolver::builder()
        .attempt(Scripted::new("broken", 0, Script::Fail))
        .attempt(Scripted::new("ok", 1, Script::Answer("gram", None)))
        .build()
        .unwrap();

    let ans = resolver.resolve(&request()).await.unwrap();
    assert_eq!(ans.payload, "gram");
    assert_eq!(ans.trail[0].status, AttemptStatus::Failed);
    assert!(ans.trail[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn exhaustion_without_fallback_is_no_result() {
    let resolver = Resolver::builder()
        .attempt(Scripted::new("a", 0, Script::Decline))
        .attempt(Scripted::new("b", 1, Script::Fail))
        .attempt(Scripted::new("c", 2, Script::Answer("", None)))
        .build()
        .unwrap();

    let err = resolver.resolve(&request()).await.unwrap_err();
    assert_eq!(err, ResolveError::NoResult { tried: 3 });
}

#[tokio::test]
async fn exhaustion_with_fallback_is_synthetic_and_deterministic() {
    let resolver = Resolver::builder()
        .attempt(Scripted::new("a", 0, Script::Decline))
        .fallback(Estimate)
        .build()
        .unwrap();

    let first = resolver.resolve(&request()).await.unwrap();
    let second = resolver.resolve(&request()).await.unwrap();
    assert_eq!(first.provenance, Provenance::Synthetic);
    assert_eq!(first.caveat.as_deref(), Some("estimated"));
    assert_eq!(first.payload, "wheat@Ludhiana@2025-04-15");
    assert_eq!(first.payload, second.payload);
}

#[tokio::test]
async fn cancellation_aborts_in_flight_attempt_and_skips_fallback() {
    let slow = Scripted::new("slow", 0, Script::Hang).with_timeout(Duration::from_secs(10));
    let next = Scripted::new("next", 1, Script::Answer("x", None));
    let next_calls = next.counter();

    let resolver = Resolver::builder()
        .attempt(slow)
        .attempt(next)
        .fallback(Estimate)
        .build()
        .unwrap();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = resolver
        .resolve_with_cancel(&request(), &token)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(next_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pre_cancelled_token_runs_nothing() {
    let a = Scripted::new("a", 0, Script::Answer("x", None));
    let calls = a.counter();
    let resolver = Resolver::builder().attempt(a).build().unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = resolver
        .resolve_with_cancel(&request(), &token)
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolver_is_shareable_across_tasks() {
    let resolver = Arc::new(
        Resolver::builder()
            .attempt(Scripted::new("a", 0, Script::Answer("ok", None)))
            .build()
            .unwrap(),
    );
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.resolve(&request()).await })
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap().payload, "ok");
    }
}
