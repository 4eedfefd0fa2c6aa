// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use kisan_mitra::config::AppConfig;

// Full in-process app (tool routes + /metrics), live price tiers kept offline.
fn build_app() -> Router {
    let mut cfg = AppConfig::default().finalize();
    cfg.prices.scrape_url = "http://127.0.0.1:9/".to_string();
    cfg.prices.scrape_timeout_ms = 500;
    cfg.profile_path = "context/farmer_profile.json".into();
    kisan_mitra::app(&cfg).expect("app() should build Router in tests")
}

async fn body_text(resp: axum::response::Response) -> String {
    // axum::body::to_bytes requires an explicit limit
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn metrics_endpoint_contains_resolution_series() {
    let app = build_app();

    let resp = app
        .clone()
        .oneshot(Request::get("/prices").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let text = body_text(resp).await;
    assert!(text.contains("resolve_attempts_total"), "metrics:\n{text}");
    assert!(text.contains("resolve_answers_total"));
    assert!(text.contains(r#"provenance="synthetic""#));
    assert!(text.contains("transcription_confidence_threshold"));
}
