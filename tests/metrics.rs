// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use kiln_marketplace::config::AppConfig;

// Full in-process app with the built-in defaults (in-memory store, no network).
async fn build_app() -> Router {
    kiln_marketplace::app_with_config(AppConfig::default())
        .await
        .expect("app_with_config() should build Router in tests")
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn metrics_endpoint_contains_proximity_series() {
    let app = build_app().await;

    // Empty store: empty ranking, still 200.
    let req = Request::builder()
        .method("POST")
        .uri("/manufacturers/nearby")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"latitude": 28.7, "longitude": 77.1}"#))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("\"manufacturers\":[]"), "body: {body}");

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = body_string(resp).await;
    assert!(
        text.contains("proximity_queries_total"),
        "metrics body should expose described series:\n{text}"
    );
}

#[tokio::test]
async fn building_twice_reuses_the_recorder() {
    let a = build_app().await;
    let b = build_app().await;
    for app in [a, b] {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        assert_eq!(app.oneshot(req).await.unwrap().status(), StatusCode::OK);
    }
}
