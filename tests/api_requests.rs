//! Integration tests for the HTTP API using in-process requests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use solana_privacy_scorer::api::create_router;
use solana_privacy_scorer::app::AppState;
use solana_privacy_scorer::engine::PrivacyReport;
use solana_privacy_scorer::infra::RegistryManager;
use solana_privacy_scorer::test_utils::MockTransactionSource;

const ADDRESS: &str = "HvwC9QSAzwEXkUkwqNNGhfNHoVqXJYfPvPZfQvJmHWcF";

fn create_test_state() -> Arc<AppState> {
    let source = Arc::new(MockTransactionSource::with_history(30));
    let registries = Arc::new(RegistryManager::with_defaults());
    Arc::new(AppState::new(source as _, registries))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_analyze_returns_full_report() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({"address": ADDRESS}).to_string(),
        ))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let report: PrivacyReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report.address, ADDRESS);
    assert_eq!(report.transaction_count, 30);
    assert!(report.advanced_privacy_score <= 100);
    assert!(!report.recommendations.is_empty());
}

#[tokio::test]
async fn test_analyze_rejects_malformed_address() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"address": "too-short"}).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_single_metric_endpoint() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .method("GET")
        .uri(format!("/analyze/{ADDRESS}/metric/entropy"))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("totalEntropy").is_some());
    assert!(body.get("amountEntropy").is_some());
}

#[tokio::test]
async fn test_single_metric_unknown_name() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .method("GET")
        .uri(format!("/analyze/{ADDRESS}/metric/nonsense"))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_propagates_indexer_failure() {
    let source = Arc::new(MockTransactionSource::failing());
    let registries = Arc::new(RegistryManager::with_defaults());
    let state = Arc::new(AppState::new(source as _, registries));
    let router = create_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({"address": ADDRESS}).to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_endpoints() {
    let router = create_router(create_test_state());

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_when_indexer_down() {
    let source = Arc::new(MockTransactionSource::failing());
    let registries = Arc::new(RegistryManager::with_defaults());
    let state = Arc::new(AppState::new(source as _, registries));
    let router = create_router(state);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_admin_registry_lifecycle() {
    let router = create_router(create_test_state());

    // 1. List seeded entries.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/registry")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let seeded = body["count"].as_u64().unwrap();
    assert!(seeded > 0);

    // 2. Add a new entry.
    let new_address = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/registry")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({
                        "address": new_address,
                        "label": "Test Exchange",
                        "kind": "cex_hot_wallet"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 3. The listing now includes it.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/registry")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"].as_u64().unwrap(), seeded + 1);

    // 4. Remove it again.
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/admin/registry/{new_address}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 5. Removing a missing entry is a 404.
    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/admin/registry/{new_address}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_registry_rejects_bad_kind() {
    let router = create_router(create_test_state());

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/registry")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({
                        "address": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                        "label": "Broken",
                        "kind": "castle"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
