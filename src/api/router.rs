//! Router assembly with middleware and API documentation.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;

use super::admin::{add_registry_handler, list_registry_handler, remove_registry_handler};
use super::handlers::{
    ApiDoc, analyze_handler, health_check_handler, liveness_handler, readiness_handler,
    single_metric_handler,
};

/// Default request timeout. Analysis is CPU-bound and fast; the budget
/// covers the upstream indexer fetch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the application router.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route(
            "/analyze/{address}/metric/{metric}",
            get(single_metric_handler),
        )
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route(
            "/admin/registry",
            get(list_registry_handler).post(add_registry_handler),
        )
        .route(
            "/admin/registry/{address}",
            axum::routing::delete(remove_registry_handler),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
