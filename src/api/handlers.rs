//! HTTP request handlers with OpenAPI documentation.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use utoipa::OpenApi;
use validator::Validate;

use crate::app::AppState;
use crate::domain::{
    AnalyzeRequest, AppError, ErrorDetail, ErrorResponse, ExternalServiceError, HealthResponse,
    HealthStatus, MetricKind, ValidationError,
};
use crate::engine::PrivacyReport;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solana Privacy Scorer API",
        version = "0.1.0",
        description = "Privacy scoring for Solana wallets: entropy, k-anonymity, graph, temporal, and attack-surface analysis over indexed transaction history",
        license(
            name = "MIT"
        )
    ),
    paths(
        analyze_handler,
        single_metric_handler,
        health_check_handler,
        liveness_handler,
        readiness_handler,
        crate::api::admin::list_registry_handler,
        crate::api::admin::add_registry_handler,
        crate::api::admin::remove_registry_handler,
    ),
    components(
        schemas(
            AnalyzeRequest,
            PrivacyReport,
            MetricKind,
            crate::domain::TransactionRecord,
            crate::domain::KnownEntity,
            crate::domain::EntityKind,
            crate::domain::RiskLevel,
            crate::domain::RiskTier,
            crate::domain::Grade,
            crate::domain::Recommendation,
            crate::domain::RecommendationPriority,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
            ErrorDetail,
            crate::api::admin::AddRegistryRequest,
            crate::api::admin::RegistryResponse,
            crate::api::admin::ListRegistryResponse,
        )
    ),
    tags(
        (name = "analysis", description = "Privacy analysis endpoints"),
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Known-entity registry management")
    )
)]
pub struct ApiDoc;

/// Generate a full privacy report for a wallet
///
/// Fetches the wallet's transaction history from the indexer, runs every
/// analyzer, and returns the aggregated report. Reports are cached per
/// address and reused while the transaction snapshot is unchanged; set
/// `refresh: true` to force recomputation.
#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analysis",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Privacy report generated", body = PrivacyReport),
        (status = 400, description = "Invalid address", body = ErrorResponse),
        (status = 502, description = "Indexer unavailable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<PrivacyReport>, AppError> {
    payload.validate().map_err(|e| {
        AppError::Validation(ValidationError::InvalidField {
            field: "address".to_string(),
            message: e.to_string(),
        })
    })?;

    let report = state
        .report_service
        .analyze(&payload.address, payload.refresh)
        .await?;
    Ok(Json(report))
}

/// Run a single analyzer for a wallet
///
/// Narrow entry point for callers that need one metric without paying for
/// the full report. The metric name matches the report field names
/// (`entropy`, `k_anonymity`, `graph`, `temporal`, `mutual_information`,
/// `differential_privacy`, `clustering`, `mixer`, `cross_chain`, `dust`,
/// `exchange`).
#[utoipa::path(
    get,
    path = "/analyze/{address}/metric/{metric}",
    tag = "analysis",
    params(
        ("address" = String, Path, description = "Wallet address (Base58)"),
        ("metric" = String, Path, description = "Analyzer name")
    ),
    responses(
        (status = 200, description = "Single analyzer result"),
        (status = 400, description = "Invalid address or unknown metric", body = ErrorResponse),
        (status = 502, description = "Indexer unavailable", body = ErrorResponse)
    )
)]
pub async fn single_metric_handler(
    State(state): State<Arc<AppState>>,
    Path((address, metric)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = MetricKind::from_str(&metric).map_err(|_| {
        AppError::Validation(ValidationError::InvalidField {
            field: "metric".to_string(),
            message: format!("Unknown metric '{metric}'"),
        })
    })?;

    let value = state.report_service.single_metric(&address, kind).await?;
    Ok(Json(value))
}

/// Detailed health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let indexer = match state.transaction_source.health_check().await {
        Ok(()) => HealthStatus::Healthy,
        Err(_) => HealthStatus::Unhealthy,
    };
    Json(HealthResponse::new(indexer))
}

/// Kubernetes liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses(
        (status = 200, description = "Application is alive")
    )
)]
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Application is ready to serve traffic"),
        (status = 503, description = "Application is not ready")
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.transaction_source.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_type, message) = match &self {
            AppError::ExternalService(ext_err) => match ext_err {
                ExternalServiceError::Unavailable(_) => (
                    StatusCode::BAD_GATEWAY,
                    "external_service_error",
                    self.to_string(),
                ),
                ExternalServiceError::Timeout(_) => {
                    (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string())
                }
                ExternalServiceError::Configuration(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    self.to_string(),
                ),
                _ => (
                    StatusCode::BAD_GATEWAY,
                    "external_service_error",
                    self.to_string(),
                ),
            },
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                self.to_string(),
            ),
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                self.to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                self.to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                self.to_string(),
            ),
            AppError::NotSupported(_) => (
                StatusCode::NOT_IMPLEMENTED,
                "not_supported",
                self.to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error_type = %error_type, message = %message, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}
