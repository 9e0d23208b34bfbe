//! Admin API handlers for known-entity registry management.
//!
//! Registry edits take effect on the next analysis; the report cache is
//! invalidated on every change because cached reports embed registry
//! matches.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::domain::{AppError, EntityKind, KnownEntity, ValidationError};

/// Request body for adding a registry entry
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddRegistryRequest {
    /// On-chain address (Base58)
    pub address: String,
    /// Human-readable label
    pub label: String,
    /// Entity kind: cex_hot_wallet, dex_program, bridge, mixer, or defi
    pub kind: String,
}

/// Response for registry mutations
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistryResponse {
    /// Success indicator
    pub success: bool,
    /// Descriptive message
    pub message: String,
}

/// Response for listing all registry entries
#[derive(Debug, Serialize, ToSchema)]
pub struct ListRegistryResponse {
    /// Total count of registered entities
    pub count: usize,
    /// All entries, sorted by address
    pub entries: Vec<KnownEntity>,
}

/// List all known-entity registry entries
///
/// GET /admin/registry
#[utoipa::path(
    get,
    path = "/admin/registry",
    tag = "admin",
    responses(
        (status = 200, description = "Registry contents", body = ListRegistryResponse)
    )
)]
pub async fn list_registry_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ListRegistryResponse> {
    let entries = state.registries.list();
    Json(ListRegistryResponse {
        count: entries.len(),
        entries,
    })
}

/// Add or replace a known-entity registry entry
///
/// POST /admin/registry
#[utoipa::path(
    post,
    path = "/admin/registry",
    tag = "admin",
    request_body = AddRegistryRequest,
    responses(
        (status = 200, description = "Entry added or replaced", body = RegistryResponse),
        (status = 400, description = "Invalid request", body = crate::domain::ErrorResponse)
    )
)]
pub async fn add_registry_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddRegistryRequest>,
) -> Result<Json<RegistryResponse>, AppError> {
    if payload.address.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::InvalidField {
            field: "address".to_string(),
            message: "Address is required".to_string(),
        }));
    }
    if payload.label.trim().is_empty() {
        return Err(AppError::Validation(ValidationError::InvalidField {
            field: "label".to_string(),
            message: "Label is required".to_string(),
        }));
    }
    let kind = EntityKind::from_str(&payload.kind).map_err(|message| {
        AppError::Validation(ValidationError::InvalidField {
            field: "kind".to_string(),
            message,
        })
    })?;

    let replaced = state
        .registries
        .upsert(KnownEntity::new(payload.address.clone(), payload.label, kind));
    state.report_service.invalidate_cache();

    warn!(
        address = %payload.address,
        kind = %kind,
        replaced,
        "Admin updated registry entry"
    );

    Ok(Json(RegistryResponse {
        success: true,
        message: format!(
            "Entry for {} {}",
            payload.address,
            if replaced { "replaced" } else { "added" }
        ),
    }))
}

/// Remove a known-entity registry entry
///
/// DELETE /admin/registry/{address}
#[utoipa::path(
    delete,
    path = "/admin/registry/{address}",
    tag = "admin",
    params(
        ("address" = String, Path, description = "Registered address to remove")
    ),
    responses(
        (status = 200, description = "Entry removed", body = RegistryResponse),
        (status = 404, description = "Address not in registry", body = crate::domain::ErrorResponse)
    )
)]
pub async fn remove_registry_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<RegistryResponse>, AppError> {
    let removed = state
        .registries
        .remove(&address)
        .ok_or_else(|| AppError::NotFound(format!("Registry entry for {address}")))?;
    state.report_service.invalidate_cache();

    warn!(
        address = %address,
        label = %removed.label,
        "Admin removed registry entry"
    );

    Ok(Json(RegistryResponse {
        success: true,
        message: format!("Entry for {address} removed"),
    }))
}
