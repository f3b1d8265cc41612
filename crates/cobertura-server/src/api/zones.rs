//! Zone listing and mutation handlers. Every write goes through
//! [`ZoneMutationGuard`](cobertura_core::ZoneMutationGuard) first.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cobertura_core::{CoverageZone, ZoneDraft, ZoneRepository, ZoneStore};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_repository_error, map_validation_error, ApiError, ApiJson, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ZoneQuery {
    pub branch_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedZone {
    branch_id: i64,
    name: String,
    deleted: bool,
}

/// GET /api/v1/zones: active zones, optionally of one branch.
pub(super) async fn list_zones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ZoneQuery>,
) -> Result<Json<ApiResponse<Vec<CoverageZone>>>, ApiError> {
    let zones = state
        .backend
        .list_zones(query.branch_id)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: zones,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/zones/validate is a dry run. Nothing is stored.
pub(super) async fn validate_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(draft): ApiJson<ZoneDraft>,
) -> Result<Json<ApiResponse<CoverageZone>>, ApiError> {
    let zone = state
        .guard
        .validate_against(&draft, state.backend.as_ref())
        .await
        .map_err(|e| map_validation_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: zone,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/zones validates, then inserts or replaces.
pub(super) async fn create_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(draft): ApiJson<ZoneDraft>,
) -> Result<(StatusCode, Json<ApiResponse<CoverageZone>>), ApiError> {
    let _write = state.write_lock.lock().await;

    let zone = state
        .guard
        .validate_against(&draft, state.backend.as_ref())
        .await
        .map_err(|e| map_validation_error(req_id.0.clone(), &e))?;

    let saved = state
        .backend
        .save_zone(zone)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    tracing::info!(
        request_id = %req_id.0,
        branch_id = saved.branch_id,
        zone = %saved.name,
        zone_id = ?saved.id,
        "zone saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: saved,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// DELETE /api/v1/zones/{branch_id}/{name}
pub(super) async fn delete_zone(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((branch_id, name)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<DeletedZone>>, ApiError> {
    let _write = state.write_lock.lock().await;

    let deleted = state
        .backend
        .delete_zone(branch_id, &name)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    if !deleted {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("branch {branch_id} has no zone named '{name}'"),
        ));
    }

    tracing::info!(request_id = %req_id.0, branch_id, zone = %name, "zone deleted");

    Ok(Json(ApiResponse {
        data: DeletedZone {
            branch_id,
            name,
            deleted: true,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
