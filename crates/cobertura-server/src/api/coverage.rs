use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use cobertura_core::{Coordinate, CoverageMatch, CoverageQuery, CoverageResolver};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_repository_error, ApiError, ApiJson, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ResolveRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub street_name: Option<String>,
    pub house_number: Option<u32>,
    pub branch_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CoverageItem {
    zone_id: Option<i64>,
    zone_name: String,
    branch_id: i64,
    matched_by_street_range: bool,
}

impl From<CoverageMatch> for CoverageItem {
    fn from(m: CoverageMatch) -> Self {
        Self {
            zone_id: m.zone.id,
            zone_name: m.zone.name,
            branch_id: m.zone.branch_id,
            matched_by_street_range: m.matched_by_street_range,
        }
    }
}

/// POST /api/v1/coverage/resolve
///
/// An empty list means the address is not covered.
pub(super) async fn resolve_coverage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<ResolveRequest>,
) -> Result<Json<ApiResponse<Vec<CoverageItem>>>, ApiError> {
    let point = Coordinate::try_new(body.latitude, body.longitude)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let query = CoverageQuery {
        point,
        street_name: body.street_name,
        house_number: body.house_number,
        branch_scope: body.branch_id,
    };

    let resolver = CoverageResolver::new(Arc::clone(&state.backend)).with_policy(state.policy);
    let matches = resolver
        .resolve(&query)
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: matches.into_iter().map(CoverageItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
