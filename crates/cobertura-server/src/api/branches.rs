use axum::{extract::State, Extension, Json};
use cobertura_core::{Branch, BranchDirectory};

use crate::middleware::RequestId;

use super::{map_repository_error, ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn list_branches(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Branch>>>, ApiError> {
    let branches = state
        .backend
        .list_branches()
        .await
        .map_err(|e| map_repository_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: branches,
        meta: ResponseMeta::new(req_id.0),
    }))
}
