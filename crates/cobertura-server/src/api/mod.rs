mod branches;
mod coverage;
mod zones;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use cobertura_core::{RepositoryUnavailable, StreetRangePolicy, ValidationError, ZoneMutationGuard};
use cobertura_store::ZoneBackend;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<ZoneBackend>,
    pub guard: ZoneMutationGuard,
    pub policy: StreetRangePolicy,
    /// Held across validate-then-save so two writers cannot both pass the
    /// per-branch checks.
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(backend: ZoneBackend, guard: ZoneMutationGuard, policy: StreetRangePolicy) -> Self {
        Self {
            backend: Arc::new(backend),
            guard,
            policy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    zone_source: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "repository_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// JSON body extractor whose rejections use the [`ApiError`] envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(map_json_rejection(request_id, &rejection)),
        }
    }
}

fn map_json_rejection(request_id: String, rejection: &JsonRejection) -> ApiError {
    tracing::warn!(request_id = %request_id, error = %rejection, "request body rejected");
    ApiError::new(request_id, "validation_error", rejection.body_text())
}

pub(super) fn map_repository_error(request_id: String, error: &RepositoryUnavailable) -> ApiError {
    tracing::error!(request_id = %request_id, error = %error, "zone repository call failed");
    ApiError::new(
        request_id,
        "repository_unavailable",
        "zone repository is unavailable",
    )
}

pub(super) fn map_validation_error(request_id: String, error: &ValidationError) -> ApiError {
    match error {
        ValidationError::Repository(e) => map_repository_error(request_id, e),
        ValidationError::DuplicateZoneName { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        ValidationError::UnknownZone { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        _ => {
            tracing::warn!(request_id = %request_id, error = %error, "zone rejected");
            ApiError::new(request_id, "validation_error", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/coverage/resolve", post(coverage::resolve_coverage))
        .route("/api/v1/branches", get(branches::list_branches))
        .route(
            "/api/v1/zones",
            get(zones::list_zones).post(zones::create_zone),
        )
        .route("/api/v1/zones/validate", post(zones::validate_zone))
        .route(
            "/api/v1/zones/{branch_id}/{name}",
            delete(zones::delete_zone),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            zone_source: state.backend.kind(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
