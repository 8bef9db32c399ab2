mod catalog;
mod intake;
mod service_requests;
mod upload;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use handyhub_blob::BlobClient;
use handyhub_core::{Catalog, FieldError};
use handyhub_db::{RequestStore, StoreError};
use handyhub_maps::DistanceMatrixClient;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin_auth, AuthState, RateLimitState, RequestId,
};

/// Separate budgets for the public write routes and the admin routes. Public
/// traffic never draws from the admin budget.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub public: RateLimitState,
    pub admin: RateLimitState,
}

/// Slightly above the per-photo cap so oversized photos reach the handler and
/// get a field error instead of a bare 413.
const UPLOAD_BODY_LIMIT: usize = handyhub_core::intake::MAX_PHOTO_BYTES + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub catalog: Arc<Catalog>,
    /// `None` when no maps key is configured; intake then skips estimates.
    pub maps: Option<Arc<DistanceMatrixClient>>,
    /// `None` when no blob token is configured; uploads answer 503.
    pub blob: Option<Arc<BlobClient>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: String,
    maps: &'static str,
    blob: &'static str,
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
            success: false,
            error: message.into(),
            code: code.into(),
            details: Vec::new(),
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = details;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "validation_error" => StatusCode::BAD_REQUEST,
            "invalid_transition" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "unconfigured" => StatusCode::SERVICE_UNAVAILABLE,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Translates a store failure into the client-facing error. Backend details are
/// logged here and never sent to the client.
pub(super) fn map_store_error(request_id: String, error: &StoreError) -> ApiError {
    match error {
        StoreError::NotFound(_) => {
            ApiError::new(request_id, "not_found", "service request not found")
        }
        StoreError::InvalidTransition { .. } => {
            ApiError::new(request_id, "invalid_transition", error.to_string())
        }
        StoreError::Unconfigured(var) => {
            tracing::error!(var = %var, "request store is not configured");
            ApiError::new(
                request_id,
                "unconfigured",
                "Database not configured. Please contact support.",
            )
        }
        e if e.is_upstream() => {
            tracing::error!(error = %e, "request store failed");
            ApiError::new(
                request_id,
                "upstream_error",
                "Database unavailable. Please try again later.",
            )
        }
        e => {
            tracing::error!(error = %e, "unexpected request store error");
            ApiError::new(request_id, "internal_error", "internal error")
        }
    }
}

/// Unwraps a JSON body, turning axum's rejection into a `validation_error`.
pub(super) fn json_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(request_id, "validation_error", rejection.body_text()))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_write_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/intake", post(intake::submit_intake))
        .route(
            "/api/upload",
            post(upload::upload_photo).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/service-requests",
            get(service_requests::list_service_requests)
                .post(service_requests::create_service_request),
        )
        .route(
            "/api/service-requests/{id}",
            get(service_requests::get_service_request)
                .put(service_requests::update_service_request),
        )
        .route(
            "/api/service-requests/{id}/transitions",
            get(service_requests::list_transitions),
        )
        // Auth runs first so rejected credentials never consume the budget.
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_admin_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limits: RateLimits) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/catalog", get(catalog::get_catalog));

    Router::new()
        .merge(public_routes)
        .merge(public_write_router(rate_limits.public))
        .merge(admin_router(auth, rate_limits.admin))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

fn configured<T>(client: Option<&T>) -> &'static str {
    if client.is_some() {
        "configured"
    } else {
        "unconfigured"
    }
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let store = state.store.backend().to_string();
    let maps = configured(state.maps.as_deref());
    let blob = configured(state.blob.as_deref());

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    store,
                    maps,
                    blob,
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: request store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        store,
                        maps,
                        blob,
                    },
                    req_id.0,
                )),
            )
        }
    }
}

pub fn default_rate_limits() -> RateLimits {
    RateLimits {
        public: RateLimitState::new(120, Duration::from_secs(60)),
        admin: RateLimitState::new(120, Duration::from_secs(60)),
    }
}
