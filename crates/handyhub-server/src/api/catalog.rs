use axum::{extract::State, Extension, Json};
use handyhub_core::Catalog;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

/// GET /api/catalog: service categories and the base location.
pub(super) async fn get_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Catalog>> {
    Json(ApiResponse::new(state.catalog.as_ref().clone(), req_id.0))
}
