//! `POST /api/upload?filename=`: stores one intake photo in the blob store.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Extension, Json,
};
use handyhub_blob::{BlobDescriptor, BlobError};
use handyhub_core::validate_photo_upload;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct UploadQuery {
    pub filename: Option<String>,
}

fn map_blob_error(request_id: String, error: &BlobError) -> ApiError {
    tracing::error!(error = %error, "photo upload failed");
    ApiError::new(request_id, "upstream_error", "Failed to upload file")
}

pub(super) async fn upload_photo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ApiResponse<BlobDescriptor>>, ApiError> {
    let rid = &req_id.0;

    let filename = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::new(rid, "validation_error", "Filename is required"))?;

    let Some(blob) = state.blob.as_ref() else {
        tracing::error!("BLOB_READ_WRITE_TOKEN not set; rejecting upload");
        return Err(ApiError::new(
            rid,
            "unconfigured",
            "Photo storage is not configured",
        ));
    };

    let bytes = body.map_err(|rejection| {
        tracing::warn!(error = %rejection, "upload body rejected");
        ApiError::new(rid, "validation_error", "Images must be under 5MB")
    })?;

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    validate_photo_upload(bytes.len(), content_type).map_err(|field| {
        ApiError::new(rid, "validation_error", field.message.clone()).with_details(vec![field])
    })?;

    let descriptor = blob
        .put(filename, bytes.to_vec(), content_type)
        .await
        .map_err(|e| map_blob_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(descriptor, req_id.0)))
}
