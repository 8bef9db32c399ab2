//! Admin handlers for service requests.
//!
//! - `GET  /api/service-requests`                  list, `?status=` and `?search=`
//! - `POST /api/service-requests`                  raw create
//! - `GET  /api/service-requests/{id}`             detail
//! - `PUT  /api/service-requests/{id}`             partial update
//! - `GET  /api/service-requests/{id}/transitions` statuses reachable next

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use handyhub_core::{NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestPatch};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{json_body, map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TransitionsItem {
    id: String,
    status: RequestStatus,
    next_statuses: Vec<RequestStatus>,
    is_terminal: bool,
}

fn parse_status_filter(req_id: &str, raw: Option<&str>) -> Result<Option<RequestStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            ApiError::new(
                req_id,
                "validation_error",
                format!(
                    "status must be one of pending, accepted, in_progress, completed, cancelled; got '{s}'"
                ),
            )
        }),
    }
}

pub(super) async fn list_service_requests(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ServiceRequest>>>, ApiError> {
    let status = parse_status_filter(&req_id.0, query.status.as_deref())?;

    let mut requests = state
        .store
        .list(status)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    if let Some(term) = query.search.as_deref() {
        requests.retain(|r| r.matches_search(term));
    }

    Ok(Json(ApiResponse::new(requests, req_id.0)))
}

pub(super) async fn create_service_request(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<NewServiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceRequest>>), ApiError> {
    let new = json_body(&req_id.0, body)?;

    let request = state
        .store
        .create(new)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    tracing::info!(id = %request.id, "service request created by admin");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(request, req_id.0)),
    ))
}

pub(super) async fn get_service_request(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ServiceRequest>>, ApiError> {
    let request = state
        .store
        .get(&id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(request, req_id.0)))
}

pub(super) async fn update_service_request(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    body: Result<Json<ServiceRequestPatch>, JsonRejection>,
) -> Result<Json<ApiResponse<ServiceRequest>>, ApiError> {
    let patch = json_body(&req_id.0, body)?;
    let requested_status = patch.status;

    let request = state.store.update(&id, patch).await.map_err(|e| {
        tracing::warn!(id = %id, error = %e, "service request update rejected");
        map_store_error(req_id.0.clone(), &e)
    })?;

    if let Some(status) = requested_status {
        tracing::info!(id = %request.id, status = %status, "service request status updated");
    }
    Ok(Json(ApiResponse::new(request, req_id.0)))
}

pub(super) async fn list_transitions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransitionsItem>>, ApiError> {
    let request = state
        .store
        .get(&id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let item = TransitionsItem {
        id: request.id,
        status: request.status,
        next_statuses: request.status.next_statuses().to_vec(),
        is_terminal: request.status.is_terminal(),
    };
    Ok(Json(ApiResponse::new(item, req_id.0)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::Router;
    use tower::ServiceExt;

    use super::super::test_support::{admin_request, app_with, body_json, memory_state};

    fn new_request(client_name: &str, service_type: &str) -> serde_json::Value {
        serde_json::json!({
            "clientName": client_name,
            "phoneNumber": "555-0100",
            "serviceAddress": { "address": "1 Infinite Loop", "lat": 0.0, "lng": 0.0 },
            "serviceType": service_type,
            "description": "Kitchen drain is blocked",
            "serviceTier": "standard",
            "bookingType": "asap"
        })
    }

    async fn create(app: &Router, client_name: &str, service_type: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(admin_request(
                "POST",
                "/api/service-requests",
                Some(new_request(client_name, service_type)),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }

    async fn put_status(app: &Router, id: &str, status: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(admin_request(
                "PUT",
                &format!("/api/service-requests/{id}"),
                Some(serde_json::json!({ "status": status })),
            ))
            .await
            .expect("response");
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn ada_lovelace_is_created_and_accepted() {
        let app = app_with(memory_state());
        let created = create(&app, "Ada Lovelace", "Drain Cleaning").await;
        assert_eq!(created["id"], "1");
        assert_eq!(created["status"], "pending");

        let (status, json) = put_status(&app, "1", "accepted").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "accepted");
        assert_eq!(json["data"]["createdAt"], created["createdAt"]);
        assert_ne!(json["data"]["updatedAt"], created["updatedAt"]);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_filterable() {
        let app = app_with(memory_state());
        create(&app, "Ada Lovelace", "Drain Cleaning").await;
        create(&app, "Grace Hopper", "Pool Cleaning").await;
        put_status(&app, "1", "accepted").await;

        let response = app
            .clone()
            .oneshot(admin_request("GET", "/api/service-requests", None))
            .await
            .expect("response");
        let json = body_json(response).await;
        let ids: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .filter_map(|r| r["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["2", "1"]);

        let response = app
            .clone()
            .oneshot(admin_request(
                "GET",
                "/api/service-requests?status=accepted",
                None,
            ))
            .await
            .expect("response");
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["clientName"], "Ada Lovelace");

        let response = app
            .oneshot(admin_request(
                "GET",
                "/api/service-requests?search=POOL",
                None,
            ))
            .await
            .expect("response");
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["clientName"], "Grace Hopper");
    }

    #[tokio::test]
    async fn unknown_status_filter_is_rejected() {
        let response = app_with(memory_state())
            .oneshot(admin_request(
                "GET",
                "/api/service-requests?status=archived",
                None,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "validation_error");
    }

    #[tokio::test]
    async fn illegal_transition_is_conflict() {
        let app = app_with(memory_state());
        create(&app, "Ada Lovelace", "Drain Cleaning").await;

        let (status, json) = put_status(&app, "1", "completed").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "invalid_transition");
        assert_eq!(json["success"], false);

        let response = app
            .oneshot(admin_request("GET", "/api/service-requests/1", None))
            .await
            .expect("response");
        assert_eq!(body_json(response).await["data"]["status"], "pending");
    }

    #[tokio::test]
    async fn missing_request_is_not_found() {
        let app = app_with(memory_state());

        let (status, json) = put_status(&app, "nonexistent-id", "accepted").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "not_found");

        let response = app
            .oneshot(admin_request("GET", "/api/service-requests/42", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_patch_is_validation_error() {
        let app = app_with(memory_state());
        create(&app, "Ada Lovelace", "Drain Cleaning").await;

        let (status, json) = put_status(&app, "1", "done").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "validation_error");
    }

    #[tokio::test]
    async fn transitions_follow_the_lifecycle() {
        let app = app_with(memory_state());
        create(&app, "Ada Lovelace", "Drain Cleaning").await;

        let response = app
            .clone()
            .oneshot(admin_request(
                "GET",
                "/api/service-requests/1/transitions",
                None,
            ))
            .await
            .expect("response");
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "pending");
        assert_eq!(
            json["data"]["nextStatuses"],
            serde_json::json!(["accepted", "cancelled"])
        );
        assert_eq!(json["data"]["isTerminal"], false);

        put_status(&app, "1", "cancelled").await;
        let response = app
            .oneshot(admin_request(
                "GET",
                "/api/service-requests/1/transitions",
                None,
            ))
            .await
            .expect("response");
        let json = body_json(response).await;
        assert_eq!(json["data"]["nextStatuses"], serde_json::json!([]));
        assert_eq!(json["data"]["isTerminal"], true);
    }
}
