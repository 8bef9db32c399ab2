//! `POST /api/intake`: the public request form.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use handyhub_core::{DistanceEstimate, IntakeForm, ServiceAddress, ServiceRequest};

use crate::middleware::RequestId;

use super::{json_body, map_store_error, ApiError, ApiResponse, AppState};

/// Best-effort travel estimate from the base location. Any failure is logged
/// and the request is stored without one.
async fn estimate_travel(state: &AppState, address: &ServiceAddress) -> Option<DistanceEstimate> {
    let maps = state.maps.as_ref()?;
    match maps.estimate(&state.catalog.base_location, address).await {
        Ok(estimate) => estimate,
        Err(e) => {
            tracing::warn!(error = %e, "distance lookup failed; storing request without estimate");
            None
        }
    }
}

pub(super) async fn submit_intake(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<IntakeForm>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceRequest>>), ApiError> {
    let rid = &req_id.0;
    let form = json_body(rid, body)?;

    let validated = form.validate(&state.catalog).map_err(|errors| {
        ApiError::new(
            rid,
            "validation_error",
            "Please correct the highlighted fields",
        )
        .with_details(errors.0)
    })?;

    let estimate = estimate_travel(&state, validated.address()).await;
    let request = state
        .store
        .create(validated.into_new_request(estimate.as_ref()))
        .await
        .map_err(|e| map_store_error(rid.clone(), &e))?;

    tracing::info!(
        id = %request.id,
        service_type = %request.service_type,
        tier = %request.service_tier,
        has_estimate = estimate.is_some(),
        "service request submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(request, req_id.0)),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use handyhub_maps::DistanceMatrixClient;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{app_with, body_json, json_request, memory_state};
    use super::super::AppState;

    fn form() -> serde_json::Value {
        serde_json::json!({
            "clientName": "Ada Lovelace",
            "phoneNumber": "555-010-0100",
            "serviceAddress": "1 Infinite Loop, Cupertino",
            "serviceLat": 40.7484,
            "serviceLng": -73.9857,
            "serviceId": "drain_cleaning",
            "description": "Kitchen drain is blocked again",
            "serviceTier": "standard",
            "bookingType": "asap"
        })
    }

    async fn state_with_maps(server: &MockServer) -> AppState {
        let client = DistanceMatrixClient::with_base_url("test-key", 5, &server.uri())
            .expect("maps client");
        AppState {
            maps: Some(Arc::new(client)),
            ..memory_state()
        }
    }

    #[tokio::test]
    async fn valid_form_creates_pending_request() {
        let response = app_with(memory_state())
            .oneshot(json_request("POST", "/api/intake", &form()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "1");
        assert_eq!(json["data"]["status"], "pending");
        assert_eq!(json["data"]["serviceType"], "Drain Cleaning");
        assert_eq!(json["data"]["serviceAddress"]["lat"], 40.7484);
        assert_eq!(json["data"]["createdAt"], json["data"]["updatedAt"]);
        assert!(json["data"].get("estimatedDistance").is_none());
    }

    #[tokio::test]
    async fn invalid_form_lists_every_field() {
        let mut body = form();
        body["clientName"] = "A".into();
        body["description"] = "short".into();
        body["bookingType"] = "scheduled".into();

        let response = app_with(memory_state())
            .oneshot(json_request("POST", "/api/intake", &body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "validation_error");
        let fields: Vec<&str> = json["details"]
            .as_array()
            .expect("details")
            .iter()
            .filter_map(|d| d["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["clientName", "description", "scheduledDateTime"]);
    }

    #[tokio::test]
    async fn unknown_tier_is_a_validation_error() {
        let mut body = form();
        body["serviceTier"] = "platinum".into();

        let response = app_with(memory_state())
            .oneshot(json_request("POST", "/api/intake", &body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "validation_error");
    }

    #[tokio::test]
    async fn missing_service_id_is_custom_task() {
        let mut body = form();
        body.as_object_mut().expect("object").remove("serviceId");

        let response = app_with(memory_state())
            .oneshot(json_request("POST", "/api/intake", &body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["data"]["serviceType"], "Custom Task");
    }

    #[tokio::test]
    async fn estimate_is_attached_when_maps_answers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "rows": [{ "elements": [{
                    "status": "OK",
                    "distance": { "text": "10.0 mi", "value": 16093.4 },
                    "duration": { "text": "30 mins", "value": 1800 }
                }]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app_with(state_with_maps(&server).await)
            .oneshot(json_request("POST", "/api/intake", &form()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let distance = json["data"]["estimatedDistance"].as_f64().expect("distance");
        assert!((distance - 10.0).abs() < 1e-9);
        assert_eq!(json["data"]["estimatedTravelTime"], 30.0);
    }

    #[tokio::test]
    async fn maps_failure_still_creates_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = app_with(state_with_maps(&server).await)
            .oneshot(json_request("POST", "/api/intake", &form()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert!(json["data"].get("estimatedDistance").is_none());
    }
}
