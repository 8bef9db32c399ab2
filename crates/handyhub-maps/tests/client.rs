//! Integration tests for `DistanceMatrixClient` using wiremock HTTP mocks.

use handyhub_core::{BaseLocation, Catalog, ServiceAddress};
use handyhub_maps::{DistanceMatrixClient, MapsError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> DistanceMatrixClient {
    DistanceMatrixClient::with_base_url("test-key", 5, &format!("{}/json", server.uri()))
        .expect("client construction should not fail")
}

fn origin() -> BaseLocation {
    Catalog::builtin().base_location
}

fn destination() -> ServiceAddress {
    ServiceAddress {
        address: "350 5th Ave, New York, NY".to_string(),
        lat: 40.7484,
        lng: -73.9857,
    }
}

#[tokio::test]
async fn estimate_returns_converted_distance() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "OK",
        "origin_addresses": ["123 Main St"],
        "destination_addresses": ["350 5th Ave"],
        "rows": [{ "elements": [{
            "status": "OK",
            "distance": { "text": "3.2 mi", "value": 5149.888 },
            "duration": { "text": "18 mins", "value": 1080 }
        }]}]
    });

    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("origins", "40.7128,-74.006"))
        .and(query_param("destinations", "40.7484,-73.9857"))
        .and(query_param("units", "imperial"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let estimate = test_client(&server)
        .estimate(&origin(), &destination())
        .await
        .expect("request should succeed")
        .expect("estimate should be present");

    assert!((estimate.distance - 3.2).abs() < 1e-6);
    assert!((estimate.duration - 18.0).abs() < 1e-9);
    assert_eq!(estimate.distance_text, "3.2 mi");
    assert_eq!(estimate.duration_text, "18 mins");
}

#[tokio::test]
async fn estimate_is_none_when_api_denies_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "rows": []
        })))
        .mount(&server)
        .await;

    let estimate = test_client(&server)
        .estimate(&origin(), &destination())
        .await
        .expect("request should succeed");
    assert!(estimate.is_none());
}

#[tokio::test]
async fn estimate_is_none_when_element_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "rows": [{ "elements": [{ "status": "NOT_FOUND" }] }]
        })))
        .mount(&server)
        .await;

    let estimate = test_client(&server)
        .estimate(&origin(), &destination())
        .await
        .expect("request should succeed");
    assert!(estimate.is_none());
}

#[tokio::test]
async fn unresolved_destination_skips_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let unresolved = ServiceAddress {
        address: "typed by hand".to_string(),
        lat: 0.0,
        lng: 0.0,
    };
    let estimate = test_client(&server)
        .estimate(&origin(), &unresolved)
        .await
        .expect("no request is made");
    assert!(estimate.is_none());
}

#[tokio::test]
async fn server_error_surfaces_as_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .estimate(&origin(), &destination())
        .await
        .unwrap_err();
    assert!(matches!(err, MapsError::Http(_)));
}

#[tokio::test]
async fn malformed_body_surfaces_as_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .estimate(&origin(), &destination())
        .await
        .unwrap_err();
    assert!(matches!(err, MapsError::Deserialize { .. }));
}
