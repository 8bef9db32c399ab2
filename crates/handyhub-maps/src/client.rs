//! HTTP client for the distance-matrix JSON API.
//!
//! One origin, one destination, imperial units. Anything short of a fully
//! `OK` response is reported as "no estimate" rather than as an error, so
//! callers can treat the lookup as best-effort.

use std::time::Duration;

use handyhub_core::{BaseLocation, DistanceEstimate, ServiceAddress};
use reqwest::{Client, Url};

use crate::error::MapsError;
use crate::types::MatrixResponse;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Client for the distance-matrix API.
///
/// Use [`DistanceMatrixClient::new`] for production or
/// [`DistanceMatrixClient::with_base_url`] to point at a mock server in tests.
pub struct DistanceMatrixClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl DistanceMatrixClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, MapsError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`MapsError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`MapsError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MapsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("handyhub/0.1 (distance-estimate)")
            .build()?;

        let base_url = Url::parse(base_url).map_err(|e| MapsError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Estimates driving distance and time from `origin` to `destination`.
    ///
    /// Returns `Ok(None)` without calling out when the destination has no
    /// resolved coordinates, and `Ok(None)` when the API answers with any
    /// status other than `OK` for the request or its single element.
    ///
    /// # Errors
    ///
    /// - [`MapsError::Http`] on network failure or a non-2xx HTTP status.
    /// - [`MapsError::Deserialize`] if the body is not a distance-matrix response.
    pub async fn estimate(
        &self,
        origin: &BaseLocation,
        destination: &ServiceAddress,
    ) -> Result<Option<DistanceEstimate>, MapsError> {
        if !destination.is_resolved() {
            tracing::debug!("destination has no coordinates, skipping distance lookup");
            return Ok(None);
        }

        let url = self.build_url(
            &format_point(origin.lat, origin.lng),
            &format_point(destination.lat, destination.lng),
        );
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let parsed: MatrixResponse =
            serde_json::from_str(&body).map_err(|e| MapsError::Deserialize {
                context: "distance matrix response".to_string(),
                source: e,
            })?;

        Ok(into_estimate(parsed))
    }

    /// Builds the request URL with percent-encoded query parameters.
    fn build_url(&self, origins: &str, destinations: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("origins", origins)
            .append_pair("destinations", destinations)
            .append_pair("units", "imperial")
            .append_pair("key", &self.api_key);
        url
    }
}

fn format_point(lat: f64, lng: f64) -> String {
    format!("{lat},{lng}")
}

fn into_estimate(response: MatrixResponse) -> Option<DistanceEstimate> {
    if response.status != "OK" {
        tracing::warn!(
            status = %response.status,
            message = response.error_message.as_deref().unwrap_or(""),
            "distance matrix returned non-OK status"
        );
        return None;
    }

    let element = response.rows.into_iter().next()?.elements.into_iter().next()?;
    if element.status != "OK" {
        tracing::warn!(status = %element.status, "distance matrix element not OK");
        return None;
    }

    let distance = element.distance?;
    let duration = element.duration?;
    Some(DistanceEstimate::from_meters_and_seconds(
        distance.value,
        duration.value,
        distance.text,
        duration.text,
    ))
}
