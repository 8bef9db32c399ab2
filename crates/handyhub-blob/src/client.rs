use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::BlobError;

const DEFAULT_BASE_URL: &str = "https://blob.vercel-storage.com";
const API_VERSION: &str = "7";
const FALLBACK_FILENAME: &str = "upload";

/// What the blob service reports for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobDescriptor {
    pub url: String,
    pub download_url: String,
    pub pathname: String,
    pub content_type: String,
}

/// Client for the blob store's `PUT /<pathname>` upload endpoint.
pub struct BlobClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl BlobClient {
    /// # Errors
    ///
    /// Returns [`BlobError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, BlobError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`BlobError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(token: &str, timeout_secs: u64, base_url: &str) -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("handyhub/0.1 (photo-upload)")
            .build()?;

        // Exactly one trailing slash, so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| BlobError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Uploads `bytes` with public access under a collision-free pathname
    /// derived from `filename`.
    ///
    /// # Errors
    ///
    /// - [`BlobError::Http`] on network failure.
    /// - [`BlobError::Api`] if the service answers with a non-2xx status.
    /// - [`BlobError::Deserialize`] if the response is not a blob descriptor.
    pub async fn put(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobDescriptor, BlobError> {
        let pathname = unique_pathname(filename);
        let url = self.object_url(&pathname)?;
        let size = bytes.len();

        let mut request = self
            .client
            .put(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("x-api-version", API_VERSION)
            .header("x-access", "public")
            .body(bytes);
        if let Some(content_type) = content_type {
            request = request
                .header(CONTENT_TYPE, content_type)
                .header("x-content-type", content_type);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BlobError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let descriptor: BlobDescriptor =
            serde_json::from_str(&body).map_err(|e| BlobError::Deserialize {
                context: format!("put({pathname})"),
                source: e,
            })?;

        tracing::info!(pathname = %descriptor.pathname, size, "photo uploaded");
        Ok(descriptor)
    }

    fn object_url(&self, pathname: &str) -> Result<Url, BlobError> {
        self.base_url
            .join(pathname)
            .map_err(|e| BlobError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Reduces a client-supplied filename to a safe single path segment.
///
/// Directory components are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `-`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<unix-millis>-<uuid>-<sanitized filename>`.
#[must_use]
pub fn unique_pathname(filename: &str) -> String {
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4(),
        sanitize_filename(filename)
    )
}
