use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The blob service answered with a non-2xx status.
    #[error("blob service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
