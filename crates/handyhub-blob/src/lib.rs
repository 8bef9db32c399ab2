//! Upload client for the public blob store that holds intake photos.

mod client;
mod error;

pub use client::{sanitize_filename, unique_pathname, BlobClient, BlobDescriptor};
pub use error::BlobError;
