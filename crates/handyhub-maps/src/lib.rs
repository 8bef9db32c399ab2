//! Travel estimates from the business base location to a service address.

mod client;
mod error;
mod types;

pub use client::DistanceMatrixClient;
pub use error::MapsError;
