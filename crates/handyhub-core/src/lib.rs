pub mod app_config;
pub mod catalog;
pub mod config;
pub mod distance;
pub mod intake;
pub mod requests;

pub use app_config::{AppConfig, Environment, StoreBackend};
pub use catalog::{load_catalog, BaseLocation, Catalog, ServiceCategory, ServiceOffering};
pub use config::{load_app_config, load_app_config_from_env};
pub use distance::{format_distance, format_duration, DistanceEstimate};
pub use intake::{validate_photo_upload, FieldError, IntakeErrors, IntakeForm, ValidatedIntake};
pub use requests::{
    BookingType, CoreError, NewServiceRequest, RequestStatus, ServiceAddress, ServiceRequest,
    ServiceRequestPatch, ServiceTier,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
