//! The request store capability and its interchangeable adapters.
//!
//! Every adapter assigns ids, stamps timestamps, enforces the status
//! transition table and returns lists newest first. Callers hold an
//! `Arc<dyn RequestStore>` built once by [`open_store`].

mod json_file;
mod memory;
mod postgres;

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use handyhub_core::{
    AppConfig, CoreError, NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestPatch,
    StoreBackend,
};
use thiserror::Error;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::{DbError, PoolConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("service request '{0}' not found")]
    NotFound(String),

    #[error("cannot move service request from {from} to {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("data file error: {0}")]
    File(#[from] std::io::Error),

    #[error("data file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    /// `true` for failures of the backing service rather than of the request.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::File(_) | StoreError::Corrupt(_)
        )
    }
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidTransition { from, to } => StoreError::InvalidTransition { from, to },
            other => StoreError::Database(DbError::InvalidRow(other)),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(DbError::Sqlx(e))
    }
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Stores a new request in `pending` status and returns it with its id.
    async fn create(&self, new: NewServiceRequest) -> Result<ServiceRequest, StoreError>;

    /// Merges `patch` into the request with `id` and returns the result.
    async fn update(
        &self,
        id: &str,
        patch: ServiceRequestPatch,
    ) -> Result<ServiceRequest, StoreError>;

    /// All requests, or only those in `status`, newest first.
    async fn list(&self, status: Option<RequestStatus>)
        -> Result<Vec<ServiceRequest>, StoreError>;

    async fn get(&self, id: &str) -> Result<ServiceRequest, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Builds the adapter named by `config.store_backend`.
///
/// The Postgres adapter connects and applies pending migrations before it is
/// returned.
///
/// # Errors
///
/// Returns [`StoreError::Unconfigured`] when the Postgres backend is selected
/// without `DATABASE_URL`, or an upstream error if the backend cannot be opened.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn RequestStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or(StoreError::Unconfigured("DATABASE_URL"))?;
            let pool = crate::connect_pool(url, PoolConfig::from_app_config(config)).await?;
            let applied = crate::run_migrations(&pool)
                .await
                .map_err(DbError::from)?;
            tracing::info!(applied, "database migrations up to date");
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::JsonFile => Ok(Arc::new(JsonFileStore::open(&config.data_path).await?)),
    }
}

/// Ordering used by the in-process adapters: `created_at` descending, then the
/// most recently assigned id first.
pub(crate) fn newest_first(a: &ServiceRequest, b: &ServiceRequest) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| id_rank(&b.id).cmp(&id_rank(&a.id)))
}

fn id_rank(id: &str) -> u64 {
    id.parse().unwrap_or(0)
}
