use async_trait::async_trait;
use handyhub_core::requests::stamp_now;
use handyhub_core::{
    NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestPatch, StoreBackend,
};
use sqlx::PgPool;

use super::{RequestStore, StoreError};
use crate::service_requests::{
    get_service_request, insert_service_request, list_service_requests, update_service_request,
};

/// Store backed by the `service_requests` Postgres table.
///
/// Updates read the row, apply the patch in Rust and write it back only if the
/// status is still the one the transition was checked against. Other fields
/// are last-write-wins.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Error for an update whose guarded write matched no row: the row is gone, or
/// another writer moved its status first.
fn stale_write_error(
    id: &str,
    current: Option<RequestStatus>,
    requested: RequestStatus,
) -> StoreError {
    match current {
        None => StoreError::NotFound(id.to_string()),
        Some(from) => StoreError::InvalidTransition {
            from,
            to: requested,
        },
    }
}

/// Ids are `BIGSERIAL`; anything that is not an integer cannot exist.
fn parse_id(id: &str) -> Result<i64, StoreError> {
    id.parse::<i64>()
        .map_err(|_| StoreError::NotFound(id.to_string()))
}

#[async_trait]
impl RequestStore for PgStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn create(&self, new: NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        let row = insert_service_request(&self.pool, &new, stamp_now()).await?;
        Ok(ServiceRequest::try_from(row)?)
    }

    async fn update(
        &self,
        id: &str,
        patch: ServiceRequestPatch,
    ) -> Result<ServiceRequest, StoreError> {
        let row_id = parse_id(id)?;
        let row = get_service_request(&self.pool, row_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut request = ServiceRequest::try_from(row)?;
        let read_status = request.status;
        request.apply_patch(patch, stamp_now())?;

        if !update_service_request(&self.pool, row_id, &request, read_status).await? {
            let current = get_service_request(&self.pool, row_id)
                .await?
                .map(ServiceRequest::try_from)
                .transpose()?;
            tracing::warn!(id, "service request changed during update");
            return Err(stale_write_error(
                id,
                current.map(|r| r.status),
                request.status,
            ));
        }
        Ok(request)
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let rows = list_service_requests(&self.pool, status.map(RequestStatus::as_str)).await?;
        rows.into_iter()
            .map(|row| ServiceRequest::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn get(&self, id: &str) -> Result<ServiceRequest, StoreError> {
        let row = get_service_request(&self.pool, parse_id(id)?)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(ServiceRequest::try_from(row)?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
