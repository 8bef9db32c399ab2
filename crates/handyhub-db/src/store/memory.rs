use async_trait::async_trait;
use handyhub_core::requests::stamp_now;
use handyhub_core::{
    NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestPatch, StoreBackend,
};
use tokio::sync::RwLock;

use super::{newest_first, RequestStore, StoreError};

#[derive(Debug)]
struct MemoryState {
    next_id: u64,
    requests: Vec<ServiceRequest>,
}

/// Process-lifetime store. Ids count up from `"1"`.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                requests: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn create(&self, new: NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id.to_string();
        state.next_id += 1;

        let request = ServiceRequest::from_new(id, new, stamp_now());
        state.requests.push(request.clone());
        drop(state);

        tracing::debug!(id = %request.id, "service request stored in memory");
        Ok(request)
    }

    async fn update(
        &self,
        id: &str,
        patch: ServiceRequestPatch,
    ) -> Result<ServiceRequest, StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        record.apply_patch(patch, stamp_now())?;
        Ok(record.clone())
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<ServiceRequest> = state
            .requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        drop(state);

        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn get(&self, id: &str) -> Result<ServiceRequest, StoreError> {
        self.state
            .read()
            .await
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
