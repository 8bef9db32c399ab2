use std::path::{Path, PathBuf};

use async_trait::async_trait;
use handyhub_core::requests::stamp_now;
use handyhub_core::{
    NewServiceRequest, RequestStatus, ServiceRequest, ServiceRequestPatch, StoreBackend,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{newest_first, RequestStore, StoreError};

/// On-disk layout: the id counter plus every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument {
    next_id: u64,
    requests: Vec<ServiceRequest>,
}

impl Default for JsonDocument {
    fn default() -> Self {
        Self {
            next_id: 1,
            requests: Vec::new(),
        }
    }
}

/// Store backed by a single JSON document on disk.
///
/// The file is the only source of truth: every operation reads it afresh, so
/// several stores (the server and the CLI) can share one path. Mutations
/// rewrite the whole document to a per-process temporary file, then rename it
/// over the original. Concurrent writers from different processes race and
/// the last write wins.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the document at `path`, starting empty when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::File`] if the file exists but cannot be read, or
    /// [`StoreError::Corrupt`] if it is not a valid document.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };
        let document = store.load().await?;

        tracing::info!(
            path = %store.path.display(),
            requests = document.requests.len(),
            "opened json file store"
        );
        Ok(store)
    }

    async fn load(&self) -> Result<JsonDocument, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(JsonDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, document: &JsonDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RequestStore for JsonFileStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::JsonFile
    }

    async fn create(&self, new: NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await?;
        let request = ServiceRequest::from_new(document.next_id.to_string(), new, stamp_now());
        document.next_id += 1;
        document.requests.push(request.clone());

        self.persist(&document).await?;
        Ok(request)
    }

    async fn update(
        &self,
        id: &str,
        patch: ServiceRequestPatch,
    ) -> Result<ServiceRequest, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await?;
        let record = document
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.apply_patch(patch, stamp_now())?;
        let updated = record.clone();

        self.persist(&document).await?;
        Ok(updated)
    }

    async fn list(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<ServiceRequest>, StoreError> {
        let mut rows: Vec<ServiceRequest> = self
            .load()
            .await?
            .requests
            .into_iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .collect();

        rows.sort_by(newest_first);
        Ok(rows)
    }

    async fn get(&self, id: &str) -> Result<ServiceRequest, StoreError> {
        self.load()
            .await?
            .requests
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            // Nothing written yet; the file appears on the first create.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract;
    use super::*;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("nested").join("service-requests.json")
    }

    async fn fresh() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::open(store_path(&dir)).await.expect("open");
        (dir, store)
    }

    #[tokio::test]
    async fn create_assigns_id_and_pending() {
        let (_dir, store) = fresh().await;
        contract::create_assigns_id_and_pending(&store).await;
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, store) = fresh().await;
        contract::list_is_newest_first(&store).await;
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (_dir, store) = fresh().await;
        contract::list_filters_by_status(&store).await;
    }

    #[tokio::test]
    async fn update_walks_lifecycle() {
        let (_dir, store) = fresh().await;
        contract::update_walks_lifecycle(&store).await;
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (_dir, store) = fresh().await;
        contract::update_missing_is_not_found(&store).await;
    }

    #[tokio::test]
    async fn update_rejects_illegal_transition() {
        let (_dir, store) = fresh().await;
        contract::update_rejects_illegal_transition(&store).await;
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let (_dir, store) = fresh().await;
        contract::update_merges_fields(&store).await;
    }

    #[tokio::test]
    async fn reopen_keeps_records_and_counter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = store_path(&dir);

        let store = JsonFileStore::open(&path).await.expect("open");
        let first = store.create(contract::ada()).await.expect("create");
        store
            .update(&first.id, ServiceRequestPatch::status(RequestStatus::Accepted))
            .await
            .expect("accept");
        drop(store);

        let reopened = JsonFileStore::open(&path).await.expect("reopen");
        let restored = reopened.get(&first.id).await.expect("get");
        assert_eq!(restored.status, RequestStatus::Accepted);
        assert_eq!(restored.created_at, first.created_at);

        let second = reopened
            .create(contract::named("Grace Hopper"))
            .await
            .expect("create");
        assert_eq!(second.id, "2");
    }

    #[tokio::test]
    async fn stores_sharing_a_path_see_each_others_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = store_path(&dir);
        let server = JsonFileStore::open(&path).await.expect("open server");
        let cli = JsonFileStore::open(&path).await.expect("open cli");

        let ada = server.create(contract::ada()).await.expect("create");
        cli.update(&ada.id, ServiceRequestPatch::status(RequestStatus::Accepted))
            .await
            .expect("accept from cli");
        assert_eq!(
            server.get(&ada.id).await.expect("get").status,
            RequestStatus::Accepted
        );

        let grace = server
            .create(contract::named("Grace Hopper"))
            .await
            .expect("create");
        assert_eq!(grace.id, "2");

        let reopened = JsonFileStore::open(&path).await.expect("reopen");
        assert_eq!(
            reopened.get(&ada.id).await.expect("get").status,
            RequestStatus::Accepted
        );
        assert_eq!(reopened.list(None).await.expect("list").len(), 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"{ not json").await.expect("write");

        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn health_check_passes_before_first_write() {
        let (_dir, store) = fresh().await;
        store.health_check().await.expect("healthy");
    }
}
