use std::sync::Arc;

use common::api::ApiConfig;

use crate::backend::DataBackend;
use crate::error::Result;
use crate::mock::MockBackend;
use crate::remote::RemoteBackend;
use crate::types::*;

/// Entry point for dataset operations. The backend is injected at
/// construction, so callers and tests choose where data comes from without
/// touching any global state.
#[derive(Clone)]
pub struct DatasetService {
    backend: Arc<dyn DataBackend>,
}

impl DatasetService {
    pub fn with_backend(backend: Arc<dyn DataBackend>) -> Self {
        Self { backend }
    }

    pub fn remote(config: ApiConfig) -> Self {
        Self::with_backend(Arc::new(RemoteBackend::new(config)))
    }

    pub fn mock() -> Self {
        Self::with_backend(Arc::new(MockBackend::new()))
    }

    pub async fn list(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>> {
        self.backend.list(filter).await
    }

    pub async fn get(&self, id: DatasetId) -> Result<Dataset> {
        self.backend.get(id).await
    }

    pub async fn delete(&self, id: DatasetId) -> Result<()> {
        tracing::debug!("Deleting dataset {id}");
        self.backend.delete(id).await
    }

    pub async fn update_metadata(&self, id: DatasetId, patch: &DatasetPatch) -> Result<Dataset> {
        self.backend.update_metadata(id, patch).await
    }

    pub async fn download(&self, id: DatasetId) -> Result<Vec<u8>> {
        self.backend.download(id).await
    }

    pub async fn upload(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadResponse>> {
        tracing::debug!("Uploading {} file(s)", files.len());
        self.backend.upload(files, metadata).await
    }

    pub async fn content(
        &self,
        id: DatasetId,
        offset: u64,
        limit: u64,
    ) -> Result<DatasetContent> {
        self.backend.content(id, offset, limit).await
    }

    pub async fn update_content(&self, id: DatasetId, content: &str) -> Result<()> {
        self.backend.update_content(id, content).await
    }

    pub async fn statistics(&self, id: DatasetId) -> Result<DatasetStatistics> {
        self.backend.statistics(id).await
    }

    pub async fn samples(&self, id: DatasetId, count: u64) -> Result<Vec<serde_json::Value>> {
        self.backend.samples(id, count).await
    }

    pub async fn share(
        &self,
        id: DatasetId,
        users: &[String],
        permission: SharePermission,
    ) -> Result<()> {
        self.backend.share(id, users, permission).await
    }

    pub async fn create_version(
        &self,
        id: DatasetId,
        name: &str,
        notes: Option<&str>,
    ) -> Result<Dataset> {
        self.backend.create_version(id, name, notes).await
    }

    pub async fn versions(&self, id: DatasetId) -> Result<Vec<DatasetVersion>> {
        self.backend.versions(id).await
    }

    pub async fn switch_version(&self, id: DatasetId, version_id: VersionId) -> Result<Dataset> {
        self.backend.switch_version(id, version_id).await
    }

    pub async fn connect_cloud(&self, config: &CloudStorageConfig) -> Result<Dataset> {
        tracing::debug!("Connecting cloud storage bucket {}", config.bucket);
        self.backend.connect_cloud(config).await
    }

    pub async fn browse_cloud(
        &self,
        provider: &str,
        credentials: &serde_json::Value,
        path: &str,
    ) -> Result<CloudBrowse> {
        self.backend.browse_cloud(provider, credentials, path).await
    }

    pub async fn connect_database(&self, config: &DatabaseConfig) -> Result<Dataset> {
        tracing::debug!("Connecting database {}", config.database);
        self.backend.connect_database(config).await
    }

    pub async fn test_query(
        &self,
        connection_id: DatasetId,
        query: &str,
    ) -> Result<Vec<serde_json::Value>> {
        self.backend.test_query(connection_id, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn service_delegates_to_injected_backend() -> Result<()> {
        let service = DatasetService::mock();

        let datasets = service.list(&DatasetFilter::default()).await?;
        assert_eq!(datasets.len(), 3);

        let id = datasets[0].id;
        service.delete(id).await?;
        assert!(matches!(service.get(id).await, Err(Error::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn services_do_not_share_state() -> Result<()> {
        let first = DatasetService::mock();
        let second = DatasetService::mock();

        let id = first.list(&DatasetFilter::default()).await?[0].id;
        first.delete(id).await?;

        assert_eq!(second.list(&DatasetFilter::default()).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_the_same_backend() -> Result<()> {
        let service = DatasetService::mock();
        let alias = service.clone();

        let id = service.list(&DatasetFilter::default()).await?[0].id;
        service.delete(id).await?;

        assert!(matches!(alias.get(id).await, Err(Error::NotFound)));
        Ok(())
    }
}
