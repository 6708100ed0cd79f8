use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

/// The seam between dataset UI code and wherever the data actually lives.
/// Selected at construction time: [`crate::remote::RemoteBackend`] for the
/// REST API, [`crate::mock::MockBackend`] for local development and tests.
#[async_trait]
pub trait DataBackend: Send + Sync {
    async fn list(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>>;
    async fn get(&self, id: DatasetId) -> Result<Dataset>;
    async fn delete(&self, id: DatasetId) -> Result<()>;
    async fn update_metadata(&self, id: DatasetId, patch: &DatasetPatch) -> Result<Dataset>;
    async fn download(&self, id: DatasetId) -> Result<Vec<u8>>;

    async fn upload(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadResponse>>;

    async fn content(&self, id: DatasetId, offset: u64, limit: u64) -> Result<DatasetContent>;
    async fn update_content(&self, id: DatasetId, content: &str) -> Result<()>;
    async fn statistics(&self, id: DatasetId) -> Result<DatasetStatistics>;
    async fn samples(&self, id: DatasetId, count: u64) -> Result<Vec<serde_json::Value>>;

    async fn share(
        &self,
        id: DatasetId,
        users: &[String],
        permission: SharePermission,
    ) -> Result<()>;
    async fn create_version(
        &self,
        id: DatasetId,
        name: &str,
        notes: Option<&str>,
    ) -> Result<Dataset>;
    async fn versions(&self, id: DatasetId) -> Result<Vec<DatasetVersion>>;
    async fn switch_version(&self, id: DatasetId, version_id: VersionId) -> Result<Dataset>;

    async fn connect_cloud(&self, config: &CloudStorageConfig) -> Result<Dataset>;
    async fn browse_cloud(
        &self,
        provider: &str,
        credentials: &serde_json::Value,
        path: &str,
    ) -> Result<CloudBrowse>;
    async fn connect_database(&self, config: &DatabaseConfig) -> Result<Dataset>;
    async fn test_query(&self, connection_id: DatasetId, query: &str)
        -> Result<Vec<serde_json::Value>>;
}
