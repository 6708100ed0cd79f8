use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::json;

use common::api::{error_message, ApiConfig};

use crate::backend::DataBackend;
use crate::error::{Error, Result};
use crate::types::*;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the dashboard REST API. Every method maps to one endpoint under
/// `datasets/`; error bodies are unwrapped into their `message` field with an
/// operation-specific fallback.
#[derive(Debug)]
pub struct RemoteBackend {
    client: reqwest::Client,
    config: ApiConfig,
}

impl RemoteBackend {
    pub fn new(config: ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, self.config.endpoint(path));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    async fn check(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(error_message(&body, fallback)));
        }
        Ok(response)
    }

    async fn json_body<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let response = Self::check(request.send().await?, fallback).await?;
        Ok(response.json().await?)
    }

    async fn empty_body(request: reqwest::RequestBuilder, fallback: &str) -> Result<()> {
        Self::check(request.send().await?, fallback).await?;
        Ok(())
    }
}

#[async_trait]
impl DataBackend for RemoteBackend {
    async fn list(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>> {
        let request = self.get("datasets").query(&filter.to_query_pairs());
        Self::json_body(request, "Failed to fetch datasets").await
    }

    async fn get(&self, id: DatasetId) -> Result<Dataset> {
        let request = self.get(&format!("datasets/{id}"));
        Self::json_body(request, "Failed to fetch dataset").await
    }

    async fn delete(&self, id: DatasetId) -> Result<()> {
        let request = self.request(reqwest::Method::DELETE, &format!("datasets/{id}"));
        Self::empty_body(request, "Failed to delete dataset").await
    }

    async fn update_metadata(&self, id: DatasetId, patch: &DatasetPatch) -> Result<Dataset> {
        let request = self
            .request(reqwest::Method::PATCH, &format!("datasets/{id}"))
            .json(patch);
        Self::json_body(request, "Failed to update dataset metadata").await
    }

    async fn download(&self, id: DatasetId) -> Result<Vec<u8>> {
        let request = self.get(&format!("datasets/{id}/download"));
        let response = Self::check(request.send().await?, "Failed to download dataset").await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadResponse>> {
        let mut form = multipart::Form::new();
        for file in files {
            let part = multipart::Part::bytes(file.bytes).file_name(file.name);
            form = form.part("files", part);
        }
        let metadata = serde_json::to_string(metadata)
            .map_err(|err| Error::Api(err.to_string()))?;
        form = form.text("metadata", metadata);

        let request = self.post("datasets/upload").multipart(form);
        Self::json_body(request, "Failed to upload files").await
    }

    async fn content(&self, id: DatasetId, offset: u64, limit: u64) -> Result<DatasetContent> {
        let request = self
            .get(&format!("datasets/{id}/content"))
            .query(&[("offset", offset), ("limit", limit)]);
        Self::json_body(request, "Failed to fetch dataset content").await
    }

    async fn update_content(&self, id: DatasetId, content: &str) -> Result<()> {
        // JSON datasets are wrapped in an envelope, everything else goes up
        // as plain text.
        let format = DataBackend::get(self, id).await?.format;
        let request = self.request(reqwest::Method::PUT, &format!("datasets/{id}/content"));
        let request = match format {
            DatasetFormat::Json => request.json(&json!({ "content": content })),
            _ => request
                .header(reqwest::header::CONTENT_TYPE, "text/plain")
                .body(content.to_string()),
        };
        Self::empty_body(request, "Failed to update dataset content").await
    }

    async fn statistics(&self, id: DatasetId) -> Result<DatasetStatistics> {
        let request = self.get(&format!("datasets/{id}/statistics"));
        Self::json_body(request, "Failed to fetch dataset statistics").await
    }

    async fn samples(&self, id: DatasetId, count: u64) -> Result<Vec<serde_json::Value>> {
        let request = self
            .get(&format!("datasets/{id}/samples"))
            .query(&[("count", count)]);
        Self::json_body(request, "Failed to fetch random samples").await
    }

    async fn share(
        &self,
        id: DatasetId,
        users: &[String],
        permission: SharePermission,
    ) -> Result<()> {
        let request = self
            .post(&format!("datasets/{id}/share"))
            .json(&json!({ "users": users, "permission": permission }));
        Self::empty_body(request, "Failed to share dataset").await
    }

    async fn create_version(
        &self,
        id: DatasetId,
        name: &str,
        notes: Option<&str>,
    ) -> Result<Dataset> {
        let request = self
            .post(&format!("datasets/{id}/versions"))
            .json(&json!({ "name": name, "notes": notes }));
        Self::json_body(request, "Failed to create dataset version").await
    }

    async fn versions(&self, id: DatasetId) -> Result<Vec<DatasetVersion>> {
        let request = self.get(&format!("datasets/{id}/versions"));
        Self::json_body(request, "Failed to fetch dataset versions").await
    }

    async fn switch_version(&self, id: DatasetId, version_id: VersionId) -> Result<Dataset> {
        let request = self.post(&format!("datasets/{id}/versions/{version_id}/switch"));
        Self::json_body(request, "Failed to switch dataset version").await
    }

    async fn connect_cloud(&self, config: &CloudStorageConfig) -> Result<Dataset> {
        let request = self.post("datasets/cloud/connect").json(config);
        Self::json_body(request, "Failed to connect to cloud storage").await
    }

    async fn browse_cloud(
        &self,
        provider: &str,
        credentials: &serde_json::Value,
        path: &str,
    ) -> Result<CloudBrowse> {
        let request = self.post("datasets/cloud/browse").json(&json!({
            "provider": provider,
            "credentials": credentials,
            "path": path,
        }));
        Self::json_body(request, "Failed to browse cloud storage").await
    }

    async fn connect_database(&self, config: &DatabaseConfig) -> Result<Dataset> {
        let request = self.post("datasets/database/connect").json(config);
        Self::json_body(request, "Failed to connect to database").await
    }

    async fn test_query(
        &self,
        connection_id: DatasetId,
        query: &str,
    ) -> Result<Vec<serde_json::Value>> {
        let request = self
            .post(&format!("datasets/database/{connection_id}/test-query"))
            .json(&json!({ "query": query }));
        Self::json_body(request, "Failed to execute database query").await
    }
}
