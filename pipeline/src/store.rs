use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use common::api::{error_message, ApiConfig};

use crate::graph::{Component, Connection, Pipeline};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SAVE_FALLBACK: &str = "Failed to save pipeline";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Api(String),
    #[error("Failed to reach the pipeline API")]
    Transport(#[from] reqwest::Error),
}

/// Persistence seam for the editor. The editor never owns the HTTP call;
/// whoever constructs it decides where pipelines go.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn save(&self, pipeline: &Pipeline) -> Result<(), StoreError>;
}

/// Saves pipelines to the dashboard REST API.
#[derive(Debug)]
pub struct RemotePipelineStore {
    client: reqwest::Client,
    config: ApiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavePayload<'a> {
    name: &'a str,
    components: &'a [Component],
    connections: &'a [Connection],
}

impl RemotePipelineStore {
    pub fn new(config: ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl PipelineStore for RemotePipelineStore {
    async fn save(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        let url = self
            .config
            .endpoint(&format!("pipelines/{}", pipeline.id));
        let payload = SavePayload {
            name: &pipeline.name,
            components: pipeline.components(),
            connections: pipeline.connections(),
        };

        let mut request = self.client.put(&url).json(&payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(error_message(&body, SAVE_FALLBACK)));
        }

        tracing::debug!("Saved pipeline {} ({})", pipeline.id, status);
        Ok(())
    }
}
