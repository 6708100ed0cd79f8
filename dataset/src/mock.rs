use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use serde_json::json;

use crate::backend::DataBackend;
use crate::error::{Error, Result};
use crate::types::*;

const CSV_TOTAL_ROWS: u64 = 1000;
const JSON_TOTAL_ITEMS: u64 = 500;
const TEXT_TOTAL_LINES: u64 = 2000;

const OCCUPATIONS: [&str; 4] = ["Developer", "Designer", "Manager", "Analyst"];
const CATEGORIES: [&str; 4] = ["A", "B", "C", "D"];

/// In-memory backend fabricating deterministic sample data for local
/// development. Each instance owns its own fixture store, so tests never
/// observe each other's writes.
pub struct MockBackend {
    datasets: Mutex<Vec<Dataset>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            datasets: Mutex::new(seed_datasets()),
        }
    }

    /// A backend with no seeded fixtures.
    pub fn empty() -> Self {
        Self {
            datasets: Mutex::new(vec![]),
        }
    }

    fn with_dataset<T>(&self, id: DatasetId, f: impl FnOnce(&Dataset) -> T) -> Result<T> {
        let datasets = self.datasets.lock();
        datasets
            .iter()
            .find(|dataset| dataset.id == id)
            .map(f)
            .ok_or(Error::NotFound)
    }

    fn with_dataset_mut<T>(&self, id: DatasetId, f: impl FnOnce(&mut Dataset) -> T) -> Result<T> {
        let mut datasets = self.datasets.lock();
        datasets
            .iter_mut()
            .find(|dataset| dataset.id == id)
            .map(f)
            .ok_or(Error::NotFound)
    }
}

fn seed_datasets() -> Vec<Dataset> {
    let now = Utc::now();
    vec![
        Dataset {
            id: DatasetId::from_u128(1),
            name: "Training Dataset 2023".to_string(),
            description: "Main training dataset for language models".to_string(),
            kind: "Training".to_string(),
            size: 1024 * 1024 * 500,
            format: DatasetFormat::Csv,
            tags: vec![
                "training".to_string(),
                "language".to_string(),
                "2023".to_string(),
            ],
            source: DatasetSource::Local,
            status: DatasetStatus::Ready,
            created_at: now,
            updated_at: now,
            owner_id: Some("123".to_string()),
            ..Default::default()
        },
        Dataset {
            id: DatasetId::from_u128(2),
            name: "Validation Data Q4".to_string(),
            description: "Quarterly validation dataset for model evaluation".to_string(),
            kind: "Validation".to_string(),
            size: 1024 * 1024 * 200,
            format: DatasetFormat::Json,
            tags: vec!["validation".to_string(), "quarterly".to_string()],
            source: DatasetSource::Cloud,
            status: DatasetStatus::Ready,
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
            owner_id: Some("123".to_string()),
            ..Default::default()
        },
        Dataset {
            id: DatasetId::from_u128(3),
            name: "Test Dataset Beta".to_string(),
            description: "Beta testing dataset for new model features".to_string(),
            kind: "Testing".to_string(),
            size: 1024 * 1024 * 100,
            format: DatasetFormat::Csv,
            tags: vec!["testing".to_string(), "beta".to_string()],
            source: DatasetSource::Database,
            status: DatasetStatus::Processing,
            created_at: now - Duration::days(2),
            updated_at: now - Duration::days(2),
            owner_id: Some("456".to_string()),
            ..Default::default()
        },
    ]
}

fn total_rows(format: DatasetFormat) -> u64 {
    match format {
        DatasetFormat::Csv => CSV_TOTAL_ROWS,
        DatasetFormat::Json => JSON_TOTAL_ITEMS,
        DatasetFormat::Text => TEXT_TOTAL_LINES,
    }
}

fn csv_row(i: u64) -> String {
    format!(
        "{i},Person {i},{},person{i}@example.com,{},{}",
        20 + i % 50,
        OCCUPATIONS[(i % 4) as usize],
        50_000 + i * 1000
    )
}

fn json_item(i: u64) -> serde_json::Value {
    json!({
        "id": i,
        "name": format!("Item {i}"),
        "properties": {
            "value": i * 10,
            "active": i % 3 == 0,
            "category": CATEGORIES[(i % 4) as usize],
        },
        "tags": [format!("tag-{}", i % 5), format!("tag-{}", (i + 2) % 7)],
    })
}

fn text_line(i: u64) -> String {
    format!("Line {i}: This is sample text data for line {i}.")
}

fn generate_page(format: DatasetFormat, offset: u64, limit: u64) -> String {
    let end = (offset + limit).min(total_rows(format));
    match format {
        DatasetFormat::Csv => {
            let mut content = String::from("id,name,age,email,occupation,salary\n");
            for i in offset..end {
                content.push_str(&csv_row(i));
                content.push('\n');
            }
            content
        }
        DatasetFormat::Json => {
            let items: Vec<serde_json::Value> = (offset..end).map(json_item).collect();
            serde_json::to_string_pretty(&items).expect("Failed to serialize mock JSON items")
        }
        DatasetFormat::Text => {
            let mut content = String::new();
            for i in offset..end {
                content.push_str(&text_line(i));
                content.push('\n');
            }
            content
        }
    }
}

fn csv_statistics() -> DatasetStatistics {
    let column_types = [
        ("id", "integer"),
        ("name", "string"),
        ("age", "integer"),
        ("email", "string"),
        ("occupation", "string"),
        ("salary", "float"),
    ];
    let missing_values = [
        ("id", 0),
        ("name", 2),
        ("age", 5),
        ("email", 1),
        ("occupation", 8),
        ("salary", 3),
    ];

    DatasetStatistics {
        total_rows: Some(CSV_TOTAL_ROWS),
        total_columns: Some(6),
        column_types: column_types
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        missing_values: missing_values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        value_distribution: [
            (
                "occupation".to_string(),
                json!({ "Developer": 250, "Designer": 250, "Manager": 250, "Analyst": 250 }),
            ),
            (
                "age".to_string(),
                json!({ "20-30": 300, "31-40": 350, "41-50": 200, "51-70": 150 }),
            ),
        ]
        .into_iter()
        .collect(),
        sample_data: (1..=3)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("Person {i}"),
                    "age": 20 + i,
                    "email": format!("person{i}@example.com"),
                    "occupation": OCCUPATIONS[(i % 4) as usize],
                    "salary": 50_000 + i * 1000,
                })
            })
            .collect(),
    }
}

fn json_statistics() -> DatasetStatistics {
    DatasetStatistics {
        total_rows: Some(JSON_TOTAL_ITEMS),
        value_distribution: [
            (
                "properties.category".to_string(),
                json!({ "A": 125, "B": 125, "C": 125, "D": 125 }),
            ),
            (
                "properties.active".to_string(),
                json!({ "true": 167, "false": 333 }),
            ),
        ]
        .into_iter()
        .collect(),
        sample_data: (1..=3).map(json_item).collect(),
        ..Default::default()
    }
}

fn text_statistics() -> DatasetStatistics {
    DatasetStatistics {
        total_rows: Some(TEXT_TOTAL_LINES),
        sample_data: (1..=3).map(|i| json!(text_line(i))).collect(),
        ..Default::default()
    }
}

#[async_trait]
impl DataBackend for MockBackend {
    async fn list(&self, filter: &DatasetFilter) -> Result<Vec<Dataset>> {
        let datasets = self.datasets.lock();
        Ok(datasets
            .iter()
            .filter(|dataset| filter.matches(dataset))
            .cloned()
            .collect())
    }

    async fn get(&self, id: DatasetId) -> Result<Dataset> {
        self.with_dataset(id, Clone::clone)
    }

    async fn delete(&self, id: DatasetId) -> Result<()> {
        let mut datasets = self.datasets.lock();
        let before = datasets.len();
        datasets.retain(|dataset| dataset.id != id);
        if datasets.len() == before {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn update_metadata(&self, id: DatasetId, patch: &DatasetPatch) -> Result<Dataset> {
        self.with_dataset_mut(id, |dataset| {
            if let Some(name) = &patch.name {
                dataset.name = name.clone();
            }
            if let Some(description) = &patch.description {
                dataset.description = description.clone();
            }
            if let Some(tags) = &patch.tags {
                dataset.tags = tags.clone();
            }
            dataset.updated_at = Utc::now();
            dataset.clone()
        })
    }

    async fn download(&self, id: DatasetId) -> Result<Vec<u8>> {
        self.with_dataset(id, |dataset| match &dataset.content {
            Some(content) => content.clone().into_bytes(),
            None => generate_page(dataset.format, 0, total_rows(dataset.format)).into_bytes(),
        })
    }

    async fn upload(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadResponse>> {
        let now = Utc::now();
        let mut responses = Vec::with_capacity(files.len());
        let mut datasets = self.datasets.lock();

        for file in files {
            let extension = common::get_file_extension(&file.name).unwrap_or_default();
            let dataset = Dataset {
                id: DatasetId::unique(),
                name: file.name.clone(),
                description: metadata.description.clone().unwrap_or_default(),
                kind: "Training".to_string(),
                size: file.bytes.len() as u64,
                format: DatasetFormat::from_extension(extension),
                tags: metadata.tags.clone(),
                source: DatasetSource::Local,
                status: DatasetStatus::Ready,
                created_at: now,
                updated_at: now,
                owner_id: metadata.owner_id.clone(),
                content: Some(String::from_utf8_lossy(&file.bytes).into_owned()),
                ..Default::default()
            };
            responses.push(UploadResponse {
                id: dataset.id,
                name: dataset.name.clone(),
                success: true,
                message: Some("File uploaded successfully".to_string()),
            });
            datasets.insert(0, dataset);
        }

        Ok(responses)
    }

    async fn content(&self, id: DatasetId, offset: u64, limit: u64) -> Result<DatasetContent> {
        self.with_dataset(id, |dataset| {
            // Uploaded content is returned whole.
            if let Some(content) = &dataset.content {
                return DatasetContent {
                    content: content.clone(),
                    total_size: content.len() as u64,
                    has_more: false,
                    next_cursor: None,
                };
            }

            let total_size = total_rows(dataset.format);
            DatasetContent {
                content: generate_page(dataset.format, offset, limit),
                total_size,
                has_more: offset + limit < total_size,
                next_cursor: None,
            }
        })
    }

    async fn update_content(&self, id: DatasetId, content: &str) -> Result<()> {
        let format = self.with_dataset(id, |dataset| dataset.format)?;
        if format == DatasetFormat::Json {
            serde_json::from_str::<serde_json::Value>(content).map_err(Error::InvalidJson)?;
        }
        self.with_dataset_mut(id, |dataset| {
            dataset.content = Some(content.to_string());
            dataset.size = content.len() as u64;
            dataset.updated_at = Utc::now();
        })
    }

    async fn statistics(&self, id: DatasetId) -> Result<DatasetStatistics> {
        self.with_dataset(id, |dataset| match dataset.format {
            DatasetFormat::Csv => csv_statistics(),
            DatasetFormat::Json => json_statistics(),
            DatasetFormat::Text => text_statistics(),
        })
    }

    async fn samples(&self, id: DatasetId, count: u64) -> Result<Vec<serde_json::Value>> {
        self.with_dataset(id, |dataset| {
            let total = total_rows(dataset.format);
            let mut rng = rand::rng();
            (0..count)
                .map(|_| {
                    let index = rng.random_range(0..total);
                    match dataset.format {
                        DatasetFormat::Csv => json!({
                            "id": index,
                            "name": format!("Person {index}"),
                            "age": 20 + index % 50,
                            "email": format!("person{index}@example.com"),
                            "occupation": OCCUPATIONS[(index % 4) as usize],
                            "salary": 50_000 + index * 1000,
                        }),
                        DatasetFormat::Json => json_item(index),
                        DatasetFormat::Text => json!(text_line(index)),
                    }
                })
                .collect()
        })
    }

    async fn share(
        &self,
        id: DatasetId,
        users: &[String],
        permission: SharePermission,
    ) -> Result<()> {
        self.with_dataset_mut(id, |dataset| {
            for user in users {
                dataset.shared_with.retain(|entry| entry.user_id != *user);
                dataset.shared_with.push(ShareEntry {
                    user_id: user.clone(),
                    permission,
                });
            }
        })
    }

    async fn create_version(
        &self,
        id: DatasetId,
        name: &str,
        notes: Option<&str>,
    ) -> Result<Dataset> {
        let version = DatasetVersion {
            id: VersionId::unique(),
            name: name.to_string(),
            created_at: Utc::now(),
            notes: notes.map(str::to_string),
        };

        let snapshot = self.with_dataset_mut(id, |dataset| {
            dataset.versions.push(version.clone());
            dataset.clone()
        })?;

        Ok(Dataset {
            id: DatasetId::unique(),
            name: format!("{} ({})", snapshot.name, name),
            version: Some(name.to_string()),
            parent: Some(id),
            versions: vec![],
            ..snapshot
        })
    }

    async fn versions(&self, id: DatasetId) -> Result<Vec<DatasetVersion>> {
        self.with_dataset(id, |dataset| dataset.versions.clone())
    }

    async fn switch_version(&self, id: DatasetId, version_id: VersionId) -> Result<Dataset> {
        self.with_dataset_mut(id, |dataset| {
            let version = dataset
                .versions
                .iter()
                .find(|version| version.id == version_id)
                .cloned();
            version.map(|version| {
                dataset.version = Some(version.name);
                dataset.updated_at = Utc::now();
                dataset.clone()
            })
        })?
        .ok_or(Error::NotFound)
    }

    async fn connect_cloud(&self, config: &CloudStorageConfig) -> Result<Dataset> {
        let dataset = Dataset {
            id: DatasetId::unique(),
            name: format!("Cloud Dataset - {}", config.bucket),
            description: format!("Dataset from {} cloud storage", config.provider),
            kind: "Cloud Storage".to_string(),
            size: 1024 * 1024 * 1024,
            tags: vec![
                config.provider.clone(),
                "cloud".to_string(),
                config.bucket.clone(),
            ],
            source: DatasetSource::Cloud,
            status: DatasetStatus::Processing,
            ..Default::default()
        };
        self.datasets.lock().push(dataset.clone());
        Ok(dataset)
    }

    async fn browse_cloud(
        &self,
        _provider: &str,
        _credentials: &serde_json::Value,
        path: &str,
    ) -> Result<CloudBrowse> {
        let path = if path.is_empty() { "/" } else { path };
        let parent_path = (path != "/").then(|| {
            let trimmed = path.trim_end_matches('/');
            match trimmed.rfind('/') {
                Some(0) | None => "/".to_string(),
                Some(idx) => trimmed[..idx].to_string(),
            }
        });

        let folders = ["training", "validation"]
            .into_iter()
            .map(|name| CloudItem {
                name: name.to_string(),
                path: format!("{}/{}", path.trim_end_matches('/'), name),
                kind: CloudItemKind::Folder,
                size: None,
                last_modified: None,
            })
            .collect();
        let files = ["data.csv", "labels.json"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| CloudItem {
                name: name.to_string(),
                path: format!("{}/{}", path.trim_end_matches('/'), name),
                kind: CloudItemKind::File,
                size: Some(1024 * 1024 * (i as u64 + 1)),
                last_modified: Some(Utc::now()),
            })
            .collect();

        Ok(CloudBrowse {
            files,
            folders,
            path: path.to_string(),
            parent_path,
        })
    }

    async fn connect_database(&self, config: &DatabaseConfig) -> Result<Dataset> {
        let dataset = Dataset {
            id: DatasetId::unique(),
            name: format!("Database - {}", config.database),
            description: format!("Dataset from {} database", config.kind),
            kind: "Database".to_string(),
            size: 1024 * 1024 * 512,
            tags: vec![config.kind.clone(), "database".to_string()],
            source: DatasetSource::Database,
            status: DatasetStatus::Processing,
            ..Default::default()
        };
        self.datasets.lock().push(dataset.clone());
        Ok(dataset)
    }

    async fn test_query(
        &self,
        connection_id: DatasetId,
        query: &str,
    ) -> Result<Vec<serde_json::Value>> {
        self.with_dataset(connection_id, |_| ())?;
        Ok((0..3)
            .map(|i| json!({ "row": i, "query": query }))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_id() -> DatasetId {
        DatasetId::from_u128(1)
    }

    #[tokio::test]
    async fn csv_content_paginates() -> anyhow::Result<()> {
        let backend = MockBackend::new();

        let page = backend.content(csv_id(), 0, 10).await?;
        let lines: Vec<&str> = page.content.lines().collect();
        assert_eq!(lines[0], "id,name,age,email,occupation,salary");
        assert_eq!(lines.len(), 11); // header + 10 rows
        assert_eq!(page.total_size, 1000);
        assert!(page.has_more);

        // Last page is short and terminal.
        let page = backend.content(csv_id(), 995, 10).await?;
        let lines: Vec<&str> = page.content.lines().collect();
        assert_eq!(lines.len(), 6); // header + 5 remaining rows
        assert!(!page.has_more);

        // Exact boundary: offset + limit == total means nothing remains.
        let page = backend.content(csv_id(), 990, 10).await?;
        assert!(!page.has_more);
        Ok(())
    }

    #[tokio::test]
    async fn csv_rows_are_deterministic() -> anyhow::Result<()> {
        let backend = MockBackend::new();
        let page = backend.content(csv_id(), 5, 1).await?;
        let row = page.content.lines().nth(1).unwrap();
        assert_eq!(row, "5,Person 5,25,person5@example.com,Designer,55000");
        Ok(())
    }

    #[tokio::test]
    async fn json_content_parses() -> anyhow::Result<()> {
        let backend = MockBackend::new();
        let page = backend.content(DatasetId::from_u128(2), 0, 20).await?;

        let items: Vec<serde_json::Value> = serde_json::from_str(&page.content)?;
        assert_eq!(items.len(), 20);
        assert_eq!(items[0]["properties"]["category"], "A");
        assert_eq!(page.total_size, 500);
        assert!(page.has_more);
        Ok(())
    }

    #[tokio::test]
    async fn uploaded_content_returned_whole() -> Result<()> {
        let backend = MockBackend::new();
        let responses = backend
            .upload(
                vec![UploadFile {
                    name: "notes.txt".to_string(),
                    bytes: b"hello\nworld\n".to_vec(),
                }],
                &UploadMetadata::default(),
            )
            .await?;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);

        let page = backend.content(responses[0].id, 0, 5).await?;
        assert_eq!(page.content, "hello\nworld\n");
        assert!(!page.has_more);
        Ok(())
    }

    #[tokio::test]
    async fn update_content_validates_json() {
        let backend = MockBackend::new();
        let json_id = DatasetId::from_u128(2);

        let result = backend.update_content(json_id, "{not json").await;
        assert!(matches!(result, Err(Error::InvalidJson(_))));

        backend
            .update_content(json_id, r#"[{"id": 1}]"#)
            .await
            .unwrap();
        let page = backend.content(json_id, 0, 1).await.unwrap();
        assert_eq!(page.content, r#"[{"id": 1}]"#);
    }

    #[tokio::test]
    async fn instances_are_isolated() -> Result<()> {
        let first = MockBackend::new();
        let second = MockBackend::new();

        first.delete(csv_id()).await?;

        assert!(matches!(first.get(csv_id()).await, Err(Error::NotFound)));
        assert!(second.get(csv_id()).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_owner_and_source() -> Result<()> {
        let backend = MockBackend::new();

        let filter = DatasetFilter {
            owner_id: Some("123".to_string()),
            ..Default::default()
        };
        assert_eq!(backend.list(&filter).await?.len(), 2);

        let filter = DatasetFilter {
            source: Some(DatasetSource::Database),
            ..Default::default()
        };
        let matched = backend.list(&filter).await?;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Test Dataset Beta");
        Ok(())
    }

    #[tokio::test]
    async fn share_and_versions_round_trip() -> Result<()> {
        let backend = MockBackend::new();
        let id = csv_id();

        backend
            .share(id, &["ana@example.com".to_string()], SharePermission::Edit)
            .await?;
        let dataset = backend.get(id).await?;
        assert_eq!(dataset.shared_with.len(), 1);
        assert_eq!(dataset.shared_with[0].permission, SharePermission::Edit);

        let snapshot = backend.create_version(id, "v1", Some("first cut")).await?;
        assert_eq!(snapshot.parent, Some(id));
        assert_eq!(snapshot.version.as_deref(), Some("v1"));

        let versions = backend.versions(id).await?;
        assert_eq!(versions.len(), 1);

        let switched = backend.switch_version(id, versions[0].id).await?;
        assert_eq!(switched.version.as_deref(), Some("v1"));
        Ok(())
    }

    #[tokio::test]
    async fn statistics_match_format() -> Result<()> {
        let backend = MockBackend::new();

        let stats = backend.statistics(csv_id()).await?;
        assert_eq!(stats.total_rows, Some(1000));
        assert_eq!(stats.total_columns, Some(6));
        assert_eq!(stats.column_types.get("salary").map(String::as_str), Some("float"));

        let responses = backend
            .upload(
                vec![UploadFile {
                    name: "corpus.txt".to_string(),
                    bytes: b"one\ntwo\n".to_vec(),
                }],
                &UploadMetadata::default(),
            )
            .await?;
        let stats = backend.statistics(responses[0].id).await?;
        assert_eq!(stats.total_rows, Some(2000));
        assert!(stats.column_types.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn samples_respect_count() -> Result<()> {
        let backend = MockBackend::new();
        let samples = backend.samples(csv_id(), 7).await?;
        assert_eq!(samples.len(), 7);
        for sample in samples {
            assert!(sample["id"].as_u64().unwrap() < 1000);
        }
        Ok(())
    }

    #[tokio::test]
    async fn cloud_and_database_connections_register_datasets() -> Result<()> {
        let backend = MockBackend::empty();

        let cloud = backend
            .connect_cloud(&CloudStorageConfig {
                provider: "s3".to_string(),
                bucket: "training-data".to_string(),
                region: None,
                credentials: json!({}),
                path: None,
            })
            .await?;
        assert_eq!(cloud.name, "Cloud Dataset - training-data");
        assert_eq!(cloud.source, DatasetSource::Cloud);

        let db = backend
            .connect_database(&DatabaseConfig {
                kind: "postgres".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                database: "ml".to_string(),
                username: "svc".to_string(),
                password: "secret".to_string(),
                query: None,
                table: None,
            })
            .await?;
        assert_eq!(db.name, "Database - ml");

        assert_eq!(backend.list(&DatasetFilter::default()).await?.len(), 2);

        let rows = backend.test_query(db.id, "select 1").await?;
        assert_eq!(rows.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn browse_cloud_reports_parent_path() -> Result<()> {
        let backend = MockBackend::new();
        let credentials = json!({});

        let root = backend.browse_cloud("s3", &credentials, "/").await?;
        assert!(root.parent_path.is_none());
        assert_eq!(root.folders.len(), 2);

        let nested = backend
            .browse_cloud("s3", &credentials, "/training/images")
            .await?;
        assert_eq!(nested.parent_path.as_deref(), Some("/training"));
        Ok(())
    }
}
