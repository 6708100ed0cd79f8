use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use common::id_type;

id_type!(DatasetId);
id_type!(VersionId);

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    Default,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DatasetFormat {
    Csv,
    Json,
    #[default]
    Text,
}

impl DatasetFormat {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetSource {
    #[default]
    Local,
    Cloud,
    Api,
    Database,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetStatus {
    #[default]
    Ready,
    Processing,
    Error,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    View,
    Edit,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEntry {
    pub user_id: String,
    pub permission: SharePermission,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetVersion {
    pub id: VersionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    pub name: String,
    pub description: String,
    /// Free-form kind label ("Training", "Validation", ...).
    pub kind: String,
    /// Size in bytes.
    pub size: u64,
    pub format: DatasetFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub source: DatasetSource,
    pub status: DatasetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    /// Stored raw content for datasets uploaded in mock mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<ShareEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<DatasetVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<DatasetId>,
}

impl Default for Dataset {
    fn default() -> Self {
        let now = Utc::now();
        Dataset {
            id: DatasetId::unique(),
            name: String::new(),
            description: String::new(),
            kind: String::new(),
            size: 0,
            format: DatasetFormat::default(),
            tags: vec![],
            source: DatasetSource::default(),
            status: DatasetStatus::default(),
            created_at: now,
            updated_at: now,
            owner_id: None,
            content: None,
            shared_with: vec![],
            versions: vec![],
            version: None,
            parent: None,
        }
    }
}

/// One page of dataset content.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetContent {
    pub content: String,
    pub total_size: u64,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_columns: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub column_types: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub missing_values: HashMap<String, u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub value_distribution: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_data: Vec<serde_json::Value>,
}

#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: DatasetId,
    pub name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudStorageConfig {
    pub provider: String,
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub credentials: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudItemKind {
    File,
    Folder,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: CloudItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudBrowse {
    pub files: Vec<CloudItem>,
    pub folders: Vec<CloudItem>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Database engine ("postgres", "mysql", ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct DatasetFilter {
    pub source: Option<DatasetSource>,
    pub format: Option<DatasetFormat>,
    pub status: Option<DatasetStatus>,
    pub search: Option<String>,
    pub owner_id: Option<String>,
}

impl DatasetFilter {
    pub fn matches(&self, dataset: &Dataset) -> bool {
        if let Some(source) = self.source {
            if dataset.source != source {
                return false;
            }
        }
        if let Some(format) = self.format {
            if dataset.format != format {
                return false;
            }
        }
        if let Some(status) = self.status {
            if dataset.status != status {
                return false;
            }
        }
        if let Some(owner_id) = &self.owner_id {
            if dataset.owner_id.as_deref() != Some(owner_id.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let search = search.to_lowercase();
            let in_name = dataset.name.to_lowercase().contains(&search);
            let in_description = dataset.description.to_lowercase().contains(&search);
            let in_tags = dataset
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&search));
            if !(in_name || in_description || in_tags) {
                return false;
            }
        }
        true
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(source) = self.source {
            pairs.push(("source", source.to_string()));
        }
        if let Some(format) = self.format {
            pairs.push(("format", format.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(owner_id) = &self.owner_id {
            pairs.push(("userId", owner_id.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(DatasetFormat::from_extension("CSV"), DatasetFormat::Csv);
        assert_eq!(DatasetFormat::from_extension("json"), DatasetFormat::Json);
        assert_eq!(DatasetFormat::from_extension("txt"), DatasetFormat::Text);
        assert_eq!(DatasetFormat::from_extension("bin"), DatasetFormat::Text);
    }

    #[test]
    fn filter_matches_search_in_tags() {
        let dataset = Dataset {
            name: "Training Dataset 2023".to_string(),
            tags: vec!["language".to_string()],
            ..Default::default()
        };

        let filter = DatasetFilter {
            search: Some("LANG".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&dataset));

        let filter = DatasetFilter {
            search: Some("image".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&dataset));
    }

    #[test]
    fn filter_query_pairs() {
        let filter = DatasetFilter {
            source: Some(DatasetSource::Cloud),
            status: Some(DatasetStatus::Ready),
            ..Default::default()
        };
        let pairs = filter.to_query_pairs();
        assert!(pairs.contains(&("source", "cloud".to_string())));
        assert!(pairs.contains(&("status", "ready".to_string())));
        assert_eq!(pairs.len(), 2);
    }
}
