use serde::{Deserialize, Serialize};

pub const PARTITION_KEY: &str = "id_archivo";
pub const TABLE_ENV_VAR: &str = "TABLA_DYNAMO";
pub const MAX_LABELS: i32 = 10;
pub const MIN_CONFIDENCE: f32 = 75.0;
pub const INDEX_DOCUMENT: &str = "index.html";
pub const HTML_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordStatus {
    Procesado,
}

/// Row written once per processed object. Field names are read by table
/// consumers and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub id_archivo: String,
    pub contenido: Vec<String>,
    pub estado: RecordStatus,
}

impl ImageRecord {
    pub fn processed(key: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            id_archivo: key.into(),
            contenido: labels,
            estado: RecordStatus::Procesado,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub bucket: String,
    pub key: String,
    pub max_labels: i32,
    pub min_confidence: f32,
}

impl LabelRequest {
    pub fn for_object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            max_labels: MAX_LABELS,
            min_confidence: MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl EventResponse {
    pub fn labeled(labels: &[String]) -> Self {
        Self {
            status_code: 200,
            body: serde_json::Value::from(labels.to_vec()).to_string(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            body: reason.into(),
        }
    }
}
