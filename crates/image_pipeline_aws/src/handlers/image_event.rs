//! Lambda-side processing of one object-created notification.
//!
//! `ReceivedEvent → Parsed → Labeled → Persisted → Responded`, with early
//! exits to `Rejected` for malformed input (answered, never retried) and
//! `Errored` for downstream failures (propagated to the platform).

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::adapters::labels::LabelDetector;
use crate::adapters::record_store::RecordStore;
use crate::runtime::contract::{EventResponse, ImageRecord, LabelRequest, TABLE_ENV_VAR};
use crate::runtime::error::ProviderError;
use crate::runtime::notification::{parse_notification, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    ReceivedEvent,
    Parsed,
    Labeled,
    Persisted,
    Responded,
    Rejected,
    Errored,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("label detection failed for '{key}': {source}")]
    Labeling {
        key: String,
        #[source]
        source: ProviderError,
    },
    #[error("persisting record '{key}' failed: {source}")]
    Persistence {
        key: String,
        #[source]
        source: ProviderError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("TABLA_DYNAMO must be configured")]
pub struct MissingTableName;

/// Read once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub table_name: String,
}

impl ProcessorConfig {
    pub fn from_env() -> Result<Self, MissingTableName> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingTableName> {
        lookup(TABLE_ENV_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(|table_name| Self { table_name })
            .ok_or(MissingTableName)
    }
}

fn transition(state: ProcessingState, key: &str) {
    info!(component = "image_event", state = ?state, key);
}

pub fn handle_image_event(
    event: &Value,
    detector: &impl LabelDetector,
    store: &impl RecordStore,
) -> Result<EventResponse, EventError> {
    info!(component = "image_event", state = ?ProcessingState::ReceivedEvent, payload = %event);

    let object = match parse_notification(event) {
        Notification::Valid(object) => object,
        Notification::Malformed(reason) => {
            warn!(component = "image_event", state = ?ProcessingState::Rejected, reason = %reason);
            return Ok(EventResponse::rejected(format!(
                "not a valid storage notification: {reason}"
            )));
        }
    };
    transition(ProcessingState::Parsed, &object.key);

    let request = LabelRequest::for_object(&object.bucket, &object.key);
    let labels = detector.detect_labels(&request).map_err(|source| {
        error!(component = "image_event", state = ?ProcessingState::Errored, key = %object.key, error = %source);
        EventError::Labeling {
            key: object.key.clone(),
            source,
        }
    })?;
    info!(component = "image_event", state = ?ProcessingState::Labeled, key = %object.key, labels = ?labels);

    let record = ImageRecord::processed(object.key.clone(), labels);
    store.put_record(&record).map_err(|source| {
        error!(component = "image_event", state = ?ProcessingState::Errored, key = %object.key, error = %source);
        EventError::Persistence {
            key: object.key.clone(),
            source,
        }
    })?;
    transition(ProcessingState::Persisted, &object.key);

    let response = EventResponse::labeled(&record.contenido);
    transition(ProcessingState::Responded, &object.key);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use crate::runtime::contract::RecordStatus;
    use crate::runtime::error::ProviderErrorKind;
    use crate::test_helpers::FakeCloud;

    use super::*;

    const BUCKET: &str = "proyecto-entrada-ab12cd34";

    fn notification(key: &str) -> Value {
        json!({
            "Records": [{
                "eventSource": "aws:s3",
                "s3": {
                    "bucket": {"name": BUCKET},
                    "object": {"key": key}
                }
            }]
        })
    }

    #[test]
    fn missing_records_is_rejected_without_labeling() {
        let cloud = FakeCloud::new();

        let response = handle_image_event(&json!({"foo": "bar"}), &cloud, &cloud)
            .expect("malformed input is answered, not raised");

        assert_eq!(response.status_code, 400);
        assert_eq!(cloud.call_count("DetectLabels"), 0);
        assert_eq!(cloud.call_count("PutItem"), 0);
    }

    #[test]
    fn persists_exactly_what_the_capability_returned() {
        let cloud = FakeCloud::new();
        cloud.with_labels("gato.jpg", &["Cat"]);

        let response =
            handle_image_event(&notification("gato.jpg"), &cloud, &cloud).expect("should succeed");

        assert_eq!(response, EventResponse::labeled(&["Cat".to_string()]));
        assert_eq!(
            cloud.record("gato.jpg"),
            Some(ImageRecord {
                id_archivo: "gato.jpg".to_string(),
                contenido: vec!["Cat".to_string()],
                estado: RecordStatus::Procesado,
            })
        );
    }

    #[test]
    fn requests_capped_labels_above_confidence_threshold() {
        let cloud = FakeCloud::new();
        handle_image_event(&notification("mi+foto.png"), &cloud, &cloud).expect("should succeed");

        let requests = cloud.label_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bucket, BUCKET);
        assert_eq!(requests[0].key, "mi foto.png");
        assert_eq!(requests[0].max_labels, 10);
        assert_eq!(requests[0].min_confidence, 75.0);
    }

    #[test]
    fn preserves_capability_ordering() {
        let cloud = FakeCloud::new();
        cloud.with_labels("k.jpg", &["Pet", "Cat", "Animal"]);

        handle_image_event(&notification("k.jpg"), &cloud, &cloud).expect("should succeed");

        let record = cloud.record("k.jpg").expect("record stored");
        assert_eq!(record.contenido, vec!["Pet", "Cat", "Animal"]);
    }

    #[test]
    fn reprocessing_replaces_the_record() {
        let cloud = FakeCloud::new();
        cloud.with_labels("k.jpg", &["Cat", "Pet"]);
        handle_image_event(&notification("k.jpg"), &cloud, &cloud).expect("first pass");

        cloud.with_labels("k.jpg", &["Dog"]);
        handle_image_event(&notification("k.jpg"), &cloud, &cloud).expect("second pass");

        assert_eq!(cloud.record_count(), 1);
        assert_eq!(
            cloud.record("k.jpg").map(|record| record.contenido),
            Some(vec!["Dog".to_string()])
        );
    }

    #[test]
    fn labeling_failure_propagates_and_nothing_is_written() {
        let cloud = FakeCloud::new();
        cloud.fail(
            "DetectLabels",
            &format!("{BUCKET}/k.jpg"),
            ProviderErrorKind::AccessDenied,
        );

        let error = handle_image_event(&notification("k.jpg"), &cloud, &cloud)
            .expect_err("labeling failure should propagate");

        assert!(matches!(error, EventError::Labeling { .. }));
        assert_eq!(cloud.record_writes(), 0);
    }

    #[test]
    fn persistence_failure_propagates() {
        let cloud = FakeCloud::new();
        cloud.fail("PutItem", "k.jpg", ProviderErrorKind::Other);

        let error = handle_image_event(&notification("k.jpg"), &cloud, &cloud)
            .expect_err("write failure should propagate");
        assert!(matches!(error, EventError::Persistence { .. }));
    }

    #[test]
    fn config_requires_table_name() {
        let env = HashMap::from([(TABLE_ENV_VAR, "TransripcionesAuto".to_string())]);
        let config = ProcessorConfig::from_lookup(|name| env.get(name).cloned())
            .expect("table configured");
        assert_eq!(config.table_name, "TransripcionesAuto");

        assert_eq!(
            ProcessorConfig::from_lookup(|_| None),
            Err(MissingTableName)
        );
        assert_eq!(
            ProcessorConfig::from_lookup(|_| Some("  ".to_string())),
            Err(MissingTableName)
        );
    }
}
