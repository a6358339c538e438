//! Boundary validation of storage-change notifications.
//!
//! Only the first entry of `Records` is validated, as an
//! [`S3Entity`]. Later entries are never inspected. Anything that does not fit
//! becomes [`Notification::Malformed`] before any downstream call.

use aws_lambda_events::event::s3::S3Entity;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Valid(ObjectRef),
    Malformed(String),
}

pub fn parse_notification(event: &Value) -> Notification {
    let Some(records) = event.get("Records").and_then(Value::as_array) else {
        return Notification::Malformed("not a storage event: missing Records".to_string());
    };
    let Some(first) = records.first() else {
        return Notification::Malformed("Records must contain at least one record".to_string());
    };
    let Some(raw_entity) = first.get("s3") else {
        return Notification::Malformed("first record carries no s3 entity".to_string());
    };

    let entity = match S3Entity::deserialize(raw_entity) {
        Ok(value) => value,
        Err(error) => return Notification::Malformed(format!("not a storage event: {error}")),
    };
    let Some(bucket) = entity.bucket.name else {
        return Notification::Malformed("first record has no bucket name".to_string());
    };
    let Some(raw_key) = entity.object.key else {
        return Notification::Malformed("first record has no object key".to_string());
    };

    match decode_object_key(&raw_key) {
        Ok(key) => Notification::Valid(ObjectRef { bucket, key }),
        Err(reason) => Notification::Malformed(reason),
    }
}

/// Form-urlencoded decoding: `+` is a space, then `%XX` escapes.
pub fn decode_object_key(raw: &str) -> Result<String, String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|error| format!("object key is not valid UTF-8 once decoded: {error}"))
}
