use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// Field map of a stored document. Plain JSON objects keep the store
/// schema-free; typed models convert at the edges.
pub type Fields = serde_json::Map<String, Value>;

/// A document as the store holds it: generated id, server-assigned creation
/// timestamp, and the field map. The creation timestamp is the ordering key
/// for message streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub fields: Fields,
}

impl Record {
    /// Decode the field map into a typed model.
    pub fn decode<T: DeserializeOwned>(&self, kind: &'static str) -> Result<T, RecordError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|source| RecordError {
            id: self.id.clone(),
            kind,
            source,
        })
    }
}

/// A stored record that does not decode as the expected model. Consumers
/// skip the record and log; a bad document must never wedge a live feed.
#[derive(Debug, Error)]
#[error("record `{id}` does not decode as {kind}: {source}")]
pub struct RecordError {
    pub id: String,
    pub kind: &'static str,
    source: serde_json::Error,
}

/// Encode a serializable model into a field map. Falls back to an empty map
/// if `value` serializes to a non-object, which the model types here never do.
pub fn to_fields<T: Serialize>(value: &T) -> Fields {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => fields,
        _ => Fields::new(),
    }
}
