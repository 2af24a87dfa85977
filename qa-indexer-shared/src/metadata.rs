//! Aggregate metadata derived from a stored payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Payload field holding the answer list.
pub const ANSWERS_FIELD: &str = "answers";
/// Payload field holding the question's own comments.
pub const COMMENTS_FIELD: &str = "comments";

/// Child counts merged into each point's payload by the postprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetadata {
    pub num_answers: u64,
    pub num_comments: u64,
}

/// The payload lacks the structure derived metadata is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload field '{field}' is missing or not a list")]
pub struct MetadataError {
    pub field: &'static str,
}

impl DerivedMetadata {
    /// Compute metadata from a payload. Pure: depends on nothing but `payload`.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, MetadataError> {
        Ok(Self {
            num_answers: list_len(payload, ANSWERS_FIELD)?,
            num_comments: list_len(payload, COMMENTS_FIELD)?,
        })
    }

    /// Payload fragment for a set-payload (merge) operation.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("num_answers".to_string(), Value::from(self.num_answers));
        map.insert("num_comments".to_string(), Value::from(self.num_comments));
        map
    }
}

fn list_len(payload: &Map<String, Value>, field: &'static str) -> Result<u64, MetadataError> {
    payload
        .get(field)
        .and_then(Value::as_array)
        .map(|items| items.len() as u64)
        .ok_or(MetadataError { field })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_counts_direct_children() {
        let p = payload(json!({
            "Id": 1,
            "answers": [{"Id": 2, "comments": [{"Text": "a"}, {"Text": "b"}]}],
            "comments": []
        }));

        let meta = DerivedMetadata::from_payload(&p).unwrap();
        assert_eq!(meta.num_answers, 1);
        assert_eq!(meta.num_comments, 0);
    }

    #[test]
    fn test_recomputation_is_stable() {
        let mut p = payload(json!({"answers": [{}, {}], "comments": [{}]}));
        let first = DerivedMetadata::from_payload(&p).unwrap();

        // Merging the derived fields back in must not change the result.
        p.extend(first.to_payload());
        let second = DerivedMetadata::from_payload(&p).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_field_is_error() {
        let p = payload(json!({"answers": []}));
        let err = DerivedMetadata::from_payload(&p).unwrap_err();
        assert_eq!(err.field, COMMENTS_FIELD);
    }

    #[test]
    fn test_to_payload_field_names() {
        let meta = DerivedMetadata {
            num_answers: 3,
            num_comments: 4,
        };
        let p = meta.to_payload();
        assert_eq!(p["num_answers"], 3);
        assert_eq!(p["num_comments"], 4);
    }
}
