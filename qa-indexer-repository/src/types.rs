//! Request and response types for vector engine operations.

use qa_indexer_shared::PointId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::VectorEngineError;

/// Points to embed and upload in one `add` call.
///
/// `ids`, `documents` and `metadata` are parallel lists: entry `i` of each
/// describes the same point.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    /// Point identifiers.
    pub ids: Vec<u64>,
    /// Text passed to the embedding model.
    pub documents: Vec<String>,
    /// Payload stored alongside each vector.
    pub metadata: Vec<Map<String, Value>>,
    /// Number of texts per embedding call.
    pub batch_size: usize,
    /// Concurrent embedding workers; 0 or 1 runs sequentially.
    pub parallel: usize,
}

impl AddRequest {
    /// Number of points in the request.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the request holds no points.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check that the parallel lists line up.
    pub fn validate(&self) -> Result<(), VectorEngineError> {
        if self.documents.len() != self.ids.len() || self.metadata.len() != self.ids.len() {
            return Err(VectorEngineError::invalid_request(format!(
                "mismatched add request: {} ids, {} documents, {} payloads",
                self.ids.len(),
                self.documents.len(),
                self.metadata.len()
            )));
        }
        Ok(())
    }
}

/// A stored point as returned by a scroll request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: PointId,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// One page of a scroll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPage {
    pub points: Vec<PointRecord>,
    /// Cursor for the next page; `None` when the scroll is exhausted.
    #[serde(rename = "next_page_offset", default)]
    pub next_offset: Option<PointId>,
}

/// Merge `payload` into the payloads of `points`, keeping all other fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SetPayloadOperation {
    pub points: Vec<PointId>,
    pub payload: Map<String, Value>,
}

impl SetPayloadOperation {
    /// Operation targeting a single point.
    pub fn for_point(id: PointId, payload: Map<String, Value>) -> Self {
        Self {
            points: vec![id],
            payload,
        }
    }
}

/// Value type of a payload index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSchemaType {
    Keyword,
    Integer,
    Float,
    Bool,
    Datetime,
}

/// Summary of a collection's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub indexing_threshold: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_request_validation() {
        let mut request = AddRequest {
            ids: vec![0, 1],
            documents: vec!["a".to_string(), "b".to_string()],
            metadata: vec![Map::new(), Map::new()],
            batch_size: 8,
            parallel: 0,
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.len(), 2);

        request.documents.pop();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_scroll_page_parses_engine_shape() {
        let page: ScrollPage = serde_json::from_value(json!({
            "points": [{"id": 3, "payload": {"answers": []}}],
            "next_page_offset": 4
        }))
        .unwrap();

        assert_eq!(page.points.len(), 1);
        assert_eq!(page.points[0].id, PointId::Num(3));
        assert_eq!(page.next_offset, Some(PointId::Num(4)));
    }

    #[test]
    fn test_scroll_page_without_cursor() {
        let page: ScrollPage = serde_json::from_value(json!({
            "points": [],
            "next_page_offset": null
        }))
        .unwrap();

        assert!(page.points.is_empty());
        assert!(page.next_offset.is_none());
    }

    #[test]
    fn test_schema_type_serialization() {
        assert_eq!(
            serde_json::to_value(PayloadSchemaType::Integer).unwrap(),
            json!("integer")
        );
    }
}
