//! Qdrant request body builders.
//!
//! Each function returns the JSON body for one REST call so the shapes can
//! be checked without a running engine.

use qa_indexer_shared::PointId;
use serde_json::{json, Map, Value};

use crate::collection::{CollectionConfig, OptimizerConfig};
use crate::types::{PayloadSchemaType, SetPayloadOperation};

/// Payload key holding the text a point was embedded from.
pub const DOCUMENT_PAYLOAD_KEY: &str = "document";

/// Body for `PUT /collections/{name}`.
pub fn build_create_collection(config: &CollectionConfig) -> Value {
    json!({
        "vectors": {
            config.model.vector_name(): {
                "size": config.model.dimension,
                "distance": config.distance,
                "on_disk": config.on_disk
            }
        },
        "optimizers_config": config.optimizers,
        "quantization_config": {
            "scalar": config.quantization
        }
    })
}

/// Body for `PATCH /collections/{name}`.
pub fn build_update_collection(optimizers: &OptimizerConfig) -> Value {
    json!({ "optimizers_config": optimizers })
}

/// One point for `PUT /collections/{name}/points`.
///
/// The embedded text is stored under `document` next to the caller's payload.
pub fn build_point(
    id: u64,
    vector_name: &str,
    vector: Vec<f32>,
    text: &str,
    metadata: &Map<String, Value>,
) -> Value {
    let mut payload = metadata.clone();
    payload.insert(DOCUMENT_PAYLOAD_KEY.to_string(), Value::from(text));

    json!({
        "id": id,
        "vector": { vector_name: vector },
        "payload": payload
    })
}

/// Body for `PUT /collections/{name}/points`.
pub fn build_upsert(points: Vec<Value>) -> Value {
    json!({ "points": points })
}

/// Body for `POST /collections/{name}/points/scroll`.
///
/// Vectors are never requested; only payloads are needed downstream.
pub fn build_scroll(limit: usize, offset: Option<&PointId>) -> Value {
    let mut body = json!({
        "limit": limit,
        "with_payload": true,
        "with_vector": false
    });
    if let Some(offset) = offset {
        body["offset"] = json!(offset);
    }
    body
}

/// Body for `POST /collections/{name}/points/batch`.
pub fn build_batch_set_payload(operations: &[SetPayloadOperation]) -> Value {
    let operations: Vec<Value> = operations
        .iter()
        .map(|op| {
            json!({
                "set_payload": {
                    "payload": op.payload,
                    "points": op.points
                }
            })
        })
        .collect();

    json!({ "operations": operations })
}

/// Body for `PUT /collections/{name}/index`.
pub fn build_payload_index(field_name: &str, field_schema: PayloadSchemaType) -> Value {
    json!({
        "field_name": field_name,
        "field_schema": field_schema
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::EmbeddingModel;

    fn bulk_config() -> CollectionConfig {
        let model = EmbeddingModel::resolve("BAAI/bge-small-en-v1.5", None).unwrap();
        CollectionConfig::for_bulk_load("questions", model)
    }

    #[test]
    fn test_create_collection_body() {
        let body = build_create_collection(&bulk_config());

        let vector = &body["vectors"]["fast-bge-small-en-v1.5"];
        assert_eq!(vector["size"], 384);
        assert_eq!(vector["distance"], "Cosine");
        assert_eq!(vector["on_disk"], true);

        assert_eq!(body["optimizers_config"]["indexing_threshold"], 0);

        let scalar = &body["quantization_config"]["scalar"];
        assert_eq!(scalar["type"], "int8");
        assert_eq!(scalar["always_ram"], true);
        assert!((scalar["quantile"].as_f64().unwrap() - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_update_collection_body() {
        let body = build_update_collection(&OptimizerConfig::with_threshold(20_000));
        assert_eq!(body["optimizers_config"]["indexing_threshold"], 20_000);
    }

    #[test]
    fn test_point_keeps_payload_and_adds_document() {
        let mut metadata = Map::new();
        metadata.insert("Id".to_string(), json!(11));

        let point = build_point(5, "fast-x", vec![0.5, 0.25], "Title text", &metadata);

        assert_eq!(point["id"], 5);
        assert_eq!(point["vector"]["fast-x"][1], 0.25);
        assert_eq!(point["payload"]["Id"], 11);
        assert_eq!(point["payload"]["document"], "Title text");
    }

    #[test]
    fn test_scroll_body_first_page_has_no_offset() {
        let body = build_scroll(100, None);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["with_vector"], false);
        assert!(body.get("offset").is_none());

        let body = build_scroll(100, Some(&PointId::Num(300)));
        assert_eq!(body["offset"], 300);
    }

    #[test]
    fn test_batch_set_payload_body() {
        let mut payload = Map::new();
        payload.insert("num_answers".to_string(), json!(2));
        let ops = vec![
            SetPayloadOperation::for_point(PointId::Num(1), payload.clone()),
            SetPayloadOperation::for_point(PointId::Num(2), payload),
        ];

        let body = build_batch_set_payload(&ops);
        let operations = body["operations"].as_array().unwrap();

        assert_eq!(operations.len(), 2);
        assert_eq!(operations[1]["set_payload"]["points"][0], 2);
        assert_eq!(operations[0]["set_payload"]["payload"]["num_answers"], 2);
    }

    #[test]
    fn test_payload_index_body() {
        let body = build_payload_index("num_answers", PayloadSchemaType::Integer);
        assert_eq!(body["field_name"], "num_answers");
        assert_eq!(body["field_schema"], "integer");
    }
}
