//! In-memory vector engine for testing and dry runs.
//!
//! [`InMemoryVectorEngine`] keeps collections in a `HashMap` behind a
//! `RwLock`, each holding its points in a `BTreeMap`, and implements the
//! full [`VectorEngineClient`] trait. `add` stores payloads without
//! embedding anything, so no model is needed.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use qa_indexer_shared::PointId;
use serde_json::{Map, Value};

use crate::collection::{CollectionConfig, OptimizerConfig};
use crate::errors::VectorEngineError;
use crate::interfaces::VectorEngineClient;
use crate::qdrant::DOCUMENT_PAYLOAD_KEY;
use crate::types::{
    AddRequest, CollectionInfo, PayloadSchemaType, PointRecord, ScrollPage, SetPayloadOperation,
};

/// One stored collection.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    pub config: CollectionConfig,
    pub points: BTreeMap<u64, Map<String, Value>>,
    pub payload_indexes: HashMap<String, PayloadSchemaType>,
}

/// An in-memory implementation of [`VectorEngineClient`].
///
/// Data is lost when the engine is dropped. Points are always numeric and
/// scroll in ascending id order, like Qdrant.
#[derive(Debug, Default)]
pub struct InMemoryVectorEngine {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl InMemoryVectorEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a collection, if it exists.
    pub fn snapshot(&self, collection: &str) -> Option<MemoryCollection> {
        self.collections
            .read()
            .ok()
            .and_then(|c| c.get(collection).cloned())
    }

    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut MemoryCollection) -> Result<T, VectorEngineError>,
    ) -> Result<T, VectorEngineError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| VectorEngineError::collection(format!("lock poisoned: {}", e)))?;
        let entry = collections
            .get_mut(collection)
            .ok_or_else(|| VectorEngineError::NotFound(collection.to_string()))?;
        f(entry)
    }
}

fn numeric_id(id: &PointId) -> Result<u64, VectorEngineError> {
    match id {
        PointId::Num(n) => Ok(*n),
        PointId::Uuid(u) => Err(VectorEngineError::invalid_request(format!(
            "in-memory engine only stores numeric ids, got {}",
            u
        ))),
    }
}

#[async_trait]
impl VectorEngineClient for InMemoryVectorEngine {
    async fn health_check(&self) -> Result<bool, VectorEngineError> {
        Ok(true)
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorEngineError> {
        let collections = self
            .collections
            .read()
            .map_err(|e| VectorEngineError::collection(format!("lock poisoned: {}", e)))?;
        Ok(collections.contains_key(collection))
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorEngineError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| VectorEngineError::collection(format!("lock poisoned: {}", e)))?;
        collections.remove(collection);
        Ok(())
    }

    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), VectorEngineError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| VectorEngineError::collection(format!("lock poisoned: {}", e)))?;
        if collections.contains_key(&config.name) {
            return Err(VectorEngineError::collection(format!(
                "collection {} already exists",
                config.name
            )));
        }
        collections.insert(
            config.name.clone(),
            MemoryCollection {
                config: config.clone(),
                points: BTreeMap::new(),
                payload_indexes: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, VectorEngineError> {
        self.with_collection(collection, |c| {
            Ok(CollectionInfo {
                points_count: c.points.len() as u64,
                indexing_threshold: Some(c.config.optimizers.indexing_threshold),
            })
        })
    }

    async fn update_collection(
        &self,
        collection: &str,
        optimizers: &OptimizerConfig,
    ) -> Result<(), VectorEngineError> {
        self.with_collection(collection, |c| {
            c.config.optimizers = *optimizers;
            Ok(())
        })
    }

    async fn add(&self, collection: &str, request: AddRequest) -> Result<(), VectorEngineError> {
        request.validate()?;
        self.with_collection(collection, |c| {
            let AddRequest {
                ids,
                documents,
                metadata,
                ..
            } = request;
            for ((id, text), mut payload) in ids.into_iter().zip(documents).zip(metadata) {
                payload.insert(DOCUMENT_PAYLOAD_KEY.to_string(), Value::from(text));
                c.points.insert(id, payload);
            }
            Ok(())
        })
    }

    async fn scroll(
        &self,
        collection: &str,
        limit: usize,
        offset: Option<PointId>,
    ) -> Result<ScrollPage, VectorEngineError> {
        let start = offset.as_ref().map(numeric_id).transpose()?.unwrap_or(0);
        self.with_collection(collection, |c| {
            let mut range = c.points.range(start..);
            let points: Vec<PointRecord> = range
                .by_ref()
                .take(limit)
                .map(|(id, payload)| PointRecord {
                    id: PointId::Num(*id),
                    payload: payload.clone(),
                })
                .collect();
            let next_offset = range.next().map(|(id, _)| PointId::Num(*id));
            Ok(ScrollPage {
                points,
                next_offset,
            })
        })
    }

    async fn batch_update_points(
        &self,
        collection: &str,
        operations: &[SetPayloadOperation],
    ) -> Result<(), VectorEngineError> {
        self.with_collection(collection, |c| {
            // Validate every target first so the batch applies all or nothing.
            for op in operations {
                for id in &op.points {
                    let id = numeric_id(id)?;
                    if !c.points.contains_key(&id) {
                        return Err(VectorEngineError::payload_update(format!(
                            "point {} does not exist",
                            id
                        )));
                    }
                }
            }
            for op in operations {
                for id in &op.points {
                    if let Some(payload) = c.points.get_mut(&numeric_id(id)?) {
                        payload.extend(op.payload.clone());
                    }
                }
            }
            Ok(())
        })
    }

    async fn create_payload_index(
        &self,
        collection: &str,
        field_name: &str,
        field_schema: PayloadSchemaType,
    ) -> Result<(), VectorEngineError> {
        self.with_collection(collection, |c| {
            c.payload_indexes
                .insert(field_name.to_string(), field_schema);
            Ok(())
        })
    }
}
