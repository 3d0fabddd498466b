//! In-process shipment store.
//!
//! Applies patches the same way the `PostgreSQL` store does (top-level key
//! replacement on the JSON document), so workflow tests see the same record
//! shapes.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use shipdesk_core::{ShipmentId, ShipmentStatus};
use tokio::sync::RwLock;

use super::{RepositoryError, ShipmentStore};
use crate::models::{NewShipment, ShipmentPatch, ShipmentRecord};

/// Shipment store held in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryShipmentStore {
    records: RwLock<HashMap<ShipmentId, ShipmentRecord>>,
}

impl InMemoryShipmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ShipmentStore for InMemoryShipmentStore {
    async fn insert(&self, shipment: NewShipment) -> Result<ShipmentId, RepositoryError> {
        let id = ShipmentId::generate();
        let record = ShipmentRecord {
            id,
            document: shipment.document,
            created_at: shipment.created_at,
            updated_at: shipment.created_at,
        };
        self.records.write().await.insert(id, record);
        Ok(id)
    }

    async fn find_by_id(&self, id: ShipmentId) -> Result<Option<ShipmentRecord>, RepositoryError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update_fields(
        &self,
        id: ShipmentId,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        merge(record, patch)
    }

    async fn update_fields_if(
        &self,
        id: ShipmentId,
        expected: ShipmentStatus,
        patch: ShipmentPatch,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if record.document.status != expected {
            return Err(RepositoryError::StatusConflict { expected });
        }
        merge(record, patch)
    }

    async fn list_all(&self) -> Result<Vec<ShipmentRecord>, RepositoryError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Apply `patch` to `record`, leaving it untouched if the result doesn't
/// parse as a document.
fn merge(record: &mut ShipmentRecord, patch: ShipmentPatch) -> Result<(), RepositoryError> {
    let mut document = match serde_json::to_value(&record.document)? {
        Value::Object(map) => map,
        other => {
            return Err(RepositoryError::Serialization(serde::de::Error::custom(
                format!("document is not an object: {other}"),
            )));
        }
    };
    document.extend(patch.fields);

    record.document = serde_json::from_value(Value::Object(document))?;
    record.updated_at = patch.updated_at;
    Ok(())
}
