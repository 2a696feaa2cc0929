//! In-process tracking store.
//!
//! Ids are assigned from a single counter across all entity types, so a
//! record created later always has a higher id. Retired records are kept
//! aside and no longer match queries.

use shotver_core::types::DbId;
use tokio::sync::RwLock;

use crate::store::{Fields, Filter, Record, StoreError, TrackingStore};

#[derive(Debug, Default)]
struct State {
    last_id: DbId,
    live: Vec<Record>,
    retired: Vec<Record>,
}

/// A [`TrackingStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record directly, bypassing [`TrackingStore::create`].
    pub async fn insert(&self, entity_type: &str, fields: Fields) -> Record {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let record = Record {
            entity_type: entity_type.to_string(),
            id: state.last_id,
            fields,
        };
        state.live.push(record.clone());
        record
    }

    /// Live records of `entity_type`, in creation order.
    pub async fn records(&self, entity_type: &str) -> Vec<Record> {
        let state = self.state.read().await;
        state
            .live
            .iter()
            .filter(|r| r.entity_type == entity_type)
            .cloned()
            .collect()
    }

    /// Retired records of `entity_type`, in retirement order.
    pub async fn retired(&self, entity_type: &str) -> Vec<Record> {
        let state = self.state.read().await;
        state
            .retired
            .iter()
            .filter(|r| r.entity_type == entity_type)
            .cloned()
            .collect()
    }
}

fn matches_all(record: &Record, entity_type: &str, filters: &[Filter]) -> bool {
    record.entity_type == entity_type && filters.iter().all(|f| f.matches(record))
}

impl TrackingStore for InMemoryStore {
    async fn find(
        &self,
        entity_type: &str,
        filters: &[Filter],
        _fields: &[&str],
    ) -> Result<Vec<Record>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .live
            .iter()
            .filter(|r| matches_all(r, entity_type, filters))
            .cloned()
            .collect())
    }

    async fn find_one(
        &self,
        entity_type: &str,
        filters: &[Filter],
        _fields: &[&str],
    ) -> Result<Option<Record>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .live
            .iter()
            .find(|r| matches_all(r, entity_type, filters))
            .cloned())
    }

    async fn create(&self, entity_type: &str, data: &Fields) -> Result<Record, StoreError> {
        Ok(self.insert(entity_type, data.clone()).await)
    }

    async fn update(
        &self,
        entity_type: &str,
        id: DbId,
        data: &Fields,
    ) -> Result<Record, StoreError> {
        let mut state = self.state.write().await;
        let record = state
            .live
            .iter_mut()
            .find(|r| r.entity_type == entity_type && r.id == id)
            .ok_or_else(|| StoreError::RecordNotFound {
                entity_type: entity_type.to_string(),
                id,
            })?;
        for (key, value) in data {
            record.fields.insert(key.clone(), value.clone());
        }
        Ok(record.clone())
    }

    async fn retire(&self, entity_type: &str, id: DbId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let index = state
            .live
            .iter()
            .position(|r| r.entity_type == entity_type && r.id == id)
            .ok_or_else(|| StoreError::RecordNotFound {
                entity_type: entity_type.to_string(),
                id,
            })?;
        let record = state.live.remove(index);
        state.retired.push(record);
        Ok(())
    }
}
