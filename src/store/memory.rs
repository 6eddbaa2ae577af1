use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use super::PoolMetadataStore;
use crate::cache::{load_from_file, save_to_file};
use crate::error::StoreError;
use crate::models::PoolMetadata;

/// One persisted row of a metadata snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub chain_id: u64,
    pub token: Address,
    pub metadata: PoolMetadata,
}

/// In-process metadata store, optionally seeded from a JSON snapshot.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    entries: RwLock<HashMap<(u64, Address), PoolMetadata>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(path: &str) -> Result<Self> {
        let rows: Vec<SnapshotEntry> = load_from_file(path)?;
        let store = Self::new();
        for row in rows {
            store.insert(row.chain_id, row.token, row.metadata);
        }
        Ok(store)
    }

    pub fn save_snapshot(&self, path: &str) -> Result<()> {
        let mut rows: Vec<SnapshotEntry> = self
            .read()
            .iter()
            .map(|((chain_id, token), metadata)| SnapshotEntry {
                chain_id: *chain_id,
                token: *token,
                metadata: metadata.clone(),
            })
            .collect();
        rows.sort_by(|a, b| (a.chain_id, a.token).cmp(&(b.chain_id, b.token)));
        save_to_file(&rows, path)
    }

    pub fn insert(&self, chain_id: u64, token: Address, metadata: PoolMetadata) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert((chain_id, token), metadata);
    }

    pub fn remove(&self, chain_id: u64, token: &Address) -> Option<PoolMetadata> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&(chain_id, *token))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<(u64, Address), PoolMetadata>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PoolMetadataStore for MemoryMetadataStore {
    async fn get(
        &self,
        token: &Address,
        chain_id: u64,
    ) -> Result<Option<PoolMetadata>, StoreError> {
        Ok(self.read().get(&(chain_id, *token)).cloned())
    }
}
