//! The vector store boundary
//! Durable id -> vector mapping consumed by the corpus service

mod file;
mod memory;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::types::Entry;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Failures at the storage boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// What the core needs from a persistence engine.
///
/// Implementations own their locking. `scan_all` must return a coherent
/// snapshot, but writes racing with a scan may or may not be included.
pub trait VectorStore: Send + Sync {
    /// Insert `vector` under `id`, replacing any existing vector.
    fn upsert(&self, id: &str, vector: &[f32]) -> Result<(), StoreError>;

    /// Remove `id`. Removing an absent id succeeds.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Every stored entry.
    fn scan_all(&self) -> Result<Vec<Entry>, StoreError>;

    fn get(&self, id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        Ok(self.scan_all()?.into_iter().find(|e| e.id == id).map(|e| e.vector))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.scan_all()?.len())
    }
}

/// Backing map shared by the bundled stores. Ordered so scans are ascending by id.
pub(crate) type Table = BTreeMap<String, Vec<f32>>;

pub(crate) fn snapshot(table: &Table) -> Vec<Entry> {
    table
        .iter()
        .map(|(id, vector)| Entry { id: id.clone(), vector: vector.clone() })
        .collect()
}
