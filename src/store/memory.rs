use parking_lot::RwLock;

use super::{snapshot, StoreError, Table, VectorStore};
use crate::types::Entry;

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryStore {
    fn upsert(&self, id: &str, vector: &[f32]) -> Result<(), StoreError> {
        self.table.write().insert(id.to_owned(), vector.to_vec());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.table.write().remove(id);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(snapshot(&self.table.read()))
    }

    fn get(&self, id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        Ok(self.table.read().get(id).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().len())
    }
}

#[cfg(test)]
mod memory_test {
    use super::*;

    #[test]
    fn test_upsert_replaces() {
        let store = MemoryStore::new();
        store.upsert("vec1", &[1.0, 0.0]).unwrap();
        store.upsert("vec1", &[0.0, 1.0]).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get("vec1").unwrap(), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.upsert("vec1", &[1.0]).unwrap();

        store.delete("vec1").unwrap();
        store.delete("vec1").unwrap();
        store.delete("never-there").unwrap();

        assert_eq!(store.len().unwrap(), 0);
        assert!(store.get("vec1").unwrap().is_none());
    }

    #[test]
    fn test_scan_all_ascending_ids() {
        let store = MemoryStore::new();
        store.upsert("c", &[3.0]).unwrap();
        store.upsert("a", &[1.0]).unwrap();
        store.upsert("b", &[2.0]).unwrap();

        let entries = store.scan_all().unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(entries[2].vector, vec![3.0]);
    }
}
