use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{snapshot, StoreError, Table, VectorStore};
use crate::types::Entry;

/// Store persisted to a single bincode file.
///
/// The whole table is kept in memory and the file is rewritten after every
/// mutation that changes it. Writes go to a sibling file named after the
/// target plus `.tmp` (`vectors.db` -> `vectors.db.tmp`), which is synced and
/// then renamed over the target, so a crash mid-write leaves the previous file
/// intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    table: Mutex<Table>,
}

impl FileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use semdb::{FileStore, VectorStore};
    ///
    /// let store = FileStore::open("vectors.db").unwrap();
    /// store.upsert("vec1", &[1.0, 2.0, 3.0]).unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let table = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            bincode::deserialize_from(reader)?
        } else {
            Table::new()
        };

        info!(path = %path.display(), entries = table.len(), "opened file store");
        Ok(FileStore { path, table: Mutex::new(table) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends rather than replaces the extension, so `a.db` and `a.bin`
    /// never share a temp file and `live.tmp` never writes onto itself.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, table: &Table) -> Result<(), StoreError> {
        let tmp = self.tmp_path();

        let mut writer = BufWriter::new(File::create(&tmp)?);
        bincode::serialize_into(&mut writer, table)?;
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        // Data must be on disk before the rename makes it visible.
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl VectorStore for FileStore {
    fn upsert(&self, id: &str, vector: &[f32]) -> Result<(), StoreError> {
        let mut table = self.table.lock();
        let previous = table.insert(id.to_owned(), vector.to_vec());

        if let Err(err) = self.persist(&table) {
            warn!(id, error = %err, "persist failed, rolling back upsert");
            match previous {
                Some(old) => table.insert(id.to_owned(), old),
                None => table.remove(id),
            };
            return Err(err);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut table = self.table.lock();
        let Some(old) = table.remove(id) else {
            return Ok(());
        };

        if let Err(err) = self.persist(&table) {
            warn!(id, error = %err, "persist failed, rolling back delete");
            table.insert(id.to_owned(), old);
            return Err(err);
        }
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(snapshot(&self.table.lock()))
    }

    fn get(&self, id: &str) -> Result<Option<Vec<f32>>, StoreError> {
        Ok(self.table.lock().get(id).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.table.lock().len())
    }
}

#[cfg(test)]
mod file_test {
    use super::*;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("missing.db")).unwrap();

        assert_eq!(store.len().unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = FileStore::open(&path).unwrap();
        store.upsert("vec1", &[1.0, 0.0, 0.0]).unwrap();
        store.upsert("vec2", &[0.0, 1.0, 0.0]).unwrap();
        store.upsert("vec3", &[0.0, 0.0, 1.0]).unwrap();
        store.delete("vec2").unwrap();
        drop(store);

        let loaded = FileStore::open(&path).unwrap();
        assert_eq!(loaded.len().unwrap(), 2);
        assert_eq!(loaded.get("vec1").unwrap(), Some(vec![1.0, 0.0, 0.0]));
        assert!(loaded.get("vec2").unwrap().is_none());
        assert_eq!(loaded.get("vec3").unwrap(), Some(vec![0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_upsert_overwrites_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overwrite.db");

        let store = FileStore::open(&path).unwrap();
        store.upsert("x", &[1.0, 0.0]).unwrap();
        store.upsert("x", &[0.0, 1.0]).unwrap();
        drop(store);

        let loaded = FileStore::open(&path).unwrap();
        assert_eq!(loaded.len().unwrap(), 1);
        assert_eq!(loaded.get("x").unwrap(), Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_delete_missing_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untouched.db");

        let store = FileStore::open(&path).unwrap();
        store.delete("ghost").unwrap();
        store.delete("ghost").unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        fs::create_dir(&sub).unwrap();

        let store = FileStore::open(sub.join("store.db")).unwrap();
        store.upsert("kept", &[1.0]).unwrap();
        fs::remove_dir_all(&sub).unwrap();

        assert!(store.upsert("new", &[2.0]).is_err());
        assert!(store.upsert("kept", &[3.0]).is_err());
        assert!(store.delete("kept").is_err());

        assert!(store.get("new").unwrap().is_none());
        assert_eq!(store.get("kept").unwrap(), Some(vec![1.0]));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_tmp_path_keeps_full_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileStore::open(dir.path().join("a.db")).unwrap();
        let bin = FileStore::open(dir.path().join("a.bin")).unwrap();

        assert_eq!(db.tmp_path(), dir.path().join("a.db.tmp"));
        assert_eq!(bin.tmp_path(), dir.path().join("a.bin.tmp"));
    }

    #[test]
    fn test_sibling_stores_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let db = FileStore::open(dir.path().join("a.db")).unwrap();
        let bin = FileStore::open(dir.path().join("a.bin")).unwrap();

        db.upsert("from_db", &[1.0]).unwrap();
        bin.upsert("from_bin", &[2.0]).unwrap();
        db.upsert("again", &[3.0]).unwrap();
        drop(db);
        drop(bin);

        let db = FileStore::open(dir.path().join("a.db")).unwrap();
        let bin = FileStore::open(dir.path().join("a.bin")).unwrap();
        assert_eq!(db.len().unwrap(), 2);
        assert!(db.get("from_bin").unwrap().is_none());
        assert_eq!(bin.len().unwrap(), 1);
        assert_eq!(bin.get("from_bin").unwrap(), Some(vec![2.0]));
    }

    #[test]
    fn test_store_named_tmp_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.tmp");

        let store = FileStore::open(&path).unwrap();
        store.upsert("x", &[1.0, 2.0]).unwrap();
        drop(store);

        let loaded = FileStore::open(&path).unwrap();
        assert_eq!(loaded.get("x").unwrap(), Some(vec![1.0, 2.0]));
        assert!(!dir.path().join("live.tmp.tmp").exists());
    }

    #[test]
    fn test_open_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.db");
        fs::write(&path, [0xff_u8; 3]).unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Encoding(_))));
    }
}
