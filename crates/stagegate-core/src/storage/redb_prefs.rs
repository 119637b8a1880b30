//! # redb-backed Preference Storage
//!
//! Persists preferences in a single-table redb database so they survive
//! across sessions. Each write is its own ACID transaction; values are
//! stored in the [`crate::formats`] encoding.

use super::{PreferenceStore, validate_key};
use crate::formats::{value_from_bytes, value_to_bytes};
use crate::{CaptureError, PreferenceValue};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for preferences: key -> encoded value bytes
const PREFERENCES: TableDefinition<&str, &[u8]> = TableDefinition::new("preferences");

fn io_err(e: impl std::fmt::Display) -> CaptureError {
    CaptureError::IoError(e.to_string())
}

/// A disk-backed preference store.
pub struct RedbPreferences {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbPreferences")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbPreferences {
    /// Open or create a preference database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(io_err)?;

        // Create the table up front so read transactions can always open it.
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(PREFERENCES).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        tracing::debug!(path = %path.display(), "opened preference store");
        Ok(Self { db, path })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for RedbPreferences {
    fn get(&self, key: &str) -> Result<Option<PreferenceValue>, CaptureError> {
        validate_key(key)?;
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PREFERENCES).map_err(io_err)?;

        table
            .get(key)
            .map_err(io_err)?
            .map(|guard| value_from_bytes(guard.value()))
            .transpose()
    }

    fn set(&mut self, key: &str, value: PreferenceValue) -> Result<(), CaptureError> {
        validate_key(key)?;
        let bytes = value_to_bytes(&value)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(PREFERENCES).map_err(io_err)?;
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        tracing::debug!(key, kind = value.kind(), "preference stored");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<Option<PreferenceValue>, CaptureError> {
        validate_key(key)?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        let previous = {
            let mut table = write_txn.open_table(PREFERENCES).map_err(io_err)?;
            let removed = table.remove(key).map_err(io_err)?;
            removed.map(|guard| value_from_bytes(guard.value())).transpose()?
        };
        write_txn.commit().map_err(io_err)?;

        Ok(previous)
    }

    fn entries(&self) -> Result<Vec<(String, PreferenceValue)>, CaptureError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(PREFERENCES).map_err(io_err)?;

        let mut entries = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, value) = entry.map_err(io_err)?;
            entries.push((key.value().to_string(), value_from_bytes(value.value())?));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraFacing, CameraPreferences};
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbPreferences::open(temp.path().join("prefs.redb")).expect("open db");

        assert_eq!(store.get("mirror").expect("get"), None);
        store
            .set("mirror", PreferenceValue::Bool(false))
            .expect("set");
        assert_eq!(
            store.get("mirror").expect("get"),
            Some(PreferenceValue::Bool(false))
        );

        store.set("mirror", PreferenceValue::Bool(true)).expect("overwrite");
        assert_eq!(
            store.get("mirror").expect("get"),
            Some(PreferenceValue::Bool(true))
        );
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("prefs.redb");

        {
            let mut store = RedbPreferences::open(&db_path).expect("open db");
            CameraPreferences::set_preferred_facing(&mut store, CameraFacing::Front)
                .expect("write");
            store
                .set("label", PreferenceValue::Text("studio".into()))
                .expect("set");
        }

        {
            let store = RedbPreferences::open(&db_path).expect("reopen db");
            assert_eq!(
                CameraPreferences::preferred_facing(&store).expect("read"),
                CameraFacing::Front
            );
            let entries = store.entries().expect("entries");
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[1].0, "label");
        }
    }

    #[test]
    fn remove_returns_previous() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbPreferences::open(temp.path().join("prefs.redb")).expect("open db");

        store.set("count", PreferenceValue::Int(7)).expect("set");
        assert_eq!(
            store.remove("count").expect("remove"),
            Some(PreferenceValue::Int(7))
        );
        assert_eq!(store.remove("count").expect("remove again"), None);
        assert!(store.entries().expect("entries").is_empty());
    }

    #[test]
    fn invalid_key_rejected() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbPreferences::open(temp.path().join("prefs.redb")).expect("open db");
        assert!(matches!(
            store.set("", PreferenceValue::Int(1)),
            Err(CaptureError::InvalidKey(_))
        ));
    }
}
