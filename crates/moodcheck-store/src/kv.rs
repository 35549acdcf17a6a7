//! Key-value backends
//!
//! The local store only needs whole-value reads and writes under a handful
//! of fixed keys. [`MemoryKv`] is the in-process test double; [`FileKv`]
//! keeps one file per key so data survives restarts.

use crate::error::StoreError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

/// Whole-value string storage addressed by key
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value; `Ok(None)` if the key is absent
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace a value
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value; deleting an absent key succeeds
    ///
    /// # Errors
    /// Returns [`StoreError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory backend
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys present
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if no keys are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// File-per-key backend rooted at a directory
///
/// Writes go to a temporary file in the same directory and are renamed
/// into place, so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileKv {
    root: PathBuf,
}

impl FileKv {
    /// Open (creating if needed) a store directory
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let mut staged =
            tempfile::NamedTempFile::new_in(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        staged
            .write_all(value.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| StoreError::io(staged.path(), e))?;
        staged
            .persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kv_roundtrip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("a").unwrap(), None);

        kv.set("a", "[1]").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("[1]"));
        assert_eq!(kv.len(), 1);

        kv.remove("a").unwrap();
        kv.remove("a").unwrap();
        assert!(kv.is_empty());
    }

    #[test]
    fn file_kv_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(kv.set(key, "x"), Err(StoreError::InvalidKey(_))), "{key}");
        }
    }

    #[test]
    fn file_kv_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let kv = FileKv::open(dir.path().join("nested")).unwrap();
        kv.set("moodcheck.users", "[]").unwrap();
        kv.set("moodcheck.users", "[{\"id\":1}]").unwrap();
        drop(kv);

        let reopened = FileKv::open(dir.path().join("nested")).unwrap();
        assert_eq!(
            reopened.get("moodcheck.users").unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );

        reopened.remove("moodcheck.users").unwrap();
        assert_eq!(reopened.get("moodcheck.users").unwrap(), None);
        // removing an absent key is not an error
        reopened.remove("moodcheck.users").unwrap();
    }
}
