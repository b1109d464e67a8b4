use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
}

/// Opaque byte storage addressed by fixed keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
///
/// Writes hold an exclusive lock on `dir/.lock` and land via temp file + rename,
/// so a reader never sees a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let tmp = path.with_extension("json.tmp");
        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }

        lock.unlock()?;
        result.map_err(StoreError::from)
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").expect("get").is_none());
        store.set("a", b"one").expect("set");
        store.set("a", b"two").expect("overwrite");
        assert_eq!(store.get("a").expect("get"), Some(b"two".to_vec()));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn file_store_writes_one_file_per_key() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("data");
        let mut store = FileStore::new(&dir);

        assert!(store.get("streak_ledger").expect("get").is_none());
        store.set("streak_ledger", br#"{"current_streak":2}"#).expect("set");

        let on_disk = fs::read_to_string(dir.join("streak_ledger.json")).expect("read");
        assert_eq!(on_disk, r#"{"current_streak":2}"#);
        assert!(!dir.join("streak_ledger.json.tmp").exists());
        assert_eq!(
            store.get("streak_ledger").expect("get"),
            Some(br#"{"current_streak":2}"#.to_vec())
        );
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let temp = TempDir::new().expect("tempdir");
        // A non-empty directory in the way makes the final rename fail.
        let blocked = temp.path().join("daily_checklist.json");
        fs::create_dir_all(&blocked).expect("mkdir");
        fs::write(blocked.join("keep"), b"x").expect("write");

        let mut store = FileStore::new(temp.path());
        assert!(matches!(
            store.set("daily_checklist", b"{}"),
            Err(StoreError::Io(_))
        ));
        assert!(!temp.path().join("daily_checklist.json.tmp").exists());
        assert!(blocked.join("keep").is_file());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let temp = TempDir::new().expect("tempdir");
        let mut store = FileStore::new(temp.path());
        for key in ["", "../escape", "a/b", "dot.key"] {
            assert!(matches!(
                store.set(key, b"x"),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }
}
