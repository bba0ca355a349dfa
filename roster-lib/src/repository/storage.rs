use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::RwLock;
use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::trace;

use crate::repository::{Error, Result};

/// Handle to the durable key-value storage backing the record store.
///
/// Every value is stored as JSON under a plain key. The file backend keeps one `<key>.json`
/// file per key; the memory backend exists for tests.
#[derive(Debug, Clone)]
pub struct Storage {
    backend: Arc<RwLock<Backend>>,
}

#[derive(Debug)]
enum Backend {
    File(PathBuf),
    #[cfg_attr(not(test), allow(dead_code))]
    Memory(HashMap<String, String>),
}

impl Storage {
    /// Open file backed storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            backend: Arc::new(RwLock::new(Backend::File(dir))),
        })
    }

    /// Create a memory backed storage for use in tests
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self {
            backend: Arc::new(RwLock::new(Backend::Memory(HashMap::new()))),
        }
    }

    /// Read the value stored under `key`, or `None` if nothing was ever written there.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        validate_key(key)?;

        let contents = match &*self.backend.read() {
            Backend::File(dir) => match fs::read_to_string(dir.join(format!("{key}.json"))) {
                Ok(contents) => Some(contents),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => return Err(e.into()),
            },
            Backend::Memory(map) => map.get(key).cloned(),
        };

        contents
            .map(|c| serde_json::from_str(&c))
            .transpose()
            .map_err(Error::from)
    }

    /// Overwrite the value stored under `key`. File writes are atomic: readers see either the
    /// old or the new contents, never a partial file.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        validate_key(key)?;

        let contents = serde_json::to_string(value)?;

        match &mut *self.backend.write() {
            Backend::File(dir) => {
                let mut file = NamedTempFile::new_in(&*dir)?;
                file.write_all(contents.as_bytes())?;
                file.persist(dir.join(format!("{key}.json")))
                    .map_err(|e| e.error)?;
            }
            Backend::Memory(map) => {
                map.insert(key.to_string(), contents);
            }
        }

        trace!("Wrote storage key {key}");

        Ok(())
    }
}

/// Keys become file names, so anything that could escape the storage directory is rejected.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
        || key.chars().any(char::is_control)
    {
        return Err(Error::InvalidKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let storage = Storage::in_memory();

        let value: Option<Vec<u32>> = storage.get("records").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();

        storage.set("records", &vec![1, 2, 3]).unwrap();
        assert!(dir.path().join("records.json").exists());

        let reopened = Storage::open(dir.path()).unwrap();
        let value: Option<Vec<u32>> = reopened.get("records").unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_overwrite() {
        let storage = Storage::in_memory();

        storage.set("next_uid", &1u64).unwrap();
        storage.set("next_uid", &2u64).unwrap();

        assert_eq!(storage.get::<u64>("next_uid").unwrap(), Some(2));
    }

    #[test]
    fn test_invalid_keys() {
        let storage = Storage::in_memory();

        for key in ["", "../records", "a/b", "a\\b", "tab\there"] {
            assert!(matches!(
                storage.set(key, &0),
                Err(Error::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_malformed_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("records.json"), "not json").unwrap();

        let storage = Storage::open(dir.path()).unwrap();
        assert!(matches!(
            storage.get::<Vec<u32>>("records"),
            Err(Error::Json(_))
        ));
    }
}
