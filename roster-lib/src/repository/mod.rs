use std::{io, sync::Arc};

use parking_lot::RwLock;
use thiserror::Error;

use crate::{
    query::{Page, Query},
    repository::{
        config::{Cfg, CoreConfig},
        storage::Storage,
        store::RecordStore,
    },
    validation::FormErrors,
};

pub mod config;
mod models;
mod storage;
mod store;

pub use models::{DateOfBirth, Image, Province, Record, RecordData, RecordId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed stored data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("Index {index} is out of bounds for {len} records")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("No record with id {0}")]
    RecordNotFound(RecordId),
    #[error("Record rejected: {0}")]
    Rejected(FormErrors),
}

/// Central access point for all persistent data.
///
/// The [`Repository`] owns the record store and the configuration it was opened with. Clones
/// share the same underlying store, so a clone can be moved onto a blocking task and the
/// results are visible everywhere.
#[derive(Clone, Debug)]
pub struct Repository {
    store: Arc<RwLock<RecordStore>>,
    cfg: Cfg,
}

impl Repository {
    /// Open the repository described by the user's `core.toml`.
    pub fn new() -> crate::Result<Self> {
        Self::with_config(CoreConfig::load()?)
    }

    pub fn with_config(cfg: CoreConfig) -> crate::Result<Self> {
        let storage = Storage::open(cfg.resolve_data_dir().map_err(Error::from)?)?;
        let store = RecordStore::load(storage, cfg.storage().records_key())?;

        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            cfg: Arc::new(RwLock::new(cfg)),
        })
    }

    pub fn config(&self) -> Cfg {
        self.cfg.clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.store.read().records().to_vec()
    }

    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.store.read().get(id).cloned()
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.store.read().position(id)
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    pub fn add_record(&self, data: RecordData) -> Result<Record> {
        self.store.write().append(data)
    }

    pub fn update_record(&self, id: RecordId, data: RecordData) -> Result<Record> {
        self.store.write().update(id, data)
    }

    pub fn remove_record(&self, id: RecordId) -> Result<Record> {
        self.store.write().remove(id)
    }

    pub fn replace_at(&self, index: usize, data: RecordData) -> Result<Record> {
        self.store.write().replace_at(index, data)
    }

    pub fn delete_at(&self, index: usize) -> Result<Record> {
        self.store.write().delete_at(index)
    }

    /// Derive the visible page for `query` from the current records.
    pub fn page(&self, query: &Query) -> Page {
        query.apply(self.store.read().records())
    }

    /// Remove a record on behalf of a paged view, moving the view back a page if the removal
    /// emptied it.
    pub fn remove_from_view(&self, id: RecordId, query: &mut Query) -> Result<Record> {
        let mut store = self.store.write();
        let removed = store.remove(id)?;
        query.after_delete(store.records());

        Ok(removed)
    }

    #[cfg(test)]
    /// Return a mock version of a [`Repository`] with in-memory storage and a mock
    /// configuration.
    pub(crate) fn mock() -> Self {
        let cfg = CoreConfig::mock();
        let store = RecordStore::load(Storage::in_memory(), cfg.storage().records_key())
            .expect("in-memory storage can always be loaded");

        Self {
            store: Arc::new(RwLock::new(store)),
            cfg: Arc::new(RwLock::new(cfg)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repository::store::test::data;

    #[test]
    fn test_with_config_persists_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = CoreConfig::default();
        cfg.set_data_dir(dir.path());

        let repo = Repository::with_config(cfg.clone()).unwrap();
        let ram = repo.add_record(data("Ram")).unwrap();

        assert!(dir.path().join("records.json").exists());

        let reopened = Repository::with_config(cfg).unwrap();
        assert_eq!(reopened.records(), vec![ram]);
    }

    #[test]
    fn test_clones_share_the_store() {
        let repo = Repository::mock();
        let clone = repo.clone();

        clone.add_record(data("Sita")).unwrap();

        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_remove_from_view_retreats() {
        let repo = Repository::mock();
        let ids: Vec<RecordId> = (1..=6)
            .map(|i| repo.add_record(data(&format!("R{i}"))).unwrap().id())
            .collect();

        let mut query = Query::default();
        assert!(query.next_page(repo.records().as_slice()));
        assert_eq!(query.page(), 2);

        repo.remove_from_view(*ids.last().unwrap(), &mut query)
            .unwrap();

        assert_eq!(query.page(), 1);
        let names: Vec<String> = repo
            .page(&query)
            .rows()
            .iter()
            .map(|row| row.record.name.clone())
            .collect();
        assert_eq!(names, ["R1", "R2", "R3", "R4", "R5"]);
    }
}
