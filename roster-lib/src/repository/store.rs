use tracing::debug;

use crate::{
    repository::{
        Error, Result,
        models::{Record, RecordData, RecordId},
        storage::Storage,
    },
    validation::validate_form,
};

const NEXT_UID_KEY: &str = "next_uid";

/// The ordered sequence of records, mirrored to [`Storage`].
///
/// Every mutation goes through [`RecordStore::commit`], which writes the new sequence out
/// before it replaces the in-memory one. Storage and memory therefore never diverge, even if
/// a write fails.
#[derive(Debug)]
pub struct RecordStore {
    storage: Storage,
    key: String,
    records: Vec<Record>,
    next_uid: u64,
}

impl RecordStore {
    /// Load the record sequence stored under `key`. A missing key yields an empty store.
    pub fn load(storage: Storage, key: &str) -> Result<Self> {
        let records: Vec<Record> = storage.get(key)?.unwrap_or_default();

        // Never hand out an id at or below one already in use, even if the counter was lost.
        let stored_uid: u64 = storage.get(NEXT_UID_KEY)?.unwrap_or_default();
        let next_uid = records
            .iter()
            .map(|r| r.id().get().saturating_add(1))
            .fold(stored_uid, u64::max);

        debug!("Loaded {} records from '{key}'", records.len());

        Ok(Self {
            storage,
            key: key.to_string(),
            records,
            next_uid,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// The current position of a record in the sequence.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Add a record at the end. No deduplication is performed.
    pub fn append(&mut self, data: RecordData) -> Result<Record> {
        admit(&data)?;

        let record = Record::new(RecordId::from(self.next_uid), data);
        let mut records = self.records.clone();
        records.push(record.clone());

        self.commit(records, self.next_uid.saturating_add(1))?;

        debug!("Created record {}", record.id());

        Ok(record)
    }

    /// Replace the record at `index`, keeping its id.
    pub fn replace_at(&mut self, index: usize, data: RecordData) -> Result<Record> {
        admit(&data)?;

        let mut records = self.records.clone();
        let len = records.len();
        let slot = records
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;

        let record = Record::new(slot.id(), data);
        *slot = record.clone();

        self.commit(records, self.next_uid)?;

        debug!("Updated record {}", record.id());

        Ok(record)
    }

    /// Remove the record at `index`. Records after it shift down by one.
    pub fn delete_at(&mut self, index: usize) -> Result<Record> {
        let len = self.records.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }

        let mut records = self.records.clone();
        let removed = records.remove(index);

        self.commit(records, self.next_uid)?;

        debug!("Removed record {}", removed.id());

        Ok(removed)
    }

    pub fn update(&mut self, id: RecordId, data: RecordData) -> Result<Record> {
        let index = self.position(id).ok_or(Error::RecordNotFound(id))?;
        self.replace_at(index, data)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Record> {
        let index = self.position(id).ok_or(Error::RecordNotFound(id))?;
        self.delete_at(index)
    }

    fn commit(&mut self, records: Vec<Record>, next_uid: u64) -> Result<()> {
        if next_uid != self.next_uid {
            self.storage.set(NEXT_UID_KEY, &next_uid)?;
            self.next_uid = next_uid;
        }

        self.storage.set(&self.key, &records)?;
        self.records = records;

        Ok(())
    }
}

/// Only records whose name, email and phone pass validation may enter the store.
fn admit(data: &RecordData) -> Result<()> {
    let errors = validate_form(&data.name, &data.email, &data.phone);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Rejected(errors))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn data(name: &str) -> RecordData {
        RecordData {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: "9841000000".into(),
            country: "Nepal".into(),
            ..Default::default()
        }
    }

    fn store() -> RecordStore {
        RecordStore::load(Storage::in_memory(), "records").unwrap()
    }

    fn names(store: &RecordStore) -> Vec<&str> {
        store.records().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_append() {
        let mut store = store();

        let first = store.append(data("Ram")).unwrap();
        let second = store.append(data("Ram")).unwrap();

        assert_eq!(store.len(), 2);
        assert_ne!(first.id(), second.id());
        assert_eq!(names(&store), ["Ram", "Ram"]);
    }

    #[test]
    fn test_append_then_delete_round_trip() {
        let mut store = store();
        store.append(data("Ram")).unwrap();
        store.append(data("Sita")).unwrap();
        let before = store.records().to_vec();

        let added = store.append(data("Hari")).unwrap();
        let index = store.position(added.id()).unwrap();
        let removed = store.delete_at(index).unwrap();

        assert_eq!(removed, added);
        assert_eq!(store.records(), before.as_slice());
    }

    #[test]
    fn test_replace_at_keeps_id() {
        let mut store = store();
        let original = store.append(data("Ram")).unwrap();

        let replaced = store.replace_at(0, data("Shyam")).unwrap();

        assert_eq!(replaced.id(), original.id());
        assert_eq!(names(&store), ["Shyam"]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = store();
        store.append(data("Ram")).unwrap();

        assert!(matches!(
            store.replace_at(1, data("Sita")),
            Err(Error::IndexOutOfBounds { index: 1, len: 1 })
        ));
        assert!(matches!(
            store.delete_at(5),
            Err(Error::IndexOutOfBounds { index: 5, len: 1 })
        ));
        assert_eq!(names(&store), ["Ram"]);
    }

    #[test]
    fn test_delete_shifts_positions() {
        let mut store = store();
        store.append(data("A")).unwrap();
        let b = store.append(data("B")).unwrap();
        let c = store.append(data("C")).unwrap();

        assert_eq!(store.position(c.id()), Some(2));
        store.remove(b.id()).unwrap();
        assert_eq!(store.position(c.id()), Some(1));
        assert!(matches!(
            store.remove(b.id()),
            Err(Error::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_records() {
        let mut store = store();

        let mut invalid = data("Ram");
        invalid.phone = "123".into();

        assert!(matches!(store.append(invalid), Err(Error::Rejected(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let storage = Storage::in_memory();
        let mut store = RecordStore::load(storage.clone(), "records").unwrap();

        let reload = || RecordStore::load(storage.clone(), "records").unwrap();

        let ram = store.append(data("Ram")).unwrap();
        assert_eq!(names(&reload()), ["Ram"]);

        store.update(ram.id(), data("Hari")).unwrap();
        assert_eq!(names(&reload()), ["Hari"]);

        store.remove(ram.id()).unwrap();
        assert!(reload().is_empty());
    }

    #[test]
    fn test_ids_are_not_reused() {
        let storage = Storage::in_memory();
        let mut store = RecordStore::load(storage.clone(), "records").unwrap();

        let ram = store.append(data("Ram")).unwrap();
        store.remove(ram.id()).unwrap();

        let mut reloaded = RecordStore::load(storage, "records").unwrap();
        let sita = reloaded.append(data("Sita")).unwrap();

        assert!(sita.id() > ram.id());
    }
}
