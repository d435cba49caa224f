//! In-process store

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::catalog::Catalog;
use super::{CategoryRecord, EntryDraft, EntryMeta, EntryStore, MasterRecord, MasterStore, StoredEntry};
use crate::crypto::EncryptedField;
use crate::error::{Result, VaultError};

#[derive(Default)]
struct Inner {
    master: Option<MasterRecord>,
    catalog: Catalog,
    next_id: u64,
}

impl Inner {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Keeps everything behind a single mutex. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the stored master record unconditionally
    #[cfg(test)]
    pub(crate) fn replace_master(&self, record: MasterRecord) {
        self.lock().master = Some(record);
    }
}

impl MasterStore for MemoryStore {
    fn load_master(&self) -> Result<Option<MasterRecord>> {
        Ok(self.lock().master.clone())
    }

    fn insert_master(&self, record: &MasterRecord) -> Result<()> {
        let mut inner = self.lock();
        if inner.master.is_some() {
            return Err(VaultError::AlreadySetUp);
        }
        inner.master = Some(record.clone());
        Ok(())
    }
}

impl EntryStore for MemoryStore {
    fn list_entries(&self) -> Result<Vec<StoredEntry>> {
        Ok(self.lock().catalog.entries.clone())
    }

    fn get_entry(&self, id: u64) -> Result<Option<StoredEntry>> {
        Ok(self.lock().catalog.get(id).cloned())
    }

    fn insert_entry(&self, meta: EntryMeta, password: EncryptedField, notes: EncryptedField) -> Result<u64> {
        let mut inner = self.lock();
        let id = inner.allocate_id();
        inner.catalog.insert(id, EntryDraft { meta, password, notes });
        Ok(id)
    }

    fn insert_batch(&self, categories: &[CategoryRecord], drafts: Vec<EntryDraft>) -> Result<Vec<u64>> {
        let mut inner = self.lock();
        inner.catalog.merge_categories(categories);
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = inner.allocate_id();
            inner.catalog.insert(id, draft);
            ids.push(id);
        }
        Ok(ids)
    }

    fn update_entry(&self, entry: &StoredEntry) -> Result<()> {
        self.lock().catalog.update(entry)
    }

    fn delete_entry(&self, id: u64) -> Result<()> {
        self.lock().catalog.delete(id)
    }

    fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.lock().catalog.categories.clone())
    }

    fn insert_category(&self, record: &CategoryRecord) -> Result<()> {
        self.lock().catalog.insert_category(record)
    }

    fn update_category(&self, name: &str, record: &CategoryRecord) -> Result<()> {
        self.lock().catalog.update_category(name, record)
    }

    fn delete_category(&self, name: &str) -> Result<usize> {
        self.lock().catalog.delete_category(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{sample_master, sample_meta};

    #[test]
    fn test_insert_master_once() {
        let store = MemoryStore::new();
        store.insert_master(&sample_master()).unwrap();

        assert!(matches!(
            store.insert_master(&sample_master()),
            Err(VaultError::AlreadySetUp)
        ));
        assert!(store.load_master().unwrap().is_some());
    }

    #[test]
    fn test_entry_crud() {
        let store = MemoryStore::new();
        let id = store
            .insert_entry(sample_meta("Bank"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();

        assert_eq!(store.list_entries().unwrap().len(), 1);
        store.delete_entry(id).unwrap();
        assert!(store.get_entry(id).unwrap().is_none());
        assert!(matches!(store.delete_entry(id), Err(VaultError::EntryNotFound(_))));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let first = store
            .insert_entry(sample_meta("a"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();
        store.delete_entry(first).unwrap();
        let second = store
            .insert_entry(sample_meta("b"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_batch_assigns_ids_in_order() {
        let store = MemoryStore::new();
        let drafts = ["a", "b", "c"]
            .into_iter()
            .map(|title| EntryDraft {
                meta: sample_meta(title),
                password: EncryptedField::empty(),
                notes: EncryptedField::empty(),
            })
            .collect();

        let ids = store.insert_batch(&[CategoryRecord::named("Bank")], drafts).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let names: Vec<_> = store.list_categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bank", "Email"]);
    }
}
