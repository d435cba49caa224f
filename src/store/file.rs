//! File-backed store
//!
//! `master.rec` format:
//! [4 bytes: version][4 bytes: kdf rounds]
//! [u32 len][salt][u32 len][passphrase hash][u32 len][wrapped vault key]
//! [8 bytes: created_at, unix seconds]
//!
//! `entries.dat` format:
//! [4 bytes: version][4 bytes: category count]
//! per category [u32 len][category JSON], then per entry
//! [u32 len][metadata JSON][u32 len][password envelope][u32 len][notes envelope]
//!
//! Envelopes are written as raw bytes. Every write goes to a temporary file
//! in the same directory which is fsynced and then moved into place.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::frame::{FrameReader, FrameWriter, FORMAT_VERSION};
use super::catalog::Catalog;
use super::{CategoryRecord, EntryDraft, EntryMeta, EntryStore, MasterRecord, MasterStore, StoredEntry};
use crate::config::paths::{ensure_data_dir, ENTRIES_FILE, MASTER_FILE};
use crate::crypto::EncryptedField;
use crate::error::{Result, VaultError};

/// Store rooted at a data directory
pub struct FileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles on `entries.dat`
    catalog_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_data_dir(&dir)?;
        Ok(Self {
            dir,
            catalog_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn master_path(&self) -> PathBuf {
        self.dir.join(MASTER_FILE)
    }

    fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }

    /// Write `data` to a synced temp file with restrictive permissions
    fn stage(&self, data: &[u8]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(data)?;
        file.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))?;
        }

        Ok(file)
    }

    fn read_catalog(&self) -> Result<Catalog> {
        let path = self.entries_path();
        if !path.exists() {
            return Ok(Catalog::default());
        }
        let data = fs::read(&path)?;
        decode_catalog(&data)
    }

    fn write_catalog(&self, catalog: &Catalog) -> Result<()> {
        let data = encode_catalog(catalog)?;
        let staged = self.stage(&data)?;
        staged.persist(self.entries_path()).map_err(|e| VaultError::Io(e.error))?;
        debug!(
            entries = catalog.entries.len(),
            categories = catalog.categories.len(),
            "entries file written"
        );
        Ok(())
    }

    /// Read the catalog under the lock
    fn snapshot(&self) -> Result<Catalog> {
        let _guard = self.catalog_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_catalog()
    }

    /// Run a read-modify-write cycle on the catalog under the lock. Nothing
    /// is written if `f` fails.
    fn modify_catalog<T>(&self, f: impl FnOnce(&mut Catalog) -> Result<T>) -> Result<T> {
        let _guard = self.catalog_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut catalog = self.read_catalog()?;
        let result = f(&mut catalog)?;
        self.write_catalog(&catalog)?;
        Ok(result)
    }
}

impl MasterStore for FileStore {
    fn load_master(&self) -> Result<Option<MasterRecord>> {
        let path = self.master_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_master(&data).map(Some)
    }

    fn insert_master(&self, record: &MasterRecord) -> Result<()> {
        let data = encode_master(record)?;
        let staged = self.stage(&data)?;

        match staged.persist_noclobber(self.master_path()) {
            Ok(_) => {
                debug!(path = %self.master_path().display(), "master record written");
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(VaultError::AlreadySetUp),
            Err(e) => Err(VaultError::Io(e.error)),
        }
    }
}

impl EntryStore for FileStore {
    fn list_entries(&self) -> Result<Vec<StoredEntry>> {
        Ok(self.snapshot()?.entries)
    }

    fn get_entry(&self, id: u64) -> Result<Option<StoredEntry>> {
        Ok(self.snapshot()?.get(id).cloned())
    }

    fn insert_entry(&self, meta: EntryMeta, password: EncryptedField, notes: EncryptedField) -> Result<u64> {
        self.modify_catalog(|catalog| {
            let id = catalog.max_id() + 1;
            catalog.insert(id, EntryDraft { meta, password, notes });
            Ok(id)
        })
    }

    fn insert_batch(&self, categories: &[CategoryRecord], drafts: Vec<EntryDraft>) -> Result<Vec<u64>> {
        self.modify_catalog(|catalog| {
            catalog.merge_categories(categories);
            let mut ids = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let id = catalog.max_id() + 1;
                catalog.insert(id, draft);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    fn update_entry(&self, entry: &StoredEntry) -> Result<()> {
        self.modify_catalog(|catalog| catalog.update(entry))
    }

    fn delete_entry(&self, id: u64) -> Result<()> {
        self.modify_catalog(|catalog| catalog.delete(id))
    }

    fn list_categories(&self) -> Result<Vec<CategoryRecord>> {
        Ok(self.snapshot()?.categories)
    }

    fn insert_category(&self, record: &CategoryRecord) -> Result<()> {
        self.modify_catalog(|catalog| catalog.insert_category(record))
    }

    fn update_category(&self, name: &str, record: &CategoryRecord) -> Result<()> {
        self.modify_catalog(|catalog| catalog.update_category(name, record))
    }

    fn delete_category(&self, name: &str) -> Result<usize> {
        self.modify_catalog(|catalog| catalog.delete_category(name))
    }
}

fn encode_master(record: &MasterRecord) -> Result<Vec<u8>> {
    let mut writer = FrameWriter::new();
    writer.put_u32(FORMAT_VERSION).put_u32(record.kdf_rounds);
    writer.put_bytes(&record.salt)?;
    writer.put_bytes(record.passphrase_hash.as_bytes())?;
    writer.put_bytes(&record.wrapped_vault_key)?;
    writer.put_i64(record.created_at.timestamp());
    Ok(writer.finish())
}

fn decode_master(data: &[u8]) -> Result<MasterRecord> {
    let mut reader = FrameReader::new(data, MASTER_FILE);
    reader.expect_version()?;
    let kdf_rounds = reader.get_u32()?;
    let salt = reader.get_bytes()?.to_vec();
    let passphrase_hash = String::from_utf8(reader.get_bytes()?.to_vec())
        .map_err(|_| VaultError::CorruptRecord(format!("{}: passphrase hash is not UTF-8", MASTER_FILE)))?;
    let wrapped_vault_key = reader.get_bytes()?.to_vec();
    let created_at = DateTime::from_timestamp(reader.get_i64()?, 0)
        .ok_or_else(|| VaultError::CorruptRecord(format!("{}: timestamp out of range", MASTER_FILE)))?;
    reader.expect_end()?;

    Ok(MasterRecord {
        passphrase_hash,
        wrapped_vault_key,
        salt,
        kdf_rounds,
        created_at,
    })
}

/// Metadata as written to disk: the entry id plus its clear-text fields
#[derive(Serialize, Deserialize)]
struct MetaFrame {
    id: u64,
    #[serde(flatten)]
    meta: EntryMeta,
}

fn encode_catalog(catalog: &Catalog) -> Result<Vec<u8>> {
    let mut writer = FrameWriter::new();
    let category_count = u32::try_from(catalog.categories.len())
        .map_err(|_| VaultError::InvalidInput("too many categories".into()))?;
    writer.put_u32(FORMAT_VERSION).put_u32(category_count);
    for category in &catalog.categories {
        writer.put_bytes(&serde_json::to_vec(category)?)?;
    }
    for entry in &catalog.entries {
        let frame = MetaFrame {
            id: entry.id,
            meta: entry.meta.clone(),
        };
        writer.put_bytes(&serde_json::to_vec(&frame)?)?;
        writer.put_bytes(entry.password.as_bytes())?;
        writer.put_bytes(entry.notes.as_bytes())?;
    }
    Ok(writer.finish())
}

fn decode_catalog(data: &[u8]) -> Result<Catalog> {
    let mut reader = FrameReader::new(data, ENTRIES_FILE);
    reader.expect_version()?;

    let category_count = reader.get_u32()?;
    let mut catalog = Catalog::default();
    for _ in 0..category_count {
        let category: CategoryRecord = serde_json::from_slice(reader.get_bytes()?)
            .map_err(|e| VaultError::CorruptRecord(format!("{}: bad category: {}", ENTRIES_FILE, e)))?;
        catalog.categories.push(category);
    }

    while !reader.is_at_end() {
        let frame: MetaFrame = serde_json::from_slice(reader.get_bytes()?)
            .map_err(|e| VaultError::CorruptRecord(format!("{}: bad entry metadata: {}", ENTRIES_FILE, e)))?;
        let password = EncryptedField::from_bytes(reader.get_bytes()?.to_vec());
        let notes = EncryptedField::from_bytes(reader.get_bytes()?.to_vec());
        catalog.entries.push(StoredEntry {
            id: frame.id,
            meta: frame.meta,
            password,
            notes,
        });
    }
    catalog.entries.sort_by_key(|e| e.id);
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{sample_master, sample_meta};

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("vault")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_master_absent_initially() {
        let (_dir, store) = store();
        assert!(store.load_master().unwrap().is_none());
    }

    #[test]
    fn test_master_roundtrip() {
        let (_dir, store) = store();
        let record = sample_master();

        store.insert_master(&record).unwrap();
        assert_eq!(store.load_master().unwrap(), Some(record));
    }

    #[test]
    fn test_second_master_is_already_set_up() {
        let (_dir, store) = store();
        let first = sample_master();
        let mut second = sample_master();
        second.salt = vec![0x22; 32];

        store.insert_master(&first).unwrap();
        assert!(matches!(store.insert_master(&second), Err(VaultError::AlreadySetUp)));
        assert_eq!(store.load_master().unwrap(), Some(first));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (_dir, store) = store();
        store.insert_master(&sample_master()).unwrap();
        let _ = store.insert_master(&sample_master());

        let names: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![MASTER_FILE.to_string()]);
    }

    #[test]
    fn test_truncated_master_is_corrupt() {
        let (_dir, store) = store();
        store.insert_master(&sample_master()).unwrap();
        let data = fs::read(store.master_path()).unwrap();
        fs::write(store.master_path(), &data[..data.len() - 3]).unwrap();

        assert!(matches!(store.load_master(), Err(VaultError::CorruptRecord(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_master_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store.insert_master(&sample_master()).unwrap();
        let mode = fs::metadata(store.master_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_entries_keep_raw_envelopes() {
        let (_dir, store) = store();
        // bytes that are neither valid UTF-8 nor JSON-safe
        let password = EncryptedField::from_bytes(vec![0x00, 0xFF, 0x22, 0x5C, 0x80]);
        let notes = EncryptedField::empty();

        let id = store.insert_entry(sample_meta("Mail"), password.clone(), notes).unwrap();
        let entry = store.get_entry(id).unwrap().unwrap();

        assert_eq!(entry.password, password);
        assert!(entry.notes.is_empty());
        assert_eq!(entry.meta.title, "Mail");
    }

    #[test]
    fn test_entry_ids_increase() {
        let (_dir, store) = store();
        let a = store
            .insert_entry(sample_meta("a"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();
        let b = store
            .insert_entry(sample_meta("b"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();

        assert!(b > a);
        let titles: Vec<_> = store
            .list_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.meta.title)
            .collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, store) = store();
        let id = store
            .insert_entry(sample_meta("old"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();

        let mut entry = store.get_entry(id).unwrap().unwrap();
        entry.meta.title = "new".to_string();
        store.update_entry(&entry).unwrap();
        assert_eq!(store.get_entry(id).unwrap().unwrap().meta.title, "new");

        store.delete_entry(id).unwrap();
        assert!(store.get_entry(id).unwrap().is_none());
        assert!(matches!(store.delete_entry(id), Err(VaultError::EntryNotFound(_))));
    }

    #[test]
    fn test_update_unknown_entry() {
        let (_dir, store) = store();
        let entry = StoredEntry {
            id: 42,
            meta: sample_meta("ghost"),
            password: EncryptedField::empty(),
            notes: EncryptedField::empty(),
        };
        assert!(matches!(store.update_entry(&entry), Err(VaultError::EntryNotFound(42))));
    }

    #[test]
    fn test_categories_survive_reopen() {
        let (dir, store) = store();
        let mut bank = CategoryRecord::named("Bank");
        bank.icon = "bank".to_string();
        bank.color = "#10b981".to_string();
        store.insert_category(&bank).unwrap();
        store
            .insert_entry(sample_meta("Mail"), EncryptedField::empty(), EncryptedField::empty())
            .unwrap();

        let reopened = FileStore::open(dir.path().join("vault")).unwrap();
        assert_eq!(
            reopened.list_categories().unwrap(),
            vec![bank, CategoryRecord::named("Email")]
        );
        assert_eq!(reopened.list_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_category_change_writes_nothing() {
        let (_dir, store) = store();
        store.insert_category(&CategoryRecord::named("Bank")).unwrap();
        let before = fs::read(store.entries_path()).unwrap();

        let result = store.insert_category(&CategoryRecord::named("Bank"));
        assert!(matches!(result, Err(VaultError::CategoryExists(_))));
        assert_eq!(fs::read(store.entries_path()).unwrap(), before);
    }

    #[test]
    fn test_batch_assigns_sequential_ids() {
        let (_dir, store) = store();
        let drafts: Vec<_> = (0..3)
            .map(|i| EntryDraft {
                meta: sample_meta(&format!("entry {}", i)),
                password: EncryptedField::from_bytes(vec![i; 40]),
                notes: EncryptedField::empty(),
            })
            .collect();

        let ids = store.insert_batch(&[], drafts).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        let entries = store.list_entries().unwrap();
        assert_eq!(entries[2].password.as_bytes(), &[2u8; 40][..]);
    }
}
