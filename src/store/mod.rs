//! Persistence seam
//!
//! The vault core only needs two things from storage: a single-row
//! [`MasterRecord`] slot with create-if-absent semantics, and opaque storage
//! for entries whose sensitive fields are already [`EncryptedField`]s.
//!
//! Two implementations ship with the crate:
//! - [`FileStore`]: binary files in a data directory
//! - [`MemoryStore`]: in-process, for tests and embedders

mod catalog;
mod file;
mod frame;
mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::EncryptedField;
use crate::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// The singleton record written at setup
#[derive(Clone, PartialEq, Eq)]
pub struct MasterRecord {
    /// Argon2id PHC string
    pub passphrase_hash: String,
    /// Vault key sealed under the derived master key
    pub wrapped_vault_key: Vec<u8>,
    /// Key-derivation salt (distinct from the verifier's own salt)
    pub salt: Vec<u8>,
    /// PBKDF2 iteration count the master key was derived with
    pub kdf_rounds: u32,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for MasterRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterRecord")
            .field("salt_len", &self.salt.len())
            .field("wrapped_len", &self.wrapped_vault_key.len())
            .field("kdf_rounds", &self.kdf_rounds)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Non-sensitive entry fields. These are stored in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_CATEGORY_ICON: &str = "folder";
pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

/// A named group of entries with display hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRecord {
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
}

impl CategoryRecord {
    /// Category with the default icon and color
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: default_icon(),
            color: default_color(),
        }
    }
}

fn default_icon() -> String {
    DEFAULT_CATEGORY_ICON.to_string()
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

/// A new entry that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub meta: EntryMeta,
    pub password: EncryptedField,
    pub notes: EncryptedField,
}

/// An entry as persisted: metadata plus encrypted password and notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub id: u64,
    pub meta: EntryMeta,
    pub password: EncryptedField,
    pub notes: EncryptedField,
}

pub trait MasterStore: Send + Sync {
    /// The master record, if the vault has been set up
    fn load_master(&self) -> Result<Option<MasterRecord>>;

    /// Persist the master record.
    ///
    /// Must be atomic create-if-absent: if a record already exists this fails
    /// with [`VaultError::AlreadySetUp`](crate::VaultError::AlreadySetUp) and
    /// leaves the existing record untouched, and a partially written record is
    /// never observable.
    fn insert_master(&self, record: &MasterRecord) -> Result<()>;
}

/// Entries and the categories they are filed under.
///
/// Every category an entry names has a [`CategoryRecord`]: inserting or
/// updating an entry with a new category name registers it with the default
/// icon and color.
pub trait EntryStore: Send + Sync {
    /// All entries ordered by id
    fn list_entries(&self) -> Result<Vec<StoredEntry>>;

    fn get_entry(&self, id: u64) -> Result<Option<StoredEntry>>;

    /// Store a new entry and return its assigned id
    fn insert_entry(&self, meta: EntryMeta, password: EncryptedField, notes: EncryptedField) -> Result<u64>;

    /// Add the missing `categories` (matched by name) and every draft in one
    /// step. Either all of it is stored or none of it is. Returns the new
    /// ids in draft order.
    fn insert_batch(&self, categories: &[CategoryRecord], drafts: Vec<EntryDraft>) -> Result<Vec<u64>>;

    /// Replace an existing entry; `EntryNotFound` if the id is unknown
    fn update_entry(&self, entry: &StoredEntry) -> Result<()>;

    /// Delete an entry; `EntryNotFound` if the id is unknown
    fn delete_entry(&self, id: u64) -> Result<()>;

    /// All categories in creation order
    fn list_categories(&self) -> Result<Vec<CategoryRecord>>;

    /// `CategoryExists` if the name is taken
    fn insert_category(&self, record: &CategoryRecord) -> Result<()>;

    /// Replace the category called `name`. Renaming moves its entries along.
    fn update_category(&self, name: &str, record: &CategoryRecord) -> Result<()>;

    /// Remove a category and leave its entries uncategorized. Returns the
    /// number of entries that were detached.
    fn delete_category(&self, name: &str) -> Result<usize>;
}

#[cfg(test)]
pub(crate) fn sample_master() -> MasterRecord {
    MasterRecord {
        passphrase_hash: "$argon2id$v=19$m=8192,t=1,p=1$c2FsdA$aGFzaA".to_string(),
        wrapped_vault_key: vec![0xAB; 60],
        salt: vec![0x11; 32],
        kdf_rounds: 100_000,
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
    }
}

#[cfg(test)]
pub(crate) fn sample_meta(title: &str) -> EntryMeta {
    let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    EntryMeta {
        title: title.to_string(),
        username: Some("alice".to_string()),
        url: None,
        category: Some("Email".to_string()),
        tags: vec!["personal".to_string()],
        favorite: false,
        created_at: now,
        updated_at: now,
    }
}
