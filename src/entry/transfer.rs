//! Plaintext export and import
//!
//! The export document holds decrypted secrets. It exists so users can move
//! their data out of the vault; writing it anywhere is the caller's call.
//!
//! Categories travel with their icon and color. The tag list is informational;
//! tags are restored from the entries that carry them.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::category::validate_category;
use super::{EntryBook, EntryOutcome, EntryView, NewEntry};
use crate::error::{Result, VaultError};
use crate::store::{CategoryRecord, EntryDraft, EntryStore, MasterStore};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub entries: Vec<NewEntry>,
}

/// An export plus the records that could not be decrypted into it
#[derive(Debug)]
pub struct ExportReport {
    pub document: ExportDocument,
    pub failures: Vec<(u64, String, VaultError)>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<u64>,
}

impl<M: MasterStore, E: EntryStore> EntryBook<'_, M, E> {
    /// Decrypt every entry into an export document. Undecryptable records
    /// are listed in the report, not silently left out.
    pub fn export(&self) -> Result<ExportReport> {
        let mut entries = Vec::new();
        let mut failures = Vec::new();

        for outcome in self.list()? {
            match outcome {
                EntryOutcome::Ok(view) => entries.push(to_new_entry(view)),
                EntryOutcome::Failed { id, title, reason } => failures.push((id, title, reason)),
            }
        }

        let categories = self.store.list_categories()?;
        let tags = self.tags()?.into_iter().map(|t| t.name).collect();

        info!(exported = entries.len(), failed = failures.len(), "entries exported");
        Ok(ExportReport {
            document: ExportDocument {
                version: EXPORT_VERSION,
                exported_at: Utc::now(),
                categories,
                tags,
                entries,
            },
            failures,
        })
    }

    /// Validate the whole document, encrypt every entry, then store the lot
    /// in one step. Categories already present keep their icon and color.
    pub fn import(&self, document: &ExportDocument) -> Result<ImportReport> {
        if document.version != EXPORT_VERSION {
            return Err(VaultError::InvalidInput(format!(
                "unsupported export version {}",
                document.version
            )));
        }
        for category in &document.categories {
            validate_category(category)
                .map_err(|e| VaultError::InvalidInput(format!("category '{}': {}", category.name, e)))?;
        }
        for (index, entry) in document.entries.iter().enumerate() {
            entry.validate().map_err(|e| {
                VaultError::InvalidInput(format!("entry #{} ('{}'): {}", index + 1, entry.title, e))
            })?;
        }
        self.ensure_unlocked()?;

        let now = Utc::now();
        let drafts = document
            .entries
            .iter()
            .map(|entry| {
                Ok(EntryDraft {
                    meta: entry.meta(now),
                    password: self.vault.encrypt_field(&entry.password)?,
                    notes: self.vault.encrypt_field(&entry.notes)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let imported = self.store.insert_batch(&document.categories, drafts)?;
        info!(
            imported = imported.len(),
            categories = document.categories.len(),
            "entries imported"
        );
        Ok(ImportReport { imported })
    }
}

fn to_new_entry(view: EntryView) -> NewEntry {
    NewEntry {
        title: view.title,
        username: view.username,
        password: view.password.expose_secret().clone(),
        url: view.url,
        notes: view.notes.expose_secret().clone(),
        category: view.category,
        tags: view.tags,
        favorite: view.favorite,
    }
}
