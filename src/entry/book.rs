//! Entry operations over an unlocked vault

use chrono::Utc;
use secrecy::SecretString;
use tracing::{debug, warn};

use super::{EntryOutcome, EntryPatch, EntryView, NewEntry};
use crate::error::{Result, VaultError};
use crate::store::{EntryStore, MasterStore, StoredEntry};
use crate::vault::Vault;

/// Encrypts on the way into `store` and decrypts on the way out, using
/// whatever key `vault` currently holds.
pub struct EntryBook<'a, M, E> {
    pub(super) vault: &'a Vault<M>,
    pub(super) store: &'a E,
}

impl<'a, M: MasterStore, E: EntryStore> EntryBook<'a, M, E> {
    pub fn new(vault: &'a Vault<M>, store: &'a E) -> Self {
        Self { vault, store }
    }

    pub fn add(&self, entry: &NewEntry) -> Result<u64> {
        entry.validate()?;
        let password = self.vault.encrypt_field(&entry.password)?;
        let notes = self.vault.encrypt_field(&entry.notes)?;

        let id = self.store.insert_entry(entry.meta(Utc::now()), password, notes)?;
        debug!(id, "entry added");
        Ok(id)
    }

    pub fn update(&self, id: u64, patch: &EntryPatch) -> Result<EntryView> {
        patch.validate()?;
        let mut stored = self.store.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;

        // Encrypt before touching the record so a locked vault changes nothing
        let password = patch
            .password
            .as_deref()
            .map(|p| self.vault.encrypt_field(p))
            .transpose()?;
        let notes = patch
            .notes
            .as_deref()
            .map(|n| self.vault.encrypt_field(n))
            .transpose()?;

        if let Some(password) = password {
            stored.password = password;
        }
        if let Some(notes) = notes {
            stored.notes = notes;
        }
        patch.apply_meta(&mut stored.meta, Utc::now());

        self.store.update_entry(&stored)?;
        debug!(id, "entry updated");
        self.decrypt(stored)
    }

    /// A single entry; decryption failure is an error here
    pub fn get(&self, id: u64) -> Result<EntryView> {
        let stored = self.store.get_entry(id)?.ok_or(VaultError::EntryNotFound(id))?;
        self.decrypt(stored)
    }

    pub fn remove(&self, id: u64) -> Result<()> {
        self.store.delete_entry(id)?;
        debug!(id, "entry removed");
        Ok(())
    }

    /// Every entry, with per-record decryption results
    pub fn list(&self) -> Result<Vec<EntryOutcome>> {
        self.ensure_unlocked()?;
        let stored = self.store.list_entries()?;
        Ok(stored.into_iter().map(|entry| self.outcome(entry)).collect())
    }

    /// Entries whose title, username or URL contains `query`, ignoring case.
    /// An empty query matches nothing.
    pub fn search(&self, query: &str) -> Result<Vec<EntryOutcome>> {
        self.ensure_unlocked()?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.store.list_entries()?;
        Ok(stored
            .into_iter()
            .filter(|entry| matches_query(entry, &query))
            .map(|entry| self.outcome(entry))
            .collect())
    }

    /// Listings must not degrade into a column of per-record "locked" failures
    pub(super) fn ensure_unlocked(&self) -> Result<()> {
        if self.vault.is_unlocked() {
            Ok(())
        } else {
            Err(VaultError::NoVaultKeyLoaded)
        }
    }

    fn outcome(&self, entry: StoredEntry) -> EntryOutcome {
        let id = entry.id;
        let title = entry.meta.title.clone();
        match self.decrypt(entry) {
            Ok(view) => EntryOutcome::Ok(view),
            Err(reason) => {
                warn!(id, error = %reason, "entry could not be decrypted");
                EntryOutcome::Failed { id, title, reason }
            }
        }
    }

    fn decrypt(&self, entry: StoredEntry) -> Result<EntryView> {
        let password = self.vault.decrypt_field(&entry.password)?;
        let notes = self.vault.decrypt_field(&entry.notes)?;
        let meta = entry.meta;

        Ok(EntryView {
            id: entry.id,
            title: meta.title,
            username: meta.username,
            url: meta.url,
            category: meta.category,
            tags: meta.tags,
            favorite: meta.favorite,
            password: SecretString::new(password),
            notes: SecretString::new(notes),
            created_at: meta.created_at,
            updated_at: meta.updated_at,
        })
    }
}

fn matches_query(entry: &StoredEntry, query: &str) -> bool {
    let meta = &entry.meta;
    meta.title.to_lowercase().contains(query)
        || meta
            .username
            .as_deref()
            .is_some_and(|u| u.to_lowercase().contains(query))
        || meta
            .url
            .as_deref()
            .is_some_and(|u| u.to_lowercase().contains(query))
}
