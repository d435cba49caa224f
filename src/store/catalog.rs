//! Category and entry bookkeeping shared by the store implementations
//!
//! Keeps one invariant: every category named by an entry has a
//! [`CategoryRecord`]. Names seen for the first time are registered with the
//! default icon and color.

use super::{CategoryRecord, EntryDraft, StoredEntry};
use crate::error::{Result, VaultError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Catalog {
    pub categories: Vec<CategoryRecord>,
    /// Ordered by id
    pub entries: Vec<StoredEntry>,
}

impl Catalog {
    pub fn max_id(&self) -> u64 {
        self.entries.iter().map(|e| e.id).max().unwrap_or(0)
    }

    pub fn get(&self, id: u64) -> Option<&StoredEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn category_index(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    fn register(&mut self, name: Option<&str>) {
        if let Some(name) = name {
            if self.category_index(name).is_none() {
                self.categories.push(CategoryRecord::named(name));
            }
        }
    }

    pub fn insert(&mut self, id: u64, draft: EntryDraft) {
        self.register(draft.meta.category.as_deref());
        self.entries.push(StoredEntry {
            id,
            meta: draft.meta,
            password: draft.password,
            notes: draft.notes,
        });
    }

    pub fn update(&mut self, entry: &StoredEntry) -> Result<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or(VaultError::EntryNotFound(entry.id))?;
        *slot = entry.clone();
        self.register(entry.meta.category.as_deref());
        Ok(())
    }

    pub fn delete(&mut self, id: u64) -> Result<()> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(VaultError::EntryNotFound(id))?;
        self.entries.remove(pos);
        Ok(())
    }

    /// Add categories that are missing by name; existing ones are kept as-is
    pub fn merge_categories(&mut self, categories: &[CategoryRecord]) {
        for category in categories {
            if self.category_index(&category.name).is_none() {
                self.categories.push(category.clone());
            }
        }
    }

    pub fn insert_category(&mut self, record: &CategoryRecord) -> Result<()> {
        if self.category_index(&record.name).is_some() {
            return Err(VaultError::CategoryExists(record.name.clone()));
        }
        self.categories.push(record.clone());
        Ok(())
    }

    /// Replace the category called `name`; a rename follows through to the
    /// entries filed under it
    pub fn update_category(&mut self, name: &str, record: &CategoryRecord) -> Result<()> {
        let index = self
            .category_index(name)
            .ok_or_else(|| VaultError::CategoryNotFound(name.to_string()))?;
        if record.name != name && self.category_index(&record.name).is_some() {
            return Err(VaultError::CategoryExists(record.name.clone()));
        }

        self.categories[index] = record.clone();
        if record.name != name {
            for entry in &mut self.entries {
                if entry.meta.category.as_deref() == Some(name) {
                    entry.meta.category = Some(record.name.clone());
                }
            }
        }
        Ok(())
    }

    /// Remove a category. Its entries stay, uncategorized. Returns how many
    /// entries were detached.
    pub fn delete_category(&mut self, name: &str) -> Result<usize> {
        let index = self
            .category_index(name)
            .ok_or_else(|| VaultError::CategoryNotFound(name.to_string()))?;
        self.categories.remove(index);

        let mut detached = 0;
        for entry in &mut self.entries {
            if entry.meta.category.as_deref() == Some(name) {
                entry.meta.category = None;
                detached += 1;
            }
        }
        Ok(detached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptedField;
    use crate::store::sample_meta;

    fn draft(title: &str, category: Option<&str>) -> EntryDraft {
        let mut meta = sample_meta(title);
        meta.category = category.map(str::to_string);
        EntryDraft {
            meta,
            password: EncryptedField::empty(),
            notes: EncryptedField::empty(),
        }
    }

    #[test]
    fn test_unknown_category_is_registered() {
        let mut catalog = Catalog::default();
        catalog.insert(1, draft("a", Some("Games")));
        catalog.insert(2, draft("b", Some("Games")));
        catalog.insert(3, draft("c", None));

        assert_eq!(catalog.categories, vec![CategoryRecord::named("Games")]);
    }

    #[test]
    fn test_rename_moves_entries() {
        let mut catalog = Catalog::default();
        catalog.insert(1, draft("a", Some("Mail")));
        catalog.insert(2, draft("b", Some("Work")));

        let mut renamed = CategoryRecord::named("Email");
        renamed.color = "#f59e0b".to_string();
        catalog.update_category("Mail", &renamed).unwrap();

        assert_eq!(catalog.get(1).unwrap().meta.category.as_deref(), Some("Email"));
        assert_eq!(catalog.get(2).unwrap().meta.category.as_deref(), Some("Work"));
        assert!(catalog.categories.contains(&renamed));
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let mut catalog = Catalog::default();
        catalog.insert(1, draft("a", Some("Mail")));
        catalog.insert(2, draft("b", Some("Work")));

        let result = catalog.update_category("Mail", &CategoryRecord::named("Work"));
        assert!(matches!(result, Err(VaultError::CategoryExists(_))));
        assert_eq!(catalog.get(1).unwrap().meta.category.as_deref(), Some("Mail"));
    }

    #[test]
    fn test_delete_category_detaches_entries() {
        let mut catalog = Catalog::default();
        catalog.insert(1, draft("a", Some("Mail")));
        catalog.insert(2, draft("b", Some("Mail")));

        assert_eq!(catalog.delete_category("Mail").unwrap(), 2);
        assert!(catalog.categories.is_empty());
        assert_eq!(catalog.entries.len(), 2);
        assert!(catalog.entries.iter().all(|e| e.meta.category.is_none()));
        assert!(matches!(
            catalog.delete_category("Mail"),
            Err(VaultError::CategoryNotFound(_))
        ));
    }

    #[test]
    fn test_merge_keeps_existing_style() {
        let mut catalog = Catalog::default();
        let mut bank = CategoryRecord::named("Bank");
        bank.icon = "bank".to_string();
        catalog.insert_category(&bank).unwrap();

        catalog.merge_categories(&[CategoryRecord::named("Bank"), CategoryRecord::named("Work")]);
        assert_eq!(catalog.categories.len(), 2);
        assert_eq!(catalog.categories[0].icon, "bank");
    }
}
