//! Categories and tags
//!
//! Categories are stored records with an icon and a color. Tags are free-form
//! labels and only exist through the entries that carry them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{check_len, EntryBook, MAX_LABEL_LEN};
use crate::error::{Result, VaultError};
use crate::store::{CategoryRecord, EntryStore, MasterStore, StoredEntry};

/// Categories a new vault starts with: (name, icon, color)
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 5] = [
    ("Social", "social", "#3b82f6"),
    ("Banking", "bank", "#10b981"),
    ("Email", "email", "#f59e0b"),
    ("Work", "work", "#8b5cf6"),
    ("Other", "other", "#6366f1"),
];

/// A category to create. Missing icon and color fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn record(&self) -> CategoryRecord {
        let mut record = CategoryRecord::named(self.name.trim());
        if let Some(icon) = &self.icon {
            record.icon = icon.trim().to_string();
        }
        if let Some(color) = &self.color {
            record.color = color.trim().to_lowercase();
        }
        record
    }
}

/// Partial category update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, record: &mut CategoryRecord) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(icon) = &self.icon {
            record.icon = icon.trim().to_string();
        }
        if let Some(color) = &self.color {
            record.color = color.trim().to_lowercase();
        }
    }
}

/// A category with the number of entries filed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub icon: String,
    pub color: String,
    pub count: usize,
}

/// A tag with the number of entries carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub count: usize,
}

/// Reject records that could not have been created through the API
pub(super) fn validate_category(record: &CategoryRecord) -> Result<()> {
    if record.name.trim().is_empty() {
        return Err(VaultError::InvalidInput("category name must not be empty".into()));
    }
    check_len("category", &record.name, MAX_LABEL_LEN)?;
    if record.icon.is_empty() {
        return Err(VaultError::InvalidInput("category icon must not be empty".into()));
    }
    check_len("icon", &record.icon, MAX_LABEL_LEN)?;
    if !is_hex_color(&record.color) {
        return Err(VaultError::InvalidInput(format!(
            "color '{}' is not of the form #rrggbb",
            record.color
        )));
    }
    Ok(())
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl<M: MasterStore, E: EntryStore> EntryBook<'_, M, E> {
    /// Every category in creation order, with entry counts
    pub fn categories(&self) -> Result<Vec<CategorySummary>> {
        let entries = self.store.list_entries()?;
        let summaries = self
            .store
            .list_categories()?
            .into_iter()
            .map(|record| CategorySummary {
                count: count_in(&entries, &record.name),
                name: record.name,
                icon: record.icon,
                color: record.color,
            })
            .collect();
        Ok(summaries)
    }

    /// Every tag in use, sorted, with entry counts
    pub fn tags(&self) -> Result<Vec<TagSummary>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in self.store.list_entries()? {
            for tag in entry.meta.tags {
                *counts.entry(tag).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(name, count)| TagSummary { name, count })
            .collect())
    }

    pub fn create_category(&self, category: &NewCategory) -> Result<CategoryRecord> {
        self.ensure_unlocked()?;
        let record = category.record();
        validate_category(&record)?;

        self.store.insert_category(&record)?;
        debug!(name = %record.name, "category created");
        Ok(record)
    }

    /// Change a category. A new name moves the category's entries with it.
    pub fn update_category(&self, name: &str, patch: &CategoryPatch) -> Result<CategoryRecord> {
        self.ensure_unlocked()?;
        let mut record = self
            .store
            .list_categories()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| VaultError::CategoryNotFound(name.to_string()))?;
        patch.apply(&mut record);
        validate_category(&record)?;

        self.store.update_category(name, &record)?;
        debug!(from = name, to = %record.name, "category updated");
        Ok(record)
    }

    /// Delete a category. Its entries are kept without a category; the
    /// number of such entries is returned.
    pub fn delete_category(&self, name: &str) -> Result<usize> {
        self.ensure_unlocked()?;
        let detached = self.store.delete_category(name)?;
        debug!(name, detached, "category deleted");
        Ok(detached)
    }

    /// Create whichever of [`DEFAULT_CATEGORIES`] are missing. Returns how
    /// many were added.
    pub fn seed_default_categories(&self) -> Result<usize> {
        self.ensure_unlocked()?;
        let existing = self.store.list_categories()?;

        let mut added = 0;
        for (name, icon, color) in DEFAULT_CATEGORIES {
            if existing.iter().any(|c| c.name == name) {
                continue;
            }
            self.store.insert_category(&CategoryRecord {
                name: name.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
            })?;
            added += 1;
        }
        info!(added, "default categories seeded");
        Ok(added)
    }
}

fn count_in(entries: &[StoredEntry], category: &str) -> usize {
    entries
        .iter()
        .filter(|e| e.meta.category.as_deref() == Some(category))
        .count()
}
