//! Credential entries
//!
//! Input comes in through [`NewEntry`] and [`EntryPatch`], both validated
//! before anything is encrypted or stored. Reads come back as [`EntryView`]
//! with secrets in [`SecretString`]; bulk reads return one [`EntryOutcome`]
//! per stored record so a single undecryptable record is flagged instead of
//! failing (or vanishing from) the whole listing.

mod book;
mod category;
mod transfer;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::store::EntryMeta;

pub use book::EntryBook;
pub use category::{CategoryPatch, CategorySummary, NewCategory, TagSummary, DEFAULT_CATEGORIES};
pub use transfer::{ExportDocument, ExportReport, ImportReport, EXPORT_VERSION};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_USERNAME_LEN: usize = 200;
pub const MAX_URL_LEN: usize = 500;
pub const MAX_LABEL_LEN: usize = 50;

/// A new credential as supplied by the user or an import file
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
}

impl std::fmt::Debug for NewEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewEntry")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("url", &self.url)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .field("favorite", &self.favorite)
            .finish_non_exhaustive()
    }
}

impl NewEntry {
    pub fn new(title: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_title(&self.title)?;
        check_optional("username", self.username.as_deref(), MAX_USERNAME_LEN)?;
        check_optional("url", self.url.as_deref(), MAX_URL_LEN)?;
        check_optional("category", self.category.as_deref(), MAX_LABEL_LEN)?;
        check_tags(&self.tags)
    }

    pub(crate) fn meta(&self, now: DateTime<Utc>) -> EntryMeta {
        EntryMeta {
            title: self.title.trim().to_string(),
            username: normalize(self.username.as_deref()),
            url: normalize(self.url.as_deref()),
            category: normalize(self.category.as_deref()),
            tags: normalize_tags(&self.tags),
            favorite: self.favorite,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves a field unchanged; for the optional text
/// fields `Some("")` clears the value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub favorite: Option<bool>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            check_title(title)?;
        }
        check_optional("username", self.username.as_deref(), MAX_USERNAME_LEN)?;
        check_optional("url", self.url.as_deref(), MAX_URL_LEN)?;
        check_optional("category", self.category.as_deref(), MAX_LABEL_LEN)?;
        if let Some(tags) = &self.tags {
            check_tags(tags)?;
        }
        Ok(())
    }

    /// Apply the non-sensitive part of the patch to stored metadata
    pub(crate) fn apply_meta(&self, meta: &mut EntryMeta, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            meta.title = title.trim().to_string();
        }
        if let Some(username) = &self.username {
            meta.username = normalize(Some(username));
        }
        if let Some(url) = &self.url {
            meta.url = normalize(Some(url));
        }
        if let Some(category) = &self.category {
            meta.category = normalize(Some(category));
        }
        if let Some(tags) = &self.tags {
            meta.tags = normalize_tags(tags);
        }
        if let Some(favorite) = self.favorite {
            meta.favorite = favorite;
        }
        meta.updated_at = now;
    }
}

/// A decrypted entry
#[derive(Debug)]
pub struct EntryView {
    pub id: u64,
    pub title: String,
    pub username: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub password: SecretString,
    pub notes: SecretString,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of decrypting one stored record during a bulk read
#[derive(Debug)]
pub enum EntryOutcome {
    Ok(EntryView),
    Failed {
        id: u64,
        title: String,
        reason: VaultError,
    },
}

impl EntryOutcome {
    pub fn id(&self) -> u64 {
        match self {
            EntryOutcome::Ok(view) => view.id,
            EntryOutcome::Failed { id, .. } => *id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            EntryOutcome::Ok(view) => &view.title,
            EntryOutcome::Failed { title, .. } => title,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, EntryOutcome::Ok(_))
    }

    pub fn ok(self) -> Option<EntryView> {
        match self {
            EntryOutcome::Ok(view) => Some(view),
            EntryOutcome::Failed { .. } => None,
        }
    }
}

fn check_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(VaultError::InvalidInput("title must not be empty".into()));
    }
    check_len("title", title, MAX_TITLE_LEN)
}

fn check_optional(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(value) => check_len(field, value.trim(), max),
        None => Ok(()),
    }
}

fn check_tags(tags: &[String]) -> Result<()> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(VaultError::InvalidInput("tags must not be empty".into()));
        }
        check_len("tag", tag.trim(), MAX_LABEL_LEN)?;
    }
    Ok(())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(VaultError::InvalidInput(format!(
            "{} is longer than {} characters",
            field, max
        )));
    }
    Ok(())
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()) {
        if !out.iter().any(|existing| existing == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_requires_title() {
        assert!(NewEntry::new("  ", "pw").validate().is_err());
        assert!(NewEntry::new("Mail", "").validate().is_ok());
    }

    #[test]
    fn test_new_entry_length_limits() {
        let mut entry = NewEntry::new("x".repeat(MAX_TITLE_LEN), "pw");
        assert!(entry.validate().is_ok());

        entry.url = Some("u".repeat(MAX_URL_LEN + 1));
        assert!(matches!(entry.validate(), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{"title": "Mail", "password": "pw", "pasword": "typo"}"#;
        assert!(serde_json::from_str::<NewEntry>(json).is_err());

        let json = r#"{"titel": "Mail"}"#;
        assert!(serde_json::from_str::<EntryPatch>(json).is_err());
    }

    #[test]
    fn test_missing_password_rejected() {
        let json = r#"{"title": "Mail"}"#;
        assert!(serde_json::from_str::<NewEntry>(json).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"title": "Mail", "password": "pw"}"#;
        let entry: NewEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.username, None);
        assert!(entry.tags.is_empty());
        assert!(!entry.favorite);
    }

    #[test]
    fn test_meta_normalizes() {
        let mut entry = NewEntry::new("  Mail ", "pw");
        entry.username = Some("   ".into());
        entry.tags = vec![" work ".into(), "work".into(), "home".into()];

        let meta = entry.meta(Utc::now());
        assert_eq!(meta.title, "Mail");
        assert_eq!(meta.username, None);
        assert_eq!(meta.tags, vec!["work", "home"]);
    }

    #[test]
    fn test_patch_apply() {
        let mut meta = NewEntry::new("Mail", "pw").meta(Utc::now());
        meta.url = Some("https://mail.example".into());

        let patch = EntryPatch {
            url: Some(String::new()),
            favorite: Some(true),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
        patch.apply_meta(&mut meta, Utc::now());

        assert_eq!(meta.url, None);
        assert!(meta.favorite);
        assert_eq!(meta.title, "Mail");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut entry = NewEntry::new("Mail", "hunter2");
        entry.notes = "pin 1234".into();
        let printed = format!("{:?}", entry);

        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("1234"));
    }
}
