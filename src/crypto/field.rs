//! Per-field encryption for sensitive entry values
//!
//! An [`EncryptedField`] is either empty, meaning "no value" (never
//! encrypted), or an AEAD envelope. Storage layers keep these bytes as-is
//! and never look inside.

use super::aead;
use super::keys::VaultKey;
use crate::error::{Result, VaultError};

/// Opaque stored form of a sensitive field
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EncryptedField(Vec<u8>);

impl EncryptedField {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Debug for EncryptedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EncryptedField").field(&self.0.len()).finish()
    }
}

/// Encrypt a field value. The empty string maps to the empty field.
///
/// # Security Notes
/// - Each call uses its own nonce, so equal passwords in two entries are
///   stored as unrelated bytes
/// - An empty field shows that a value is absent; its length is not hidden
pub fn encrypt(plaintext: &str, key: &VaultKey) -> Result<EncryptedField> {
    if plaintext.is_empty() {
        return Ok(EncryptedField::empty());
    }
    aead::seal(key.as_bytes(), plaintext.as_bytes()).map(EncryptedField)
}

/// Decrypt a field value. The empty field maps to the empty string.
///
/// # Errors
/// [`VaultError::FieldDecryptFailure`] if:
/// - The envelope fails authentication (wrong key or tampered bytes)
/// - The plaintext is not UTF-8
pub fn decrypt(field: &EncryptedField, key: &VaultKey) -> Result<String> {
    if field.is_empty() {
        return Ok(String::new());
    }
    let plaintext =
        aead::open(key.as_bytes(), field.as_bytes()).map_err(|_| VaultError::FieldDecryptFailure)?;
    let text = std::str::from_utf8(&plaintext).map_err(|_| VaultError::FieldDecryptFailure)?;
    Ok(text.to_owned())
}
