//! Vault key wrapping
//!
//! The vault key is sealed under the master key as an ordinary AEAD
//! envelope. Unwrap is the single gate that decides whether a derived master
//! key is the right one, so it never returns unauthenticated bytes.

use super::aead;
use super::keys::{MasterKey, VaultKey};
use crate::error::{Result, VaultError};

/// New random vault key. Called exactly once per vault, at setup.
pub fn generate_vault_key() -> VaultKey {
    VaultKey::generate()
}

/// Seal `vault_key` under `master_key`
///
/// # Returns
/// An AEAD envelope of 32 + [`aead::MIN_ENVELOPE_LEN`] bytes
///
/// # Security Notes
/// - Wrapping twice gives different bytes (fresh nonce), so the wrapped key
///   reveals nothing about whether two vaults share a vault key
pub fn wrap(vault_key: &VaultKey, master_key: &MasterKey) -> Result<Vec<u8>> {
    aead::seal(master_key.as_bytes(), vault_key.as_bytes())
}

/// Recover the vault key from its wrapped form.
///
/// # Arguments
/// * `wrapped` - Envelope produced by [`wrap`]
/// * `master_key` - Key derived from the candidate passphrase
///
/// # Errors
/// [`VaultError::KeyUnwrapFailure`] if the envelope does not authenticate
/// under `master_key` or does not hold exactly one key
pub fn unwrap(wrapped: &[u8], master_key: &MasterKey) -> Result<VaultKey> {
    let plaintext =
        aead::open(master_key.as_bytes(), wrapped).map_err(|_| VaultError::KeyUnwrapFailure)?;
    VaultKey::from_secure(plaintext)
}
