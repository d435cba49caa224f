//! Symmetric key types
//!
//! Two keys exist in the vault:
//! - [`MasterKey`]: derived from the passphrase, lives only for the duration
//!   of a setup or unlock call and is used solely to wrap/unwrap the vault key
//! - [`VaultKey`]: random, generated once at setup, encrypts every field

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::SecureBytes;
use crate::error::{Result, VaultError};

/// Length of every symmetric key in the vault (256 bits)
pub const KEY_LEN: usize = 32;

/// Passphrase-derived key-encryption key
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    pub(crate) fn new(bytes: Zeroizing<[u8; KEY_LEN]>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// The data-encryption key, held in locked memory while the vault is unlocked
pub struct VaultKey(SecureBytes);

impl VaultKey {
    /// Fresh key from the OS CSPRNG
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(SecureBytes::new(bytes))
    }

    /// Adopt unwrapped key material, rejecting anything that is not exactly
    /// [`KEY_LEN`] bytes.
    pub(crate) fn from_secure(bytes: SecureBytes) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(VaultError::KeyUnwrapFailure);
        }
        Ok(Self(bytes))
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(SecureBytes::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}
