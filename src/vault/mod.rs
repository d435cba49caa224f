//! Vault key lifecycle
//!
//! [`Vault`] ties the crypto primitives to a [`MasterStore`] and a
//! [`VaultKeyState`]:
//!
//! ```text
//! Uninitialized --setup--> Unlocked --lock--> Locked --unlock--> Unlocked
//! ```
//!
//! While unlocked, [`Vault::encrypt_field`] and [`Vault::decrypt_field`] use
//! the loaded vault key; while locked they fail with
//! [`VaultError::NoVaultKeyLoaded`](crate::VaultError::NoVaultKeyLoaded).

mod setup;
mod state;
mod task;
mod unlock;

use std::sync::Arc;

use crate::config::VaultConfig;
use crate::crypto::{field, EncryptedField, PassphraseHasher};
use crate::error::Result;
use crate::store::MasterStore;

pub use state::VaultKeyState;
pub use unlock::UnlockGuard;

/// Where the vault is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    Uninitialized,
    Locked,
    Unlocked,
}

/// Handle to a vault. Cheap to clone; clones share the store and key state.
pub struct Vault<S> {
    store: Arc<S>,
    state: Arc<VaultKeyState>,
    hasher: PassphraseHasher,
    kdf_rounds: u32,
    /// Shortest master passphrase, in characters, that setup accepts
    min_passphrase_len: usize,
}

impl<S> Clone for Vault<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
            hasher: self.hasher.clone(),
            kdf_rounds: self.kdf_rounds,
            min_passphrase_len: self.min_passphrase_len,
        }
    }
}

impl<S> std::fmt::Debug for Vault<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("state", &self.state)
            .field("hasher", &self.hasher)
            .field("kdf_rounds", &self.kdf_rounds)
            .field("min_passphrase_len", &self.min_passphrase_len)
            .finish()
    }
}

impl<S: MasterStore> Vault<S> {
    /// Vault backed by the process-wide key state
    pub fn new(store: Arc<S>, config: &VaultConfig) -> Result<Self> {
        Self::with_state(store, config, VaultKeyState::process())
    }

    /// Vault with an explicit key state, for isolated instances
    pub fn with_state(store: Arc<S>, config: &VaultConfig, state: Arc<VaultKeyState>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            state,
            hasher: PassphraseHasher::new(&config.hasher)?,
            kdf_rounds: config.kdf_rounds,
            min_passphrase_len: config.min_passphrase_len,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key_state(&self) -> &VaultKeyState {
        &self.state
    }

    /// Whether a master record exists
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.store.load_master()?.is_some())
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn status(&self) -> Result<VaultStatus> {
        if !self.is_initialized()? {
            Ok(VaultStatus::Uninitialized)
        } else if self.is_unlocked() {
            Ok(VaultStatus::Unlocked)
        } else {
            Ok(VaultStatus::Locked)
        }
    }

    /// Encrypt a sensitive value under the loaded vault key
    pub fn encrypt_field(&self, text: &str) -> Result<EncryptedField> {
        self.state.current(|key| field::encrypt(text, key))?
    }

    /// Decrypt a value produced by [`Vault::encrypt_field`]
    pub fn decrypt_field(&self, envelope: &EncryptedField) -> Result<String> {
        self.state.current(|key| field::decrypt(envelope, key))?
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::MemoryStore;

    /// Isolated, low-cost vault over an in-memory store
    pub fn memory_vault() -> Vault<MemoryStore> {
        Vault::with_state(
            Arc::new(MemoryStore::new()),
            &VaultConfig::for_tests(""),
            Arc::new(VaultKeyState::new()),
        )
        .unwrap()
    }
}
