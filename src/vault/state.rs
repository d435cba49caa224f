//! Process-wide holder of the unlocked vault key
//!
//! The key lives behind an `RwLock`: loads and clears take the write lock,
//! readers borrow the key for the duration of a closure under the read lock.
//! A reader therefore sees either the full key or nothing, never a key that
//! is in the middle of being wiped.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::crypto::VaultKey;
use crate::error::{Result, VaultError};

static PROCESS_STATE: LazyLock<Arc<VaultKeyState>> = LazyLock::new(|| Arc::new(VaultKeyState::new()));

#[derive(Default)]
pub struct VaultKeyState {
    key: RwLock<Option<VaultKey>>,
}

impl VaultKeyState {
    /// A private, empty state. Most callers want [`VaultKeyState::process`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The single state shared by every vault handle in this process
    pub fn process() -> Arc<Self> {
        Arc::clone(&PROCESS_STATE)
    }

    /// Install `key`, wiping whatever was loaded before
    pub fn load(&self, key: VaultKey) {
        let mut slot = self.key.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(key);
    }

    /// Run `f` with the loaded key. The borrow cannot escape the closure.
    pub fn current<R>(&self, f: impl FnOnce(&VaultKey) -> R) -> Result<R> {
        let slot = self.key.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(f).ok_or(VaultError::NoVaultKeyLoaded)
    }

    /// Wipe and drop the key. Clearing an empty state is a no-op.
    pub fn clear(&self) {
        let mut slot = self.key.write().unwrap_or_else(PoisonError::into_inner);
        slot.take();
    }

    pub fn is_loaded(&self) -> bool {
        self.key.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl std::fmt::Debug for VaultKeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKeyState")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
