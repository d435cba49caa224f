//! Async entry points
//!
//! Setup and unlock spend most of their time in Argon2id and PBKDF2. Running
//! them on an async worker would stall every other task scheduled there, so
//! these wrappers move the work onto tokio's blocking pool. Dropping the
//! returned future does not stop the computation; its result is discarded.

use secrecy::SecretString;

use super::{UnlockGuard, Vault};
use crate::error::{Result, VaultError};
use crate::store::MasterStore;

impl<S: MasterStore + 'static> Vault<S> {
    /// [`Vault::setup`] on the blocking pool
    pub async fn setup_async(&self, passphrase: SecretString) -> Result<()> {
        let vault = self.clone();
        run_blocking(move || vault.setup(&passphrase)).await
    }

    /// [`Vault::unlock`] on the blocking pool
    pub async fn unlock_async(&self, passphrase: SecretString) -> Result<()> {
        let vault = self.clone();
        run_blocking(move || vault.unlock(&passphrase)).await
    }

    /// [`Vault::unlock_guarded`] on the blocking pool
    pub async fn unlock_guarded_async(&self, passphrase: SecretString) -> Result<UnlockGuard<'_, S>> {
        self.unlock_async(passphrase).await?;
        Ok(UnlockGuard { vault: self })
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VaultError::TaskFailed(e.to_string()))?
}
