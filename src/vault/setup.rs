//! First-time vault creation

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use super::Vault;
use crate::crypto::{codec, kdf};
use crate::error::{Result, VaultError};
use crate::store::{MasterRecord, MasterStore};

impl<S: MasterStore> Vault<S> {
    /// Create the vault and leave it unlocked.
    ///
    /// The passphrase must be at least `min_passphrase_len` characters long
    /// (see [`VaultConfig`](crate::VaultConfig)); a shorter one fails with
    /// [`VaultError::PassphraseTooShort`] before any key is derived.
    ///
    /// All key material is produced before anything is written; the store's
    /// create-if-absent insert is the commit point. If another setup commits
    /// first this returns [`VaultError::AlreadySetUp`] and the freshly
    /// generated key is discarded without ever being loaded.
    pub fn setup(&self, passphrase: &SecretString) -> Result<()> {
        if self.store.load_master()?.is_some() {
            return Err(VaultError::AlreadySetUp);
        }

        let text = passphrase.expose_secret();
        if text.is_empty() {
            return Err(VaultError::InvalidInput("master passphrase must not be empty".into()));
        }
        if text.chars().count() < self.min_passphrase_len {
            return Err(VaultError::PassphraseTooShort(self.min_passphrase_len));
        }
        let secret = text.as_bytes();

        let salt = kdf::generate_salt();
        let master_key = kdf::derive_key(secret, &salt, self.kdf_rounds)?;
        let vault_key = codec::generate_vault_key();
        let wrapped_vault_key = codec::wrap(&vault_key, &master_key)?;
        let passphrase_hash = self.hasher.hash(secret)?;
        debug!(kdf_rounds = self.kdf_rounds, "vault key material prepared");

        let record = MasterRecord {
            passphrase_hash,
            wrapped_vault_key,
            salt: salt.to_vec(),
            kdf_rounds: self.kdf_rounds,
            created_at: Utc::now(),
        };
        self.store.insert_master(&record)?;

        self.state.load(vault_key);
        info!("vault initialized and unlocked");
        Ok(())
    }
}
