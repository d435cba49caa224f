//! Unlock and lock

use std::ops::Deref;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

use super::Vault;
use crate::crypto::{codec, kdf, PassphraseHasher};
use crate::error::{Result, VaultError};
use crate::store::MasterStore;

impl<S: MasterStore> Vault<S> {
    /// Verify `passphrase` and load the vault key.
    ///
    /// Every way of refusing the passphrase (no vault, hash mismatch, a
    /// master key that does not authenticate the wrapped key, a corrupted
    /// record) is reported as [`VaultError::InvalidPassphrase`]. On any
    /// failure the key state is left empty.
    ///
    /// # Shared state
    ///
    /// The key state belongs to the whole process (see
    /// [`VaultKeyState::process`](super::VaultKeyState::process)) unless the
    /// vault was built with [`Vault::with_state`]. A failed unlock therefore
    /// also clears a key that another handle or [`UnlockGuard`] loaded, and
    /// that holder's next field operation fails with
    /// [`VaultError::NoVaultKeyLoaded`].
    pub fn unlock(&self, passphrase: &SecretString) -> Result<()> {
        let result = self.try_unlock(passphrase);
        if result.is_err() {
            self.state.clear();
        }
        result
    }

    fn try_unlock(&self, passphrase: &SecretString) -> Result<()> {
        let record = match self.store.load_master() {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("unlock attempted on an uninitialized vault");
                return Err(VaultError::InvalidPassphrase);
            }
            Err(VaultError::CorruptRecord(detail)) => {
                warn!(%detail, "master record unreadable");
                return Err(VaultError::InvalidPassphrase);
            }
            Err(e) => return Err(e),
        };

        let secret = passphrase.expose_secret().as_bytes();

        // Cheap rejection before the slow derivation
        if !PassphraseHasher::verify(&record.passphrase_hash, secret) {
            debug!("passphrase rejected by verifier");
            return Err(VaultError::InvalidPassphrase);
        }

        let vault_key = kdf::derive_key(secret, &record.salt, record.kdf_rounds)
            .and_then(|master_key| codec::unwrap(&record.wrapped_vault_key, &master_key))
            .map_err(|e| {
                // The verifier accepted this passphrase, so the record disagrees with itself
                error!(error = %e, "passphrase verified but vault key could not be recovered");
                VaultError::InvalidPassphrase
            })?;

        self.state.load(vault_key);
        info!("vault unlocked");
        Ok(())
    }

    /// Wipe the vault key. Locking a locked vault does nothing.
    pub fn lock(&self) {
        if self.state.is_loaded() {
            info!("vault locked");
        }
        self.state.clear();
    }

    /// End the session; same effect as [`Vault::lock`]
    pub fn logout(&self) {
        self.lock();
    }

    /// Unlock and return a guard that locks the vault again when dropped
    pub fn unlock_guarded(&self, passphrase: &SecretString) -> Result<UnlockGuard<'_, S>> {
        self.unlock(passphrase)?;
        Ok(UnlockGuard { vault: self })
    }
}

/// Keeps the vault unlocked for its lifetime
pub struct UnlockGuard<'a, S: MasterStore> {
    pub(super) vault: &'a Vault<S>,
}

impl<S: MasterStore> Deref for UnlockGuard<'_, S> {
    type Target = Vault<S>;

    fn deref(&self) -> &Self::Target {
        self.vault
    }
}

impl<S: MasterStore> Drop for UnlockGuard<'_, S> {
    fn drop(&mut self) {
        self.vault.lock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{aead, EncryptedField};
    use crate::vault::testing::memory_vault;

    const PASSPHRASE: &str = "correct horse battery staple";

    fn pass(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn test_unlock_after_lock_reads_old_fields() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        let envelope = vault.encrypt_field("s3cr3t!").unwrap();

        vault.lock();
        vault.unlock(&pass(PASSPHRASE)).unwrap();

        assert_eq!(vault.decrypt_field(&envelope).unwrap(), "s3cr3t!");
    }

    #[test]
    fn test_wrong_passphrase_leaves_state_empty() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();

        let result = vault.unlock(&pass("wrong"));
        assert!(matches!(result, Err(VaultError::InvalidPassphrase)));
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_failed_unlock_clears_a_loaded_key() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();

        assert!(vault.unlock(&pass("wrong")).is_err());
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_failed_unlock_ends_another_holders_session() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();
        let other = vault.clone();

        let session = vault.unlock_guarded(&pass(PASSPHRASE)).unwrap();
        assert!(other.unlock(&pass("wrong")).is_err());

        assert!(matches!(
            session.encrypt_field("x"),
            Err(VaultError::NoVaultKeyLoaded)
        ));
    }

    #[test]
    fn test_unlock_uninitialized_is_invalid_passphrase() {
        let vault = memory_vault();
        assert!(matches!(
            vault.unlock(&pass(PASSPHRASE)),
            Err(VaultError::InvalidPassphrase)
        ));
    }

    #[test]
    fn test_hash_ok_but_wrapped_key_corrupted() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();

        let mut record = vault.store().load_master().unwrap().unwrap();
        let last = record.wrapped_vault_key.len() - 1;
        record.wrapped_vault_key[last] ^= 0x01;
        vault.store().replace_master(record);

        let result = vault.unlock(&pass(PASSPHRASE));
        assert!(matches!(result, Err(VaultError::InvalidPassphrase)));
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_salt_mismatch_is_invalid_passphrase() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();

        let mut record = vault.store().load_master().unwrap().unwrap();
        record.salt = vec![0u8; kdf::SALT_LEN];
        vault.store().replace_master(record);

        assert!(matches!(
            vault.unlock(&pass(PASSPHRASE)),
            Err(VaultError::InvalidPassphrase)
        ));
    }

    #[test]
    fn test_lock_is_idempotent() {
        let vault = memory_vault();
        vault.lock();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();
        vault.logout();
        assert!(!vault.is_unlocked());
    }

    #[test]
    fn test_guard_locks_on_drop() {
        let vault = memory_vault();
        vault.setup(&pass(PASSPHRASE)).unwrap();
        vault.lock();

        let envelope = {
            let session = vault.unlock_guarded(&pass(PASSPHRASE)).unwrap();
            assert!(session.is_unlocked());
            session.encrypt_field("inside").unwrap()
        };

        assert!(!vault.is_unlocked());
        assert!(envelope.len() > aead::MIN_ENVELOPE_LEN);
        assert!(matches!(
            vault.decrypt_field(&EncryptedField::empty()),
            Err(VaultError::NoVaultKeyLoaded)
        ));
    }
}
