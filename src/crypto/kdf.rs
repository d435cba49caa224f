//! PBKDF2-HMAC-SHA256 master key derivation
//!
//! Deterministic: the same (passphrase, salt, rounds) always yields the same
//! key, which is what lets every correct unlock unwrap the stored vault key.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{MasterKey, KEY_LEN};
use crate::error::{Result, VaultError};

/// Salt length generated at setup (256 bits)
pub const SALT_LEN: usize = 32;

/// Shortest salt accepted when reading a stored record
pub const MIN_SALT_LEN: usize = 16;

/// Iteration floor; records or configs below it are refused
pub const MIN_ROUNDS: u32 = 100_000;

/// Iteration count for new vaults
pub const DEFAULT_ROUNDS: u32 = 600_000;

/// Fresh random salt for a new vault
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 32-byte master key from a passphrase.
///
/// This is deliberately slow. Async callers must run it on a blocking pool.
///
/// # Arguments
/// * `passphrase` - The master passphrase as UTF-8 bytes
/// * `salt` - Salt stored in the master record, at least 16 bytes
/// * `rounds` - PBKDF2 iteration count, at least [`MIN_ROUNDS`]
///
/// # Errors
/// [`VaultError::KeyDerivationFailed`] if the salt is too short or the round
/// count is below the floor
///
/// # Security Notes
/// - The round count is read from the record, so raising the default never
///   locks out an existing vault
/// - The derived key only ever unwraps the vault key; it encrypts no data
pub fn derive_key(passphrase: &[u8], salt: &[u8], rounds: u32) -> Result<MasterKey> {
    if salt.len() < MIN_SALT_LEN {
        return Err(VaultError::KeyDerivationFailed(format!(
            "salt too short: {} bytes (minimum {})",
            salt.len(),
            MIN_SALT_LEN
        )));
    }
    if rounds < MIN_ROUNDS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "iteration count {} below minimum {}",
            rounds, MIN_ROUNDS
        )));
    }

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(passphrase, salt, rounds, output.as_mut());

    Ok(MasterKey::new(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [0x42u8; SALT_LEN];

        let key1 = derive_key(b"test_password_123", &salt, MIN_ROUNDS).unwrap();
        let key2 = derive_key(b"test_password_123", &salt, MIN_ROUNDS).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
        assert_eq!(key1.as_bytes().len(), KEY_LEN);
    }

    #[test]
    fn test_derive_key_different_salts() {
        let key1 = derive_key(b"test_password_123", &[0x42u8; SALT_LEN], MIN_ROUNDS).unwrap();
        let key2 = derive_key(b"test_password_123", &[0x43u8; SALT_LEN], MIN_ROUNDS).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passphrases() {
        let salt = [0x42u8; SALT_LEN];

        let key1 = derive_key(b"passphrase one", &salt, MIN_ROUNDS).unwrap();
        let key2 = derive_key(b"passphrase two", &salt, MIN_ROUNDS).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_minimum_length_salt_accepted() {
        assert!(derive_key(b"pw", &[7u8; MIN_SALT_LEN], MIN_ROUNDS).is_ok());
    }

    #[test]
    fn test_short_salt_rejected() {
        let result = derive_key(b"pw", &[0u8; MIN_SALT_LEN - 1], MIN_ROUNDS);
        assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
    }

    #[test]
    fn test_low_rounds_rejected() {
        let result = derive_key(b"pw", &[0u8; SALT_LEN], MIN_ROUNDS - 1);
        assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
    }

    #[test]
    fn test_random_salts_differ() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
