//! Argon2id passphrase verifier
//!
//! Produces PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) that
//! embed their own salt and cost parameters. The verifier is used only to
//! accept or reject a passphrase; it is never used as key material.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Salt length for the verifier (independent of the key-derivation salt)
const HASH_SALT_LEN: usize = 16;

/// Argon2id cost parameters.
///
/// Defaults follow the OWASP high-security profile: 64 MiB, 3 passes,
/// 4 lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HasherParams {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for HasherParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

#[derive(Clone)]
pub struct PassphraseHasher {
    params: Params,
}

impl PassphraseHasher {
    pub fn new(params: &HasherParams) -> Result<Self> {
        let params = Params::new(params.memory_kib, params.time_cost, params.parallelism, None)
            .map_err(|e| VaultError::InvalidConfig(format!("Argon2 params error: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `passphrase` with a freshly generated salt
    ///
    /// # Returns
    /// A PHC string carrying the algorithm, costs, salt and digest
    ///
    /// # Security Notes
    /// - Memory-hard, which makes offline guessing on GPUs expensive
    /// - The salt is separate from the key-derivation salt, so the stored
    ///   hash gives no shortcut to the master key
    pub fn hash(&self, passphrase: &[u8]) -> Result<String> {
        let mut salt_bytes = [0u8; HASH_SALT_LEN];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| VaultError::KeyDerivationFailed(format!("salt encoding failed: {}", e)))?;

        let hash = self
            .argon2()
            .hash_password(passphrase, &salt)
            .map_err(|e| VaultError::KeyDerivationFailed(format!("passphrase hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Check `passphrase` against a stored PHC string.
    ///
    /// The parameters embedded in `hash` are used, not the ones this hasher
    /// was built with. A malformed hash is just a failed verification.
    ///
    /// # Arguments
    /// * `hash` - PHC string from the master record
    /// * `passphrase` - Candidate passphrase bytes
    ///
    /// # Security Notes
    /// - The digest comparison is constant-time
    pub fn verify(hash: &str, passphrase: &[u8]) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default().verify_password(passphrase, &parsed).is_ok()
    }
}

impl std::fmt::Debug for PassphraseHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn fast_params() -> HasherParams {
    HasherParams {
        memory_kib: 8192,
        time_cost: 1,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PassphraseHasher::new(&fast_params()).unwrap();
        let hash = hasher.hash(b"correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(PassphraseHasher::verify(&hash, b"correct horse battery staple"));
        assert!(!PassphraseHasher::verify(&hash, b"correct horse battery stapler"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PassphraseHasher::new(&fast_params()).unwrap();

        let first = hasher.hash(b"same passphrase").unwrap();
        let second = hasher.hash(b"same passphrase").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_embedded_params_are_used() {
        let hasher = PassphraseHasher::new(&fast_params()).unwrap();
        let hash = hasher.hash(b"pass").unwrap();

        assert!(hash.contains("m=8192,t=1,p=1"));
    }

    #[test]
    fn test_malformed_hash_is_rejected_not_raised() {
        assert!(!PassphraseHasher::verify("", b"pass"));
        assert!(!PassphraseHasher::verify("not-a-phc-string", b"pass"));
        assert!(!PassphraseHasher::verify("$argon2id$v=19$m=garbage", b"pass"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = HasherParams {
            memory_kib: 1,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(matches!(
            PassphraseHasher::new(&params),
            Err(VaultError::InvalidConfig(_))
        ));
    }
}
