use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault is already set up. Re-initialization requires removing the existing vault.")]
    AlreadySetUp,

    #[error("Vault is not initialized. Run 'secure-vault init' first.")]
    NotInitialized,

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Vault is locked: no vault key loaded")]
    NoVaultKeyLoaded,

    #[error("Field decryption failed: data is corrupted or was encrypted under another key")]
    FieldDecryptFailure,

    /// Authentication of the wrapped vault key failed. Callers outside the
    /// unlock flow only ever see this as [`VaultError::InvalidPassphrase`].
    #[error("Vault key unwrap failed")]
    KeyUnwrapFailure,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Corrupted record: {0}")]
    CorruptRecord(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Passphrase is too short (minimum {0} characters)")]
    PassphraseTooShort(usize),

    #[error("Passphrases do not match")]
    PassphraseMismatch,

    #[error("Entry {0} not found")]
    EntryNotFound(u64),

    #[error("Category '{0}' already exists")]
    CategoryExists(String),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl VaultError {
    /// True for every failure that means "this passphrase is not accepted".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            VaultError::InvalidPassphrase | VaultError::KeyUnwrapFailure
        )
    }

    /// Message safe to show an end user. Authentication failures collapse to
    /// a single string so no oracle about which check failed is exposed.
    pub fn user_message(&self) -> String {
        if self.is_authentication_failure() {
            VaultError::InvalidPassphrase.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_failure_renders_as_invalid_passphrase() {
        assert_eq!(
            VaultError::KeyUnwrapFailure.user_message(),
            VaultError::InvalidPassphrase.user_message()
        );
    }

    #[test]
    fn other_errors_keep_their_message() {
        let err = VaultError::EntryNotFound(7);
        assert!(!err.is_authentication_failure());
        assert_eq!(err.user_message(), "Entry 7 not found");
    }
}
