//! Configuration management for secure-vault
//!
//! Settings are read from an optional `vault.toml` inside the data
//! directory. The data directory itself comes from the command line or the
//! `SECURE_VAULT_DIR` environment variable (see [`paths`]).

pub mod paths;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::kdf::{DEFAULT_ROUNDS, MIN_ROUNDS};
use crate::crypto::{HasherParams, PassphraseHasher};
use crate::error::{Result, VaultError};

pub use paths::{default_data_dir, CONFIG_FILE, DATA_DIR_ENV};

/// Minimum master passphrase length accepted at setup
pub const MIN_PASSPHRASE_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VaultConfig {
    /// Where `master.rec`, `entries.dat` and `vault.toml` live
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Minimum passphrase length enforced when creating a vault
    pub min_passphrase_len: usize,
    /// PBKDF2 iteration count for new vaults; existing vaults keep theirs
    pub kdf_rounds: u32,
    /// Argon2id costs for the passphrase verifier
    pub hasher: HasherParams,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            min_passphrase_len: MIN_PASSPHRASE_LEN,
            kdf_rounds: DEFAULT_ROUNDS,
            hasher: HasherParams::default(),
        }
    }
}

impl VaultConfig {
    /// Defaults rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load `<data_dir>/vault.toml` if it exists, otherwise use defaults
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            debug!(path = %path.display(), "loading config file");
            let text = std::fs::read_to_string(&path)?;
            Self::from_toml(&text)?
        } else {
            Self::default()
        };
        config.data_dir = data_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_passphrase_len == 0 {
            return Err(VaultError::InvalidConfig(
                "min_passphrase_len must be at least 1".into(),
            ));
        }
        if self.kdf_rounds < MIN_ROUNDS {
            return Err(VaultError::InvalidConfig(format!(
                "kdf_rounds must be at least {}, got {}",
                MIN_ROUNDS, self.kdf_rounds
            )));
        }
        PassphraseHasher::new(&self.hasher)?;
        Ok(())
    }

    /// Low-cost settings for tests. PBKDF2 still runs at the floor.
    #[cfg(test)]
    pub(crate) fn for_tests(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            min_passphrase_len: MIN_PASSPHRASE_LEN,
            kdf_rounds: MIN_ROUNDS,
            hasher: crate::crypto::fast_params(),
        }
    }
}
