//! Data directory layout

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SECURE_VAULT_DIR";

pub const CONFIG_FILE: &str = "vault.toml";
pub const MASTER_FILE: &str = "master.rec";
pub const ENTRIES_FILE: &str = "entries.dat";

const APP_DIR: &str = "secure-vault";

/// Per-user data directory, e.g. `~/.local/share/secure-vault`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| VaultError::InvalidConfig("Could not determine the user data directory".into()))
}

/// Create the data directory if missing, owner-only on Unix
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_data_dir_creates_nested() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("b");

        ensure_data_dir(&dir).unwrap();
        assert!(dir.is_dir());

        // second call is a no-op
        ensure_data_dir(&dir).unwrap();
    }
}
