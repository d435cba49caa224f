//! CLI command implementations

pub mod category;
pub mod entry;
pub mod generate;
pub mod init;
pub mod status;
pub mod transfer;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use secrecy::{ExposeSecret, SecretString};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::store::FileStore;
use crate::vault::{UnlockGuard, Vault};

/// Environment variable holding the master passphrase for non-interactive use
pub const PASSPHRASE_ENV: &str = "SECURE_VAULT_PASSPHRASE";

/// Everything a command needs: settings plus a vault over the data directory
pub struct Context {
    pub config: VaultConfig,
    pub store: Arc<FileStore>,
    pub vault: Vault<FileStore>,
}

impl Context {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        let config = VaultConfig::load(&data_dir)?;
        let store = Arc::new(FileStore::open(&config.data_dir)?);
        let vault = Vault::new(Arc::clone(&store), &config)?;
        Ok(Self { config, store, vault })
    }

    /// Prompt for the passphrase and unlock. The vault locks again when the
    /// guard goes out of scope.
    pub async fn unlock(&self) -> Result<UnlockGuard<'_, FileStore>> {
        if !self.vault.is_initialized()? {
            return Err(VaultError::NotInitialized);
        }
        let passphrase = prompt_passphrase()?;

        print!("{}", "Unlocking vault... ".cyan());
        io::stdout().flush()?;
        match self.vault.unlock_guarded_async(passphrase).await {
            Ok(guard) => {
                println!("{}", "done".green());
                Ok(guard)
            }
            Err(e) => {
                println!("{}", "failed".red());
                Err(e)
            }
        }
    }
}

/// Ask for a new master passphrase twice
pub fn prompt_new_passphrase(min_len: usize) -> Result<SecretString> {
    if let Some(passphrase) = passphrase_from_env() {
        check_new_passphrase(&passphrase, min_len)?;
        return Ok(passphrase);
    }
    require_terminal()?;

    println!("{}", "Create a master passphrase".cyan().bold());
    println!("It protects every entry in the vault and cannot be recovered.");
    println!("Minimum length: {} characters\n", min_len);

    loop {
        let passphrase = SecretString::new(rpassword::prompt_password("Master passphrase: ")?);

        if let Err(e) = check_new_passphrase(&passphrase, min_len) {
            println!("{} {}", "Error:".red(), e);
            continue;
        }

        let confirm = SecretString::new(rpassword::prompt_password("Confirm passphrase: ")?);
        if passphrase.expose_secret() != confirm.expose_secret() {
            println!("{} {}", "Error:".red(), VaultError::PassphraseMismatch);
            continue;
        }

        return Ok(passphrase);
    }
}

/// Ask for the existing master passphrase
pub fn prompt_passphrase() -> Result<SecretString> {
    if let Some(passphrase) = passphrase_from_env() {
        return Ok(passphrase);
    }
    require_terminal()?;
    Ok(SecretString::new(rpassword::prompt_password("Master passphrase: ")?))
}

fn passphrase_from_env() -> Option<SecretString> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::new)
}

fn require_terminal() -> Result<()> {
    if io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(VaultError::InvalidInput(format!(
            "no passphrase available: set {} or run interactively",
            PASSPHRASE_ENV
        )))
    }
}

fn check_new_passphrase(passphrase: &SecretString, min_len: usize) -> Result<()> {
    if passphrase.expose_secret().chars().count() < min_len {
        return Err(VaultError::PassphraseTooShort(min_len));
    }
    Ok(())
}

/// Ask a yes/no question; anything but yes is no
pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Read one trimmed line after printing `prompt`
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Read a line; an empty answer becomes `None`
pub fn read_optional(prompt: &str) -> Result<Option<String>> {
    let value = read_line(prompt)?;
    Ok((!value.is_empty()).then_some(value))
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Print a section header
pub fn header(title: &str) {
    println!("{}", format!("=== {} ===", title).cyan().bold());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" work, ,home ,"), vec!["work", "home"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_new_passphrase_length_counts_chars() {
        let short = SecretString::new("ключ".to_string());
        assert!(matches!(
            check_new_passphrase(&short, 5),
            Err(VaultError::PassphraseTooShort(5))
        ));
        assert!(check_new_passphrase(&short, 4).is_ok());
    }
}
