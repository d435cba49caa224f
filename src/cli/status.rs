//! Show whether a vault exists and how much it holds

use colored::Colorize;

use crate::error::Result;
use crate::store::{EntryStore, MasterStore};
use crate::vault::VaultStatus;

use super::Context;

pub fn run(ctx: &Context) -> Result<()> {
    let status = ctx.vault.status()?;

    println!("{:<16} {}", "Data directory:".bold(), ctx.store.dir().display());
    match status {
        VaultStatus::Uninitialized => {
            println!("{:<16} {}", "Status:".bold(), "not initialized".yellow());
            println!();
            println!("Run {} to create a vault.", "secure-vault init".cyan());
        }
        VaultStatus::Locked | VaultStatus::Unlocked => {
            let entries = ctx.store.list_entries()?.len();
            println!("{:<16} {}", "Status:".bold(), "initialized".green());
            println!("{:<16} {}", "Entries:".bold(), entries);
            if let Some(record) = ctx.store.load_master()? {
                println!("{:<16} {}", "KDF rounds:".bold(), record.kdf_rounds);
                println!(
                    "{:<16} {}",
                    "Created:".bold(),
                    record.created_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
    }

    Ok(())
}
