//! Create a new vault with a master passphrase

use std::io::{self, Write};

use colored::Colorize;

use crate::entry::EntryBook;
use crate::error::{Result, VaultError};

use super::{header, prompt_new_passphrase, Context};

pub async fn run(ctx: &Context) -> Result<()> {
    header("Secure Vault setup");

    if ctx.vault.is_initialized()? {
        println!(
            "{} a vault already exists in {}",
            "Warning:".yellow().bold(),
            ctx.store.dir().display()
        );
        println!("Remove it by hand to start over; every entry will be lost.");
        return Err(VaultError::AlreadySetUp);
    }

    let passphrase = prompt_new_passphrase(ctx.config.min_passphrase_len)?;
    println!();

    print!("{}", "Deriving keys (this takes a moment)... ".cyan());
    io::stdout().flush()?;
    ctx.vault.setup_async(passphrase).await?;
    println!("{}", "done".green());

    let seeded = EntryBook::new(&ctx.vault, ctx.store.as_ref()).seed_default_categories();
    // The CLI never keeps a session open past one command
    ctx.vault.lock();
    let seeded = seeded?;

    println!();
    println!("{}", "=== Vault created ===".green().bold());
    println!();
    println!("Data directory: {}", ctx.store.dir().display().to_string().cyan());
    println!("Default categories: {}", seeded);
    println!(
        "Add your first entry with {}",
        "secure-vault add".cyan()
    );

    Ok(())
}
