//! Category and tag commands

use colored::Colorize;

use crate::entry::{CategoryPatch, CategorySummary, EntryBook, NewCategory, TagSummary};
use crate::error::{Result, VaultError};

use super::{confirm, header, Context};

/// Listing reads only clear-text metadata, so it needs no passphrase
pub fn list(ctx: &Context) -> Result<()> {
    if !ctx.vault.is_initialized()? {
        return Err(VaultError::NotInitialized);
    }
    let book = EntryBook::new(&ctx.vault, ctx.store.as_ref());
    print_categories(&book.categories()?);
    Ok(())
}

pub async fn add(ctx: &Context, category: &NewCategory) -> Result<()> {
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let record = book.create_category(category)?;

    println!(
        "{} Category '{}' created.",
        "Success:".green().bold(),
        record.name
    );
    Ok(())
}

pub async fn update(ctx: &Context, name: &str, patch: &CategoryPatch) -> Result<()> {
    if patch.is_empty() {
        println!("Nothing changed.");
        return Ok(());
    }
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let record = book.update_category(name, patch)?;

    println!(
        "{} Category '{}' updated.",
        "Success:".green().bold(),
        record.name
    );
    Ok(())
}

pub async fn remove(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let in_use = book
        .categories()?
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| VaultError::CategoryNotFound(name.to_string()))?
        .count;

    let question = if in_use > 0 {
        format!("Delete category '{}'? Its {} entries will be kept uncategorized.", name, in_use)
    } else {
        format!("Delete category '{}'?", name)
    };
    if !yes && !confirm(&question) {
        return Err(VaultError::Cancelled);
    }
    let detached = book.delete_category(name)?;

    println!(
        "{} Category '{}' removed ({} entries detached).",
        "Success:".green().bold(),
        name,
        detached
    );
    Ok(())
}

pub fn tags(ctx: &Context) -> Result<()> {
    if !ctx.vault.is_initialized()? {
        return Err(VaultError::NotInitialized);
    }
    let book = EntryBook::new(&ctx.vault, ctx.store.as_ref());
    print_tags(&book.tags()?);
    Ok(())
}

fn print_categories(categories: &[CategorySummary]) {
    header("Categories");
    if categories.is_empty() {
        println!("None defined.");
        return;
    }
    println!(
        "{:<24} {:<12} {:<9} {:>7}",
        "NAME".bold(),
        "ICON".bold(),
        "COLOR".bold(),
        "ENTRIES".bold()
    );
    println!("{}", "─".repeat(55).dimmed());
    for category in categories {
        println!(
            "{:<24} {:<12} {:<9} {:>7}",
            category.name, category.icon, category.color, category.count
        );
    }
}

fn print_tags(tags: &[TagSummary]) {
    header("Tags");
    if tags.is_empty() {
        println!("None in use.");
        return;
    }
    for tag in tags {
        println!("  {:<24} {:>5}", tag.name, tag.count);
    }
}
