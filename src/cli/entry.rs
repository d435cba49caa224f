//! Entry management commands

use colored::Colorize;
use secrecy::{ExposeSecret, SecretString};

use crate::entry::{EntryBook, EntryOutcome, EntryPatch, EntryView, NewEntry};
use crate::error::{Result, VaultError};
use crate::generator::{self, GeneratorOptions};

use super::{confirm, header, read_line, read_optional, split_list, Context};

/// Typed at an edit prompt to clear an optional field
const CLEAR_MARKER: &str = "-";

pub async fn add(ctx: &Context) -> Result<()> {
    header("Add entry");
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    println!();

    let title = read_line("Title: ")?;
    if title.is_empty() {
        return Err(VaultError::InvalidInput("title must not be empty".into()));
    }
    let username = read_optional("Username (optional): ")?;
    let url = read_optional("URL (optional): ")?;
    let password = prompt_entry_password()?;
    let notes = read_line("Notes (optional): ")?;
    let category = read_optional("Category (optional): ")?;
    let tags = split_list(&read_line("Tags, comma separated (optional): ")?);
    let favorite = confirm("Mark as favorite?");

    let entry = NewEntry {
        title,
        username,
        password: password.expose_secret().clone(),
        url,
        notes,
        category,
        tags,
        favorite,
    };
    let id = book.add(&entry)?;

    println!();
    println!(
        "{} Entry '{}' added with id {}.",
        "Success:".green().bold(),
        entry.title,
        id
    );
    Ok(())
}

pub async fn edit(ctx: &Context, id: u64) -> Result<()> {
    header("Edit entry");
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let current = book.get(id)?;

    println!();
    println!("Press Enter to keep a value, '{}' to clear it.", CLEAR_MARKER);
    println!();

    let patch = EntryPatch {
        title: edited(&read_line(&format!("Title [{}]: ", current.title))?, false),
        username: edited(&read_line(&prompt_for("Username", current.username.as_deref()))?, true),
        password: prompt_password_change()?,
        url: edited(&read_line(&prompt_for("URL", current.url.as_deref()))?, true),
        notes: edited(&read_line("Notes [unchanged]: ")?, true),
        category: edited(&read_line(&prompt_for("Category", current.category.as_deref()))?, true),
        tags: tags_edited(&read_line(&format!("Tags [{}]: ", current.tags.join(", ")))?),
        favorite: favorite_edited(&read_line(&format!(
            "Favorite (yes/no) [{}]: ",
            if current.favorite { "yes" } else { "no" }
        ))?)?,
    };

    if patch.is_empty() {
        println!("Nothing changed.");
        return Ok(());
    }

    let updated = book.update(id, &patch)?;
    println!();
    println!(
        "{} Entry '{}' updated.",
        "Success:".green().bold(),
        updated.title
    );
    Ok(())
}

pub async fn show(ctx: &Context, id: u64, reveal: bool) -> Result<()> {
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let view = book.get(id)?;

    println!();
    print_entry(&view, reveal);
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    header("Entries");
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let outcomes = book.list()?;

    if outcomes.is_empty() {
        println!();
        println!("The vault is empty.");
        println!("Run {} to add an entry.", "secure-vault add".cyan());
        return Ok(());
    }

    println!();
    print_table(&outcomes);
    Ok(())
}

pub async fn search(ctx: &Context, query: &str) -> Result<()> {
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let outcomes = book.search(query)?;

    println!();
    if outcomes.is_empty() {
        println!("No entries match '{}'.", query);
        return Ok(());
    }
    print_table(&outcomes);
    Ok(())
}

pub async fn remove(ctx: &Context, id: u64, yes: bool) -> Result<()> {
    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let view = book.get(id)?;

    if !yes && !confirm(&format!("Delete entry '{}'?", view.title)) {
        return Err(VaultError::Cancelled);
    }
    book.remove(id)?;

    println!(
        "{} Entry '{}' removed.",
        "Success:".green().bold(),
        view.title
    );
    Ok(())
}

/// Hidden password prompt; an empty answer offers a generated one
fn prompt_entry_password() -> Result<SecretString> {
    let password = rpassword::prompt_password("Password (empty to generate): ")?;
    if !password.is_empty() {
        return Ok(SecretString::new(password));
    }

    let generated = generator::generate(&GeneratorOptions::default())?;
    let score = generator::strength(generated.expose_secret());
    println!(
        "Generated a {}-character password ({}).",
        generated.expose_secret().chars().count(),
        generator::strength_label(score)
    );
    Ok(generated)
}

fn prompt_password_change() -> Result<Option<String>> {
    let password = rpassword::prompt_password("New password (empty keeps, 'gen' generates): ")?;
    match password.as_str() {
        "" => Ok(None),
        "gen" => {
            let generated = generator::generate(&GeneratorOptions::default())?;
            println!("Generated a new password.");
            Ok(Some(generated.expose_secret().clone()))
        }
        _ => Ok(Some(password)),
    }
}

fn prompt_for(label: &str, current: Option<&str>) -> String {
    format!("{} [{}]: ", label, current.unwrap_or(""))
}

/// Map an edit prompt answer to a patch value
fn edited(input: &str, clearable: bool) -> Option<String> {
    match input {
        "" => None,
        CLEAR_MARKER if clearable => Some(String::new()),
        value => Some(value.to_string()),
    }
}

fn tags_edited(input: &str) -> Option<Vec<String>> {
    match input {
        "" => None,
        CLEAR_MARKER => Some(Vec::new()),
        value => Some(split_list(value)),
    }
}

fn favorite_edited(input: &str) -> Result<Option<bool>> {
    match input.to_lowercase().as_str() {
        "" => Ok(None),
        "y" | "yes" => Ok(Some(true)),
        "n" | "no" => Ok(Some(false)),
        other => Err(VaultError::InvalidInput(format!(
            "expected yes or no for favorite, got '{}'",
            other
        ))),
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "••••••••".to_string()
    }
}

fn print_entry(view: &EntryView, reveal: bool) {
    let password = view.password.expose_secret();
    let shown = if reveal { password.to_string() } else { mask(password) };

    println!("{}", view.title.bold());
    println!("{}", "─".repeat(50).dimmed());
    println!("{:<12} {}", "Id:", view.id);
    println!("{:<12} {}", "Username:", view.username.as_deref().unwrap_or(""));
    println!("{:<12} {}", "Password:", shown);
    println!("{:<12} {}", "URL:", view.url.as_deref().unwrap_or(""));
    println!("{:<12} {}", "Category:", view.category.as_deref().unwrap_or(""));
    println!("{:<12} {}", "Tags:", view.tags.join(", "));
    println!("{:<12} {}", "Favorite:", if view.favorite { "yes" } else { "no" });
    println!(
        "{:<12} {}",
        "Strength:",
        generator::strength_label(generator::strength(password))
    );
    println!("{:<12} {}", "Updated:", view.updated_at.format("%Y-%m-%d %H:%M UTC"));
    if reveal && !view.notes.expose_secret().is_empty() {
        println!();
        println!("{}", view.notes.expose_secret());
    }
    if !reveal {
        println!();
        println!("Use {} to show the password and notes.", "--reveal".cyan());
    }
}

fn print_table(outcomes: &[EntryOutcome]) {
    println!(
        "{:<6} {:<30} {:<24} {:<16}",
        "ID".bold(),
        "TITLE".bold(),
        "USERNAME".bold(),
        "CATEGORY".bold()
    );
    println!("{}", "─".repeat(78).dimmed());

    for outcome in outcomes {
        match outcome {
            EntryOutcome::Ok(view) => {
                let title = if view.favorite {
                    format!("★ {}", view.title)
                } else {
                    view.title.clone()
                };
                println!(
                    "{:<6} {:<30} {:<24} {:<16}",
                    view.id,
                    title,
                    view.username.as_deref().unwrap_or(""),
                    view.category.as_deref().unwrap_or("")
                );
            }
            EntryOutcome::Failed { id, title, reason } => {
                println!(
                    "{:<6} {:<30} {}",
                    id,
                    title,
                    format!("unreadable: {}", reason.user_message()).red()
                );
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    println!();
    if failed > 0 {
        println!(
            "{} {} of {} entries could not be decrypted.",
            "Warning:".yellow().bold(),
            failed,
            outcomes.len()
        );
    } else {
        println!("{} entries.", outcomes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edited_keeps_clears_and_sets() {
        assert_eq!(edited("", true), None);
        assert_eq!(edited("-", true), Some(String::new()));
        assert_eq!(edited("-", false), Some("-".to_string()));
        assert_eq!(edited("new", false), Some("new".to_string()));
    }

    #[test]
    fn test_tags_edited() {
        assert_eq!(tags_edited(""), None);
        assert_eq!(tags_edited("-"), Some(Vec::new()));
        assert_eq!(tags_edited("a, b"), Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_favorite_edited() {
        assert_eq!(favorite_edited("").unwrap(), None);
        assert_eq!(favorite_edited("Yes").unwrap(), Some(true));
        assert_eq!(favorite_edited("n").unwrap(), Some(false));
        assert!(matches!(favorite_edited("maybe"), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_mask_hides_length() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("a"), mask("a much longer password"));
    }
}
