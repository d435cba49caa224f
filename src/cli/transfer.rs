//! Export and import commands

use std::fs;
use std::io::Write;
use std::path::Path;

use colored::Colorize;
use tempfile::NamedTempFile;

use crate::entry::{EntryBook, ExportDocument};
use crate::error::{Result, VaultError};

use super::{confirm, header, Context};

pub async fn export(ctx: &Context, path: &Path, yes: bool) -> Result<()> {
    header("Export entries");

    if path.exists() && !yes && !confirm(&format!("Overwrite {}?", path.display())) {
        return Err(VaultError::Cancelled);
    }

    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let report = book.export()?;

    let json = serde_json::to_string_pretty(&report.document)?;
    write_private(path, json.as_bytes())?;

    println!();
    println!(
        "{} {} entries written to {}",
        "Success:".green().bold(),
        report.document.entries.len(),
        path.display()
    );
    if !report.failures.is_empty() {
        println!();
        println!(
            "{} {} entries could not be decrypted and were not exported:",
            "Warning:".yellow().bold(),
            report.failures.len()
        );
        for (id, title, reason) in &report.failures {
            println!("  {:<6} {:<30} {}", id, title, reason.user_message().red());
        }
    }
    println!();
    println!(
        "{} the file contains every password in plain text.",
        "Note:".yellow().bold()
    );
    Ok(())
}

pub async fn import(ctx: &Context, path: &Path) -> Result<()> {
    header("Import entries");

    let text = fs::read_to_string(path)?;
    let document: ExportDocument = serde_json::from_str(&text)?;

    let guard = ctx.unlock().await?;
    let book = EntryBook::new(&*guard, ctx.store.as_ref());
    let report = book.import(&document)?;

    println!();
    println!(
        "{} {} entries imported from {}",
        "Success:".green().bold(),
        report.imported.len(),
        path.display()
    );
    Ok(())
}

/// Replace `path` with a file readable only by the owner on Unix. The data
/// is staged next to the target and moved into place, so an existing file
/// never keeps its old permissions.
fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| VaultError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_private_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");

        write_private(&path, b"first, longer content").unwrap();
        write_private(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private(&path, b"secrets").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(&path).unwrap(), b"secrets");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
