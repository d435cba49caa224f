//! Print a random password

use colored::Colorize;
use secrecy::ExposeSecret;

use crate::error::Result;
use crate::generator::{self, GeneratorOptions, MAX_STRENGTH};

pub fn run(options: &GeneratorOptions) -> Result<()> {
    let password = generator::generate(options)?;
    let score = generator::strength(password.expose_secret());

    println!("{}", password.expose_secret());
    eprintln!(
        "{} {}/{} ({})",
        "Strength:".dimmed(),
        score,
        MAX_STRENGTH,
        generator::strength_label(score)
    );
    Ok(())
}
