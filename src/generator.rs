//! Random password generation and a rough strength score

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use secrecy::SecretString;

use crate::error::{Result, VaultError};

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 128;
pub const DEFAULT_LENGTH: usize = 16;

/// Highest value [`strength`] returns
pub const MAX_STRENGTH: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl GeneratorOptions {
    fn alphabet(&self) -> Vec<char> {
        let mut alphabet = String::new();
        if self.lowercase {
            alphabet.push_str(LOWERCASE);
        }
        if self.uppercase {
            alphabet.push_str(UPPERCASE);
        }
        if self.digits {
            alphabet.push_str(DIGITS);
        }
        if self.symbols {
            alphabet.push_str(SYMBOLS);
        }
        // Everything switched off: fall back to letters and digits
        if alphabet.is_empty() {
            alphabet.push_str(LOWERCASE);
            alphabet.push_str(UPPERCASE);
            alphabet.push_str(DIGITS);
        }
        alphabet.chars().collect()
    }
}

/// Draw `options.length` characters uniformly from the enabled classes
pub fn generate(options: &GeneratorOptions) -> Result<SecretString> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&options.length) {
        return Err(VaultError::InvalidInput(format!(
            "password length must be between {} and {}",
            MIN_LENGTH, MAX_LENGTH
        )));
    }

    let alphabet = options.alphabet();
    let mut rng = OsRng;
    let password: String = (0..options.length)
        .filter_map(|_| alphabet.choose(&mut rng))
        .collect();

    Ok(SecretString::new(password))
}

/// Score 0 to 5: one point each for reaching 8, 12 and 16 characters, and
/// one per character class present, capped at [`MAX_STRENGTH`].
pub fn strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }

    let length = password.chars().count();
    let checks = [
        length >= 8,
        length >= 12,
        length >= 16,
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| SYMBOLS.contains(c)),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;
    score.min(MAX_STRENGTH)
}

/// Human label for a [`strength`] score
pub fn strength_label(score: u8) -> &'static str {
    match score {
        0..=1 => "very weak",
        2 => "weak",
        3 => "fair",
        4 => "strong",
        _ => "very strong",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_length_and_alphabet() {
        let password = generate(&GeneratorOptions::default()).unwrap();
        let text = password.expose_secret();

        assert_eq!(text.chars().count(), DEFAULT_LENGTH);
        let allowed: String = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS].concat();
        assert!(text.chars().all(|c| allowed.contains(c)));
    }

    #[test]
    fn test_digits_only() {
        let options = GeneratorOptions {
            length: 32,
            uppercase: false,
            lowercase: false,
            digits: true,
            symbols: false,
        };
        let password = generate(&options).unwrap();
        assert!(password.expose_secret().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_all_classes_disabled_falls_back_to_alphanumeric() {
        let options = GeneratorOptions {
            length: 64,
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
        };
        let password = generate(&options).unwrap();
        assert!(password.expose_secret().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_length_bounds() {
        for length in [0, MIN_LENGTH - 1, MAX_LENGTH + 1] {
            let options = GeneratorOptions {
                length,
                ..GeneratorOptions::default()
            };
            assert!(matches!(generate(&options), Err(VaultError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_consecutive_passwords_differ() {
        let a = generate(&GeneratorOptions::default()).unwrap();
        let b = generate(&GeneratorOptions::default()).unwrap();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_strength_scores() {
        assert_eq!(strength(""), 0);
        assert_eq!(strength("abc"), 1);
        assert_eq!(strength("abcdefgh"), 2);
        assert_eq!(strength("abcdefgh1A"), 4);
        assert_eq!(strength("abcdefgh1A!xyz0123"), MAX_STRENGTH);
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(strength_label(0), "very weak");
        assert_eq!(strength_label(3), "fair");
        assert_eq!(strength_label(MAX_STRENGTH), "very strong");
    }
}
