//! Secure Vault - a local, passphrase-protected credential store
//!
//! This crate provides:
//! - A master passphrase verified by an Argon2id hash
//! - A random vault key, wrapped under a PBKDF2-derived master key
//! - Per-field ChaCha20-Poly1305 encryption of passwords and notes
//! - A process-wide vault key slot that is wiped on lock
//! - File and in-memory storage behind a small trait seam

pub mod cli;
pub mod config;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod generator;
pub mod store;
pub mod vault;

pub use config::VaultConfig;
pub use crypto::EncryptedField;
pub use error::{Result, VaultError};
pub use store::{FileStore, MemoryStore};
pub use vault::{UnlockGuard, Vault, VaultKeyState, VaultStatus};
