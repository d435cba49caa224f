//! Cryptographic primitives for secure-vault
//!
//! This module provides:
//! - Argon2id passphrase verification ([`PassphraseHasher`])
//! - PBKDF2-HMAC-SHA256 master key derivation ([`kdf`])
//! - Vault key wrapping ([`codec`])
//! - ChaCha20-Poly1305 field encryption ([`field`])
//! - Secure memory handling with automatic zeroing

pub mod aead;
pub mod codec;
pub mod field;
pub mod kdf;
mod hasher;
mod keys;
mod secure_bytes;

pub use field::EncryptedField;
pub use hasher::{HasherParams, PassphraseHasher};
pub use keys::{MasterKey, VaultKey, KEY_LEN};
pub use secure_bytes::SecureBytes;

#[cfg(test)]
pub(crate) use hasher::fast_params;
