//! ChaCha20-Poly1305 envelopes
//!
//! Every envelope is self-describing:
//! `[12 bytes: nonce][N bytes: ciphertext][16 bytes: tag]`
//! so decryption needs nothing but the key. The nonce is drawn from the OS
//! CSPRNG inside [`seal`] itself; callers cannot supply one.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::keys::KEY_LEN;
use super::SecureBytes;
use crate::error::{Result, VaultError};

/// Nonce length for ChaCha20-Poly1305 (96 bits)
pub const NONCE_LEN: usize = 12;

/// Authentication tag length (128 bits)
pub const TAG_LEN: usize = 16;

/// Smallest possible envelope: nonce plus the tag of an empty plaintext
pub const MIN_ENVELOPE_LEN: usize = NONCE_LEN + TAG_LEN;

/// Encrypt `plaintext` under `key` with a fresh random nonce
///
/// # Arguments
/// * `key` - 32-byte key
/// * `plaintext` - Data to encrypt, may be empty
///
/// # Returns
/// `nonce || ciphertext || tag`, always [`MIN_ENVELOPE_LEN`] bytes longer than
/// the plaintext
///
/// # Security Notes
/// - A new random nonce is drawn for every call, so sealing the same data
///   twice never produces the same envelope
/// - The tag covers the whole ciphertext; any flipped bit fails [`open`]
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != KEY_LEN {
        return Err(VaultError::EncryptionFailed(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LEN,
            key.len()
        )));
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Verify and decrypt an envelope produced by [`seal`].
///
/// # Arguments
/// * `key` - 32-byte key the envelope was sealed with
/// * `envelope` - `nonce || ciphertext || tag`
///
/// # Returns
/// The plaintext wrapped in [`SecureBytes`]
///
/// # Errors
/// Wrong key length, truncated input and tag mismatch are all reported as the
/// same opaque [`chacha20poly1305::Error`]; the caller decides what that means.
pub fn open(key: &[u8], envelope: &[u8]) -> std::result::Result<SecureBytes, chacha20poly1305::Error> {
    if key.len() != KEY_LEN || envelope.len() < MIN_ENVELOPE_LEN {
        return Err(chacha20poly1305::Error);
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| chacha20poly1305::Error)?;
    let plaintext = cipher.decrypt(Nonce::from_slice(nonce), ciphertext)?;

    Ok(SecureBytes::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = [0x42u8; KEY_LEN];
        let plaintext = b"Hello, World! This is secret data.";

        let envelope = seal(&key, plaintext).unwrap();
        let decrypted = open(&key, &envelope).unwrap();

        assert_eq!(&*decrypted, plaintext);
        assert_eq!(envelope.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = seal(&[0x42u8; KEY_LEN], b"Secret message").unwrap();
        assert!(open(&[0x43u8; KEY_LEN], &envelope).is_err());
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = [0x42u8; KEY_LEN];
        let mut envelope = seal(&key, b"Secret message").unwrap();
        envelope[0] ^= 0x01;

        assert!(open(&key, &envelope).is_err());
    }

    #[test]
    fn test_truncated_envelope_fails() {
        let key = [0x42u8; KEY_LEN];
        let envelope = seal(&key, b"x").unwrap();

        assert!(open(&key, &envelope[..MIN_ENVELOPE_LEN - 1]).is_err());
        assert!(open(&key, &[]).is_err());
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(matches!(
            seal(&[0u8; 16], b"data"),
            Err(VaultError::EncryptionFailed(_))
        ));
    }

    #[test]
    fn test_same_plaintext_different_envelopes() {
        let key = [0x42u8; KEY_LEN];

        let first = seal(&key, b"Same message").unwrap();
        let second = seal(&key, b"Same message").unwrap();

        assert_ne!(first[..NONCE_LEN], second[..NONCE_LEN]);
        assert_ne!(first, second);
    }
}
