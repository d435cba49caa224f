//! Heap buffer for key material that is wiped on drop
//!
//! The buffer is never resized after construction, so the region locked with
//! `mlock` at creation is exactly the region wiped and unlocked on drop.

use std::ops::Deref;
use zeroize::Zeroize;

/// Owned secret bytes. Not `Clone`, and `Debug` never prints the contents.
pub struct SecureBytes(Vec<u8>);

impl SecureBytes {
    /// Take ownership of `data`; from here on the allocation is managed securely
    pub fn new(data: Vec<u8>) -> Self {
        let secure = Self(data);
        secure.lock_memory();
        secure
    }

    /// Keep the pages out of swap (best effort, may fail without privileges)
    #[cfg(unix)]
    fn lock_memory(&self) {
        if self.0.is_empty() {
            return;
        }
        unsafe {
            libc::mlock(self.0.as_ptr() as *const libc::c_void, self.0.len());
        }
    }

    #[cfg(not(unix))]
    fn lock_memory(&self) {}

    #[cfg(unix)]
    fn unlock_memory(&self, len: usize) {
        if len == 0 {
            return;
        }
        unsafe {
            libc::munlock(self.0.as_ptr() as *const libc::c_void, len);
        }
    }

    #[cfg(not(unix))]
    fn unlock_memory(&self, _len: usize) {}

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecureBytes {
    fn drop(&mut self) {
        let len = self.0.len();
        self.0.as_mut_slice().zeroize();
        self.unlock_memory(len);
        self.0.zeroize();
    }
}

impl Deref for SecureBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl std::fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBytes")
            .field("len", &self.0.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_bytes_deref() {
        let secure = SecureBytes::new(vec![1, 2, 3, 4]);
        assert_eq!(secure.len(), 4);
        assert_eq!(&*secure, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let secure = SecureBytes::from(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let printed = format!("{:?}", secure);
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("222"));
    }

    #[test]
    fn test_empty_buffer() {
        let secure = SecureBytes::new(Vec::new());
        assert!(secure.is_empty());
    }
}
