//! Length-prefixed binary framing for the store files
//!
//! All integers are big-endian. Variable-length fields are written as
//! `[u32 length][bytes]`.

use crate::error::{Result, VaultError};

/// Current version of both store file formats
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on a single field, guards against absurd allocations from a
/// corrupted length prefix
const MAX_FIELD_LEN: usize = 16 * 1024 * 1024;

#[derive(Default)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|len| *len as usize <= MAX_FIELD_LEN)
            .ok_or_else(|| VaultError::InvalidInput(format!("field too large: {} bytes", bytes.len())))?;
        self.put_u32(len);
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> FrameReader<'a> {
    /// `what` names the file in corruption errors
    pub fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, pos: 0, what }
    }

    fn corrupt(&self, detail: &str) -> VaultError {
        VaultError::CorruptRecord(format!("{}: {} at offset {}", self.what, detail, self.pos))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.corrupt("unexpected end of data"))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(i64::from_be_bytes(buf))
    }

    pub fn get_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.get_u32()? as usize;
        if len > MAX_FIELD_LEN {
            return Err(self.corrupt("field length out of range"));
        }
        self.take(len)
    }

    /// Read and check the leading format version
    pub fn expect_version(&mut self) -> Result<()> {
        let version = self.get_u32()?;
        if version != FORMAT_VERSION {
            return Err(VaultError::CorruptRecord(format!(
                "{}: unsupported format version {}",
                self.what, version
            )));
        }
        Ok(())
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn expect_end(&self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.corrupt("trailing bytes"))
        }
    }
}
