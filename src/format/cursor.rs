//! Forward-only scanning over a NUL-delimited archive buffer.

use std::ops::Range;

use crate::types::error::{ArchiveError, ArchiveResult};

/// Field delimiter and entry separator.
pub const NUL: u8 = 0x00;

/// Read position over an archive buffer. Never moves backwards.
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Absolute index of the next NUL at or after the cursor.
    pub fn find_nul(&self) -> Option<usize> {
        self.data[self.pos..]
            .iter()
            .position(|&b| b == NUL)
            .map(|i| self.pos + i)
    }

    /// Bytes up to the next NUL; the NUL is consumed but not returned.
    pub fn read_until_nul(&mut self, field: &'static str) -> ArchiveResult<&'a [u8]> {
        let end = self
            .find_nul()
            .ok_or(ArchiveError::TruncatedArchive(field))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end + 1;
        Ok(bytes)
    }

    /// A NUL-terminated UTF-8 field.
    pub fn read_str(&mut self, field: &'static str) -> ArchiveResult<&'a str> {
        let bytes = self.read_until_nul(field)?;
        std::str::from_utf8(bytes).map_err(|_| ArchiveError::InvalidUtf8(field))
    }

    /// A 4-byte big-endian signed integer.
    pub fn read_i32(&mut self, field: &'static str) -> ArchiveResult<i32> {
        let range = self.take(4, field)?;
        let bytes: [u8; 4] = self.data[range]
            .try_into()
            .map_err(|_| ArchiveError::TruncatedArchive(field))?;
        Ok(i32::from_be_bytes(bytes))
    }

    /// A 4-byte count or length; negative values are corrupt.
    pub fn read_len(&mut self, field: &'static str) -> ArchiveResult<usize> {
        let value = self.read_i32(field)?;
        usize::try_from(value).map_err(|_| ArchiveError::Corrupt { field, value })
    }

    /// Consume exactly `len` bytes and return their range in the buffer.
    pub fn take(&mut self, len: usize, field: &'static str) -> ArchiveResult<Range<usize>> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ArchiveError::TruncatedArchive(field))?;
        let range = self.pos..end;
        self.pos = end;
        Ok(range)
    }

    /// Consume everything left.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }
}
