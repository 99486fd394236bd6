//! Gzip wrapping of whole archive streams.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::types::error::ArchiveResult;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `data` starts with the gzip magic. A plain archive never does:
/// its first bytes are a UTF-8 name, and `0x8b` cannot follow `0x1f` in UTF-8.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Wrap a writer so that everything written to it is gzip-compressed.
pub fn gzip_writer<W: Write>(writer: W) -> GzEncoder<W> {
    GzEncoder::new(writer, Compression::default())
}

/// Inflate a complete gzip stream.
pub fn gunzip(data: &[u8]) -> ArchiveResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Inflate `data` if it is gzip-wrapped, otherwise hand it back untouched.
pub fn unwrap_gzip(data: Vec<u8>) -> ArchiveResult<Vec<u8>> {
    if is_gzip(&data) {
        gunzip(&data)
    } else {
        Ok(data)
    }
}
