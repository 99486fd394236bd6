//! Reads archive streams into quiz entries.
//!
//! The stream has no global header. Each entry is decoded in one forward pass:
//! three NUL-terminated header fields, a resource table, then the frame XML.
//! The XML payload of the last entry runs to the end of the stream; every
//! earlier payload is closed by the NUL that separates it from the next entry.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::types::error::{ArchiveError, ArchiveResult};
use crate::types::{
    parse_timestamp, ByteSource, QuizArchive, Resources, SharedBuffer, SliceSource,
};

use super::compression::unwrap_gzip;
use super::cursor::ByteCursor;
use super::mmap::map_file;
use super::xml::decode_frames;

/// Reader for archive streams.
pub struct ArchiveReader;

impl ArchiveReader {
    /// Read an archive file. The file is memory-mapped, so resources stay on
    /// disk until read.
    pub fn read_from_file(path: &Path) -> ArchiveResult<Vec<QuizArchive>> {
        Self::read_buffer(map_file(path)?)
    }

    /// Read from any reader. Gzip-wrapped input is inflated first.
    pub fn read_from(reader: &mut impl Read) -> ArchiveResult<Vec<QuizArchive>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::read_buffer(SharedBuffer::Heap(unwrap_gzip(data)?))
    }

    /// Read the single entry of an archive that must hold exactly one quiz.
    pub fn read_single_from(reader: &mut impl Read) -> ArchiveResult<QuizArchive> {
        single_entry(Self::read_from(reader)?)
    }

    /// Decode an already loaded, unwrapped buffer. Decoded resources are
    /// views into it.
    pub fn read_buffer(buffer: SharedBuffer) -> ArchiveResult<Vec<QuizArchive>> {
        let buffer = Arc::new(buffer);
        let data: &[u8] = (*buffer).as_ref();
        let mut cursor = ByteCursor::new(data);
        let mut entries = Vec::new();

        if cursor.is_at_end() {
            return Ok(entries);
        }

        loop {
            let start = cursor.position();
            let name = cursor.read_str("entry name")?.to_string();
            let creation_time = parse_timestamp(cursor.read_str("creation time")?)?;
            let modification_time = match cursor.read_str("modification time")? {
                "" => None,
                value => Some(parse_timestamp(value)?),
            };

            let resource_count = cursor.read_len("resource count")?;
            let mut resources = Resources::new();
            for _ in 0..resource_count {
                let resource_name = cursor.read_str("resource name")?.to_string();
                let len = cursor.read_len("resource length")?;
                let range = cursor.take(len, "resource bytes")?;
                resources.insert(resource_name, SliceSource::new(Arc::clone(&buffer), range));
            }

            let (payload, last) = match cursor.find_nul() {
                None => (cursor.take_rest(), true),
                Some(_) => (cursor.read_until_nul("entry separator")?, false),
            };
            let xml = std::str::from_utf8(payload)
                .map_err(|_| ArchiveError::InvalidUtf8("frame payload"))?;
            let frames = decode_frames(xml)?;

            log::debug!(
                "Decoded entry {:?}: {} frames, {} resources, {} bytes",
                name,
                frames.len(),
                resources.len(),
                cursor.position() - start
            );

            entries.push(QuizArchive {
                name,
                creation_time,
                modification_time,
                frames,
                resources,
            });

            if last {
                return Ok(entries);
            }
        }
    }
}

/// Decode every entry of an archive source.
pub fn decode_archive(source: &dyn ByteSource) -> ArchiveResult<Vec<QuizArchive>> {
    ArchiveReader::read_from(&mut source.open()?)
}

/// Decode an archive that must hold exactly one entry.
pub fn decode_single(source: &dyn ByteSource) -> ArchiveResult<QuizArchive> {
    single_entry(decode_archive(source)?)
}

/// Assert that a decoded archive has exactly one entry and return it.
pub fn single_entry(mut entries: Vec<QuizArchive>) -> ArchiveResult<QuizArchive> {
    match entries.len() {
        0 => Err(ArchiveError::EmptyArchive),
        1 => Ok(entries.remove(0)),
        n => Err(ArchiveError::CompoundArchive(n)),
    }
}
