//! Writes quiz entries as an archive stream.
//!
//! Per-entry layout:
//!
//! ```text
//! name\0  creation_time\0  modification_time\0     (RFC 3339, empty if absent)
//! i32 BE resource count
//! { resource_name\0  i32 BE length  <length bytes> } * count
//! <frame_container>...</frame_container>            (no leading delimiter)
//! \0                                                (only between entries)
//! ```

use std::io::{self, Read, Write};
use std::path::Path;

use crate::types::error::{ArchiveError, ArchiveResult};
use crate::types::{format_timestamp, ByteSource, BytesSource, QuizArchive};

use super::compression::gzip_writer;
use super::cursor::NUL;
use super::xml::encode_frames;

/// Writer for archive streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveWriter {
    gzip: bool,
}

impl ArchiveWriter {
    /// Create a writer producing a plain (unwrapped) stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the whole stream in gzip.
    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }

    /// Write entries to an archive file.
    pub fn write_to_file(&self, entries: &[QuizArchive], path: &Path) -> ArchiveResult<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write_to(entries, &mut writer)
    }

    /// Write entries to any writer.
    pub fn write_to(&self, entries: &[QuizArchive], writer: &mut impl Write) -> ArchiveResult<()> {
        if self.gzip {
            let mut stream = ArchiveStream::new(gzip_writer(&mut *writer));
            for entry in entries {
                stream.push(entry)?;
            }
            stream.finish()?.finish()?;
        } else {
            let mut stream = ArchiveStream::new(&mut *writer);
            for entry in entries {
                stream.push(entry)?;
            }
            stream.finish()?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Encode entries into an in-memory archive.
pub fn encode_archive(entries: &[QuizArchive]) -> ArchiveResult<BytesSource> {
    let mut buf = Vec::new();
    ArchiveWriter::new().write_to(entries, &mut buf)?;
    Ok(BytesSource::new(buf))
}

/// Incremental archive output: entries are written as they are pushed, with
/// no need to know how many will follow.
pub struct ArchiveStream<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> ArchiveStream<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.written
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Append one entry, preceded by the separator unless it is the first.
    pub fn push(&mut self, entry: &QuizArchive) -> ArchiveResult<()> {
        if self.written > 0 {
            self.inner.write_all(&[NUL])?;
        }
        write_entry(&mut self.inner, entry)?;
        self.written += 1;
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> ArchiveResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn write_entry(writer: &mut impl Write, entry: &QuizArchive) -> ArchiveResult<()> {
    warn_on_nul("entry name", &entry.name, &entry.name);
    write_field(writer, &entry.name)?;
    write_field(writer, &format_timestamp(&entry.creation_time))?;
    let modified = entry
        .modification_time
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_default();
    write_field(writer, &modified)?;

    let count = i32::try_from(entry.resources.len())
        .map_err(|_| ArchiveError::TooManyResources(entry.resources.len()))?;
    writer.write_all(&count.to_be_bytes())?;
    for (name, source) in entry.resources.iter() {
        warn_on_nul("resource name", &entry.name, name);
        write_field(writer, name)?;
        write_resource(writer, name, source)?;
    }

    let missing = entry.missing_resources();
    if !missing.is_empty() {
        log::warn!(
            "Entry {:?} references images without resources: {}",
            entry.name,
            missing.join(", ")
        );
    }

    let xml = encode_frames(&entry.frames);
    warn_on_nul("frame payload", &entry.name, &xml);
    writer.write_all(xml.as_bytes())?;

    log::debug!(
        "Wrote entry {:?}: {} frames, {} resources, {} payload bytes",
        entry.name,
        entry.frames.len(),
        entry.resources.len(),
        xml.len()
    );
    Ok(())
}

fn write_field(writer: &mut impl Write, value: &str) -> io::Result<()> {
    writer.write_all(value.as_bytes())?;
    writer.write_all(&[NUL])
}

/// Length prefix, then the bytes streamed straight from the source.
fn write_resource(writer: &mut impl Write, name: &str, source: &dyn ByteSource) -> ArchiveResult<()> {
    let expected = source.len()?;
    let len = i32::try_from(expected).map_err(|_| ArchiveError::ResourceTooLarge {
        name: name.to_string(),
        len: expected,
    })?;
    writer.write_all(&len.to_be_bytes())?;

    let mut reader = source.open()?.take(expected);
    let copied = io::copy(&mut reader, writer)?;
    let overflow = reader.into_inner().read(&mut [0u8; 1])?;
    if copied != expected || overflow != 0 {
        return Err(ArchiveError::ResourceLengthMismatch {
            name: name.to_string(),
            expected,
            actual: copied + overflow as u64,
        });
    }
    Ok(())
}

/// NUL bytes are field delimiters; one inside a field corrupts the stream for readers.
fn warn_on_nul(field: &str, entry: &str, value: &str) {
    if value.contains('\0') {
        log::warn!(
            "Entry {:?}: {} contains a NUL byte; the archive will not decode",
            entry,
            field
        );
    }
}
