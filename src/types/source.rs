//! Lazily readable byte sources backing archive resources.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A handle that can produce a stream of bytes on demand.
///
/// Archive writers ask for `len` up front (it is written before the bytes)
/// and then copy from `open` straight into the output.
pub trait ByteSource: fmt::Debug + Send + Sync {
    /// Number of bytes `open` will yield.
    fn len(&self) -> io::Result<u64>;

    /// Open a fresh reader positioned at the first byte.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Materialize the whole source.
    fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.len()? as usize);
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Bytes held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct BytesSource {
    data: Vec<u8>,
}

impl BytesSource {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for BytesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesSource")
            .field("len", &self.data.len())
            .finish()
    }
}

impl ByteSource for BytesSource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.data.as_slice()))
    }
}

/// A file on disk, opened only when read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(BufReader::new(File::open(&self.path)?)))
    }
}

/// Backing storage of a decoded archive, shared by all of its resources.
pub enum SharedBuffer {
    Heap(Vec<u8>),
    Mapped(memmap2::Mmap),
}

impl AsRef<[u8]> for SharedBuffer {
    fn as_ref(&self) -> &[u8] {
        match self {
            Self::Heap(data) => data,
            Self::Mapped(map) => map,
        }
    }
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Heap(_) => "Heap",
            Self::Mapped(_) => "Mapped",
        };
        f.debug_struct("SharedBuffer")
            .field("kind", &kind)
            .field("len", &self.as_ref().len())
            .finish()
    }
}

/// A byte range inside a [`SharedBuffer`]. No bytes are copied until read.
#[derive(Debug, Clone)]
pub struct SliceSource {
    buffer: Arc<SharedBuffer>,
    range: Range<usize>,
}

impl SliceSource {
    /// Callers guarantee `range` lies within `buffer`.
    pub fn new(buffer: Arc<SharedBuffer>, range: Range<usize>) -> Self {
        debug_assert!(range.end <= AsRef::<[u8]>::as_ref(&*buffer).len());
        Self { buffer, range }
    }

    pub fn as_bytes(&self) -> &[u8] {
        let bytes: &[u8] = (*self.buffer).as_ref();
        &bytes[self.range.clone()]
    }
}

impl ByteSource for SliceSource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.range.len() as u64)
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.as_bytes()))
    }
}
