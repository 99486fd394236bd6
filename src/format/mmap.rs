//! Memory-mapped access to archive files.

use std::path::Path;

use memmap2::Mmap;

use crate::types::error::ArchiveResult;
use crate::types::SharedBuffer;

use super::compression::{gunzip, is_gzip};

/// Map an archive file for reading. Gzip-wrapped files are inflated onto the heap.
pub fn map_file(path: &Path) -> ArchiveResult<SharedBuffer> {
    let file = std::fs::File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(SharedBuffer::Heap(Vec::new()));
    }
    let mmap = unsafe { Mmap::map(&file)? };

    if is_gzip(&mmap) {
        log::debug!("{} is gzip-wrapped, inflating", path.display());
        return Ok(SharedBuffer::Heap(gunzip(&mmap)?));
    }
    Ok(SharedBuffer::Mapped(mmap))
}
