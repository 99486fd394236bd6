//! Binary archive container and frame XML payloads.

pub mod compression;
pub mod cursor;
pub mod mmap;
pub mod reader;
pub mod writer;
pub mod xml;

pub use reader::{decode_archive, decode_single, single_entry, ArchiveReader};
pub use writer::{encode_archive, ArchiveStream, ArchiveWriter};
pub use xml::{decode_frames, encode_frames};
