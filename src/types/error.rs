//! Error types for the quiz archive library.

use thiserror::Error;

use super::frame::FrameId;

/// All errors that can occur while encoding, decoding or applying edits.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Unexpected XML element, attribute or stray content in a frame payload.
    #[error("Invalid archive schema: {0}")]
    InvalidArchiveSchema(String),

    /// Stream ended before a required delimiter or declared length.
    #[error("Archive is truncated: missing {0}")]
    TruncatedArchive(&'static str),

    /// An Options frame was placed inside another Options frame.
    #[error("Options frames cannot be nested inside options")]
    NestedOptions,

    /// Image frame with a zero dimension.
    #[error("Image dimensions must be positive: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A single-entry archive was expected but none were found.
    #[error("Archive contains no entries")]
    EmptyArchive,

    /// A single-entry archive was expected but several were found.
    #[error("Expected a single archive entry, found {0}")]
    CompoundArchive(usize),

    /// A timestamp field is not valid RFC 3339.
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A delimited text field is not valid UTF-8.
    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A count or length field holds a negative value.
    #[error("Corrupt {field}: {value}")]
    Corrupt { field: &'static str, value: i32 },

    /// More resources than the 4-byte count field can hold.
    #[error("Too many resources in one entry: {0}")]
    TooManyResources(usize),

    /// A resource does not fit the 4-byte length field.
    #[error("Resource {name} is too large: {len} bytes")]
    ResourceTooLarge { name: String, len: u64 },

    /// A resource produced a different number of bytes than it announced.
    #[error("Resource {name} announced {expected} bytes but produced {actual}")]
    ResourceLengthMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// An edit refers to a frame that has no store-assigned id.
    #[error("Frame has no stored id")]
    UnassignedFrame,

    /// An update tried to turn a frame into a different variant.
    #[error("Update changes frame {0} from one variant to another")]
    VariantChanged(FrameId),

    /// The store has no frame with this id.
    #[error("Frame {0} not found")]
    FrameNotFound(FrameId),

    /// Malformed JSON or TOML handed to the command-line tool.
    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for quiz archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
