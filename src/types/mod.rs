//! All data types for the quiz archive library.

pub mod archive;
pub mod error;
pub mod frame;
pub mod source;

pub use archive::{QuizArchive, Resources};
pub use error::{ArchiveError, ArchiveResult};
pub use frame::{
    same_frame, Frame, FrameId, ImageFrame, LeafFrame, OptionItem, OptionsFrame,
    PrioritizedFrame, TextFrame,
};
pub use source::{ByteSource, BytesSource, FileSource, SharedBuffer, SliceSource};

use chrono::{DateTime, SecondsFormat, Utc};

/// Preview shown for an image frame without alt text.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Quiz name used when a rename sets an empty name.
pub const UNNAMED_QUIZ: &str = "unnamed";

/// Returns the current time, for stamping new archive entries.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way archive headers store it (RFC 3339, `Z` suffix).
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an archive header timestamp. Any RFC 3339 offset is accepted.
pub fn parse_timestamp(value: &str) -> ArchiveResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ArchiveError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
