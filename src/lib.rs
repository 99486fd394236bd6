//! Quiz archive codec and edit-log compaction.
//!
//! Quizzes are trees of frames (text, images, answer options). This crate
//! packs one or more quizzes with their binary resources into a portable
//! archive stream, reads such streams back, and compacts the edit logs an
//! authoring session produces before they are applied to a frame store.

pub mod cli;
pub mod engine;
pub mod format;
pub mod types;

// Re-export commonly used types at the crate root
pub use engine::{
    apply, apply_all, optimize, EditOperation, FieldUpdate, FrameFields, FrameStore, MemoryStore,
    QuizId,
};
pub use format::{
    decode_archive, decode_frames, decode_single, encode_archive, encode_frames, single_entry,
    ArchiveReader, ArchiveStream, ArchiveWriter,
};
pub use types::{
    now, ArchiveError, ArchiveResult, ByteSource, BytesSource, FileSource, Frame, FrameId,
    ImageFrame, LeafFrame, OptionItem, OptionsFrame, PrioritizedFrame, QuizArchive, Resources,
    TextFrame, IMAGE_PLACEHOLDER, UNNAMED_QUIZ,
};
