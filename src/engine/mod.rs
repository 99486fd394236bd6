//! Edit log: operations, compaction, and application to a frame store.

pub mod edit;
pub mod optimize;
pub mod store;

pub use edit::{apply, apply_all, EditOperation, FieldUpdate, FrameFields, FrameStore, QuizId};
pub use optimize::optimize;
pub use store::MemoryStore;
