//! Edit operations and how they are applied to a frame store.

use serde::{Deserialize, Serialize};

use crate::types::{
    ArchiveError, ArchiveResult, Frame, FrameId, ImageFrame, LeafFrame, OptionItem, OptionsFrame,
    TextFrame, UNNAMED_QUIZ,
};

/// Store-side identifier of a quiz.
pub type QuizId = u64;

/// One pending change made by an editing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    /// Insert a new top-level frame at `insert_index`.
    Append { frame: Frame, insert_index: usize },
    /// Delete a frame (options are removed together with their items).
    Remove { frame: Frame, old_index: usize },
    /// Replace a frame's content. `old` is the state the store currently holds.
    Update { old: Frame, new: Frame },
    /// Change the quiz display name.
    Rename { old_name: String, new_name: String },
}

impl EditOperation {
    /// Id of the frame this edit targets, if any.
    pub fn target(&self) -> Option<FrameId> {
        match self {
            Self::Append { frame, .. } | Self::Remove { frame, .. } => frame.id(),
            Self::Update { old, new } => old.id().or(new.id()),
            Self::Rename { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Append { .. } => "append",
            Self::Remove { .. } => "remove",
            Self::Update { .. } => "update",
            Self::Rename { .. } => "rename",
        }
    }
}

/// Content of a single frame row, without option items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameFields {
    Text {
        content: String,
    },
    Image {
        filename: String,
        width: u32,
        height: u32,
        alt_text: Option<String>,
    },
    Options {
        name: Option<String>,
    },
}

impl FrameFields {
    pub fn of(frame: &Frame) -> Self {
        match frame {
            Frame::Text(text) => Self::of_text(text),
            Frame::Image(image) => Self::of_image(image),
            Frame::Options(options) => Self::Options {
                name: options.name.clone(),
            },
        }
    }

    pub fn of_leaf(frame: &LeafFrame) -> Self {
        match frame {
            LeafFrame::Text(text) => Self::of_text(text),
            LeafFrame::Image(image) => Self::of_image(image),
        }
    }

    fn of_text(text: &TextFrame) -> Self {
        Self::Text {
            content: text.content.clone(),
        }
    }

    fn of_image(image: &ImageFrame) -> Self {
        Self::Image {
            filename: image.filename().to_string(),
            width: image.width(),
            height: image.height(),
            alt_text: image.alt_text().map(str::to_string),
        }
    }
}

/// A single changed field of a stored frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate {
    Content(String),
    Filename(String),
    Dimensions { width: u32, height: u32 },
    AltText(Option<String>),
    Name(Option<String>),
}

/// Persistent storage of quiz frames. Implemented outside this crate for real
/// databases; [`MemoryStore`](super::store::MemoryStore) is the in-memory one.
pub trait FrameStore {
    /// Insert one frame row and return its new id.
    fn insert_frame(&mut self, quiz_id: QuizId, fields: &FrameFields, priority: i32)
        -> ArchiveResult<u64>;

    fn remove_frame(&mut self, id: u64) -> ArchiveResult<()>;

    fn update_frame_content(&mut self, id: u64, updates: &[FieldUpdate]) -> ArchiveResult<()>;

    fn update_quiz_name(&mut self, quiz_id: QuizId, name: &str) -> ArchiveResult<()>;

    /// Attach a frame to an options frame as an item, or change an existing
    /// item's key flag and priority.
    fn associate_option_item(
        &mut self,
        options_id: u64,
        item_id: u64,
        is_key: bool,
        priority: i32,
    ) -> ArchiveResult<()>;
}

/// Apply one edit to the store. Returns the id assigned by an `Append`.
///
/// Each call should run in its own store transaction; nothing here spans edits.
pub fn apply(
    edit: &EditOperation,
    store: &mut dyn FrameStore,
    quiz_id: QuizId,
) -> ArchiveResult<Option<FrameId>> {
    match edit {
        EditOperation::Append {
            frame,
            insert_index,
        } => {
            let priority = i32::try_from(*insert_index).unwrap_or(i32::MAX);
            let id = store.insert_frame(quiz_id, &FrameFields::of(frame), priority)?;
            if let Frame::Options(options) = frame {
                for item in &options.items {
                    append_item(store, quiz_id, id, item)?;
                }
            }
            log::debug!("Appended {} frame #{} at {}", frame.kind(), id, insert_index);
            return Ok(Some(FrameId::Stored(id)));
        }
        EditOperation::Remove { frame, .. } => {
            let id = stored_id(frame.id())?;
            // Items that never reached the store have nothing to remove.
            let item_ids: Vec<u64> = match frame {
                Frame::Options(options) => options
                    .items
                    .iter()
                    .filter_map(|item| item.frame.id().and_then(FrameId::stored))
                    .collect(),
                _ => Vec::new(),
            };
            for item_id in item_ids {
                store.remove_frame(item_id)?;
            }
            store.remove_frame(id)?;
            log::debug!("Removed {} frame #{}", frame.kind(), id);
        }
        EditOperation::Update { old, new } => {
            let id = stored_id(old.id().or(new.id()))?;
            update_frame(store, quiz_id, id, old, new)?;
        }
        EditOperation::Rename { new_name, .. } => {
            let name = if new_name.is_empty() {
                UNNAMED_QUIZ
            } else {
                new_name.as_str()
            };
            store.update_quiz_name(quiz_id, name)?;
        }
    }
    Ok(None)
}

/// Apply edits in order, stopping at the first failure. Returns how many were applied.
pub fn apply_all(
    edits: &[EditOperation],
    store: &mut dyn FrameStore,
    quiz_id: QuizId,
) -> ArchiveResult<usize> {
    for (applied, edit) in edits.iter().enumerate() {
        if let Err(e) = apply(edit, store, quiz_id) {
            log::warn!("{} failed after {} applied edits: {}", edit.kind(), applied, e);
            return Err(e);
        }
    }
    Ok(edits.len())
}

fn stored_id(id: Option<FrameId>) -> ArchiveResult<u64> {
    id.and_then(FrameId::stored)
        .ok_or(ArchiveError::UnassignedFrame)
}

fn append_item(
    store: &mut dyn FrameStore,
    quiz_id: QuizId,
    options_id: u64,
    item: &OptionItem,
) -> ArchiveResult<u64> {
    let item_id = store.insert_frame(quiz_id, &FrameFields::of_leaf(&item.frame), item.priority)?;
    store.associate_option_item(options_id, item_id, item.is_key, item.priority)?;
    Ok(item_id)
}

fn update_frame(
    store: &mut dyn FrameStore,
    quiz_id: QuizId,
    id: u64,
    old: &Frame,
    new: &Frame,
) -> ArchiveResult<()> {
    match (old, new) {
        (Frame::Text(a), Frame::Text(b)) => write_updates(store, id, text_updates(a, b)),
        (Frame::Image(a), Frame::Image(b)) => write_updates(store, id, image_updates(a, b)),
        (Frame::Options(a), Frame::Options(b)) => update_options(store, quiz_id, id, a, b),
        _ => Err(ArchiveError::VariantChanged(FrameId::Stored(id))),
    }
}

fn write_updates(store: &mut dyn FrameStore, id: u64, updates: Vec<FieldUpdate>) -> ArchiveResult<()> {
    if updates.is_empty() {
        return Ok(());
    }
    log::debug!("Updating frame #{}: {} fields", id, updates.len());
    store.update_frame_content(id, &updates)
}

fn text_updates(old: &TextFrame, new: &TextFrame) -> Vec<FieldUpdate> {
    if old.content == new.content {
        Vec::new()
    } else {
        vec![FieldUpdate::Content(new.content.clone())]
    }
}

fn image_updates(old: &ImageFrame, new: &ImageFrame) -> Vec<FieldUpdate> {
    let mut updates = Vec::new();
    if old.filename() != new.filename() {
        updates.push(FieldUpdate::Filename(new.filename().to_string()));
    }
    if (old.width(), old.height()) != (new.width(), new.height()) {
        updates.push(FieldUpdate::Dimensions {
            width: new.width(),
            height: new.height(),
        });
    }
    if old.alt_text() != new.alt_text() {
        updates.push(FieldUpdate::AltText(new.alt_text().map(str::to_string)));
    }
    updates
}

/// Diff option items by stored id: drop the vanished ones, append the new
/// ones, update content and key flags of the ones present in both.
fn update_options(
    store: &mut dyn FrameStore,
    quiz_id: QuizId,
    options_id: u64,
    old: &OptionsFrame,
    new: &OptionsFrame,
) -> ArchiveResult<()> {
    if old.name != new.name {
        write_updates(store, options_id, vec![FieldUpdate::Name(new.name.clone())])?;
    }

    let kept = |id: u64| {
        new.items
            .iter()
            .any(|item| item.frame.id().and_then(FrameId::stored) == Some(id))
    };
    for item in &old.items {
        let id = stored_id(item.frame.id())?;
        if !kept(id) {
            store.remove_frame(id)?;
        }
    }

    for item in &new.items {
        let previous = item.frame.id().and_then(FrameId::stored).and_then(|id| {
            old.items
                .iter()
                .find(|o| o.frame.id().and_then(FrameId::stored) == Some(id))
                .map(|o| (id, o))
        });
        let Some((item_id, previous)) = previous else {
            append_item(store, quiz_id, options_id, item)?;
            continue;
        };

        match (&previous.frame, &item.frame) {
            (LeafFrame::Text(a), LeafFrame::Text(b)) => {
                write_updates(store, item_id, text_updates(a, b))?
            }
            (LeafFrame::Image(a), LeafFrame::Image(b)) => {
                write_updates(store, item_id, image_updates(a, b))?
            }
            _ => {
                // An item that switched between text and image is replaced.
                store.remove_frame(item_id)?;
                append_item(store, quiz_id, options_id, item)?;
                continue;
            }
        }
        if previous.is_key != item.is_key || previous.priority != item.priority {
            store.associate_option_item(options_id, item_id, item.is_key, item.priority)?;
        }
    }
    Ok(())
}
