//! In-memory frame store.

use std::collections::{BTreeMap, HashMap};

use crate::types::{
    ArchiveError, ArchiveResult, Frame, FrameId, ImageFrame, LeafFrame, OptionItem, OptionsFrame,
    PrioritizedFrame, TextFrame,
};

use super::edit::{apply, EditOperation, FieldUpdate, FrameFields, FrameStore, QuizId};

#[derive(Debug, Clone)]
struct StoredFrame {
    quiz_id: QuizId,
    fields: FrameFields,
}

#[derive(Debug, Clone, Copy)]
struct ItemLink {
    options_id: u64,
    is_key: bool,
    priority: i32,
}

/// A [`FrameStore`] kept entirely in memory.
///
/// Top-level frames of each quiz are kept in an explicit order; inserting at
/// priority `p` places the frame at position `p`. Frames attached to options
/// leave that order and are listed under their options frame instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    frames: BTreeMap<u64, StoredFrame>,
    order: HashMap<QuizId, Vec<u64>>,
    links: HashMap<u64, ItemLink>,
    quiz_names: HashMap<QuizId, String>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `frames` into a quiz in order and return them with their stored ids.
    pub fn load(&mut self, quiz_id: QuizId, frames: &[Frame]) -> ArchiveResult<Vec<Frame>> {
        let start = self.order.get(&quiz_id).map_or(0, Vec::len);
        for (i, frame) in frames.iter().enumerate() {
            let edit = EditOperation::Append {
                frame: frame.clone(),
                insert_index: start + i,
            };
            apply(&edit, self, quiz_id)?;
        }
        Ok(self
            .quiz_frames(quiz_id)?
            .into_iter()
            .skip(start)
            .map(|f| f.frame)
            .collect())
    }

    pub fn quiz_name(&self, quiz_id: QuizId) -> Option<&str> {
        self.quiz_names.get(&quiz_id).map(String::as_str)
    }

    /// Number of stored frame rows, option items included.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.frames.contains_key(&id)
    }

    /// Rebuild a quiz's frame trees in display order.
    pub fn quiz_frames(&self, quiz_id: QuizId) -> ArchiveResult<Vec<PrioritizedFrame>> {
        let Some(order) = self.order.get(&quiz_id) else {
            return Ok(Vec::new());
        };
        order
            .iter()
            .enumerate()
            .map(|(pos, &id)| {
                let priority = i32::try_from(pos).unwrap_or(i32::MAX);
                Ok(PrioritizedFrame::new(self.build_frame(id)?, priority))
            })
            .collect()
    }

    fn build_frame(&self, id: u64) -> ArchiveResult<Frame> {
        let stored = self.get(id)?;
        let frame = match &stored.fields {
            FrameFields::Options { name } => {
                let mut items: Vec<(u64, ItemLink)> = self
                    .links
                    .iter()
                    .filter(|(_, link)| link.options_id == id)
                    .map(|(&item_id, &link)| (item_id, link))
                    .collect();
                items.sort_by_key(|&(item_id, link)| (link.priority, item_id));
                let items = items
                    .into_iter()
                    .map(|(item_id, link)| {
                        let leaf = LeafFrame::try_from(self.build_frame(item_id)?)?;
                        Ok(OptionItem::new(leaf, link.is_key, link.priority))
                    })
                    .collect::<ArchiveResult<Vec<_>>>()?;
                Frame::Options(OptionsFrame::new(name.clone(), items))
            }
            fields => frame_from_fields(fields)?,
        };
        Ok(frame.with_id(FrameId::Stored(id)))
    }

    fn get(&self, id: u64) -> ArchiveResult<&StoredFrame> {
        self.frames
            .get(&id)
            .ok_or(ArchiveError::FrameNotFound(FrameId::Stored(id)))
    }
}

fn frame_from_fields(fields: &FrameFields) -> ArchiveResult<Frame> {
    Ok(match fields {
        FrameFields::Text { content } => Frame::Text(TextFrame::new(content.clone())),
        FrameFields::Image {
            filename,
            width,
            height,
            alt_text,
        } => Frame::Image(ImageFrame::new(
            filename.clone(),
            *width,
            *height,
            alt_text.clone(),
        )?),
        FrameFields::Options { name } => Frame::Options(OptionsFrame::new(name.clone(), Vec::new())),
    })
}

impl FrameStore for MemoryStore {
    fn insert_frame(
        &mut self,
        quiz_id: QuizId,
        fields: &FrameFields,
        priority: i32,
    ) -> ArchiveResult<u64> {
        if let FrameFields::Image { width, height, .. } = *fields {
            if width == 0 || height == 0 {
                return Err(ArchiveError::InvalidDimensions { width, height });
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.frames.insert(
            id,
            StoredFrame {
                quiz_id,
                fields: fields.clone(),
            },
        );
        let order = self.order.entry(quiz_id).or_default();
        let pos = usize::try_from(priority).unwrap_or(0).min(order.len());
        order.insert(pos, id);
        Ok(id)
    }

    fn remove_frame(&mut self, id: u64) -> ArchiveResult<()> {
        let stored = self
            .frames
            .remove(&id)
            .ok_or(ArchiveError::FrameNotFound(FrameId::Stored(id)))?;
        if let Some(order) = self.order.get_mut(&stored.quiz_id) {
            order.retain(|&f| f != id);
        }
        self.links.remove(&id);
        // Items of a removed options frame become orphans; drop them too.
        let orphans: Vec<u64> = self
            .links
            .iter()
            .filter(|(_, link)| link.options_id == id)
            .map(|(&item_id, _)| item_id)
            .collect();
        for item_id in orphans {
            self.links.remove(&item_id);
            self.frames.remove(&item_id);
        }
        Ok(())
    }

    fn update_frame_content(&mut self, id: u64, updates: &[FieldUpdate]) -> ArchiveResult<()> {
        let stored = self
            .frames
            .get_mut(&id)
            .ok_or(ArchiveError::FrameNotFound(FrameId::Stored(id)))?;
        for update in updates {
            match (&mut stored.fields, update) {
                (FrameFields::Text { content }, FieldUpdate::Content(value)) => {
                    *content = value.clone();
                }
                (FrameFields::Image { filename, .. }, FieldUpdate::Filename(value)) => {
                    *filename = value.clone();
                }
                (
                    FrameFields::Image { width, height, .. },
                    &FieldUpdate::Dimensions {
                        width: w,
                        height: h,
                    },
                ) => {
                    if w == 0 || h == 0 {
                        return Err(ArchiveError::InvalidDimensions {
                            width: w,
                            height: h,
                        });
                    }
                    *width = w;
                    *height = h;
                }
                (FrameFields::Image { alt_text, .. }, FieldUpdate::AltText(value)) => {
                    *alt_text = value.clone();
                }
                (FrameFields::Options { name }, FieldUpdate::Name(value)) => {
                    *name = value.clone();
                }
                _ => return Err(ArchiveError::VariantChanged(FrameId::Stored(id))),
            }
        }
        Ok(())
    }

    fn update_quiz_name(&mut self, quiz_id: QuizId, name: &str) -> ArchiveResult<()> {
        self.quiz_names.insert(quiz_id, name.to_string());
        Ok(())
    }

    fn associate_option_item(
        &mut self,
        options_id: u64,
        item_id: u64,
        is_key: bool,
        priority: i32,
    ) -> ArchiveResult<()> {
        if !matches!(self.get(options_id)?.fields, FrameFields::Options { .. }) {
            return Err(ArchiveError::InvalidArchiveSchema(format!(
                "frame #{} is not an options frame",
                options_id
            )));
        }
        if matches!(self.get(item_id)?.fields, FrameFields::Options { .. }) {
            return Err(ArchiveError::NestedOptions);
        }
        let quiz_id = self.get(item_id)?.quiz_id;
        if let Some(order) = self.order.get_mut(&quiz_id) {
            order.retain(|&f| f != item_id);
        }
        self.links.insert(
            item_id,
            ItemLink {
                options_id,
                is_key,
                priority,
            },
        );
        Ok(())
    }
}
