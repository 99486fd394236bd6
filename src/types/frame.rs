//! Frame tree types: the recursive unit of quiz content.
//!
//! Options may only hold leaf frames (text or image). The nesting rule is part
//! of the types: [`OptionItem`] wraps a [`LeafFrame`], and the only way to turn
//! an arbitrary [`Frame`] into one is the checked `TryFrom` conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ArchiveError, ArchiveResult};
use super::IMAGE_PLACEHOLDER;

/// Identity of a frame in an editing session or a store.
///
/// Frames built for export or import carry no id at all (`Option::None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameId {
    /// Assigned by an editing session to a frame not yet committed.
    Draft(u32),
    /// Assigned by a store on insertion.
    Stored(u64),
}

impl FrameId {
    /// The store-assigned value, if any.
    pub fn stored(self) -> Option<u64> {
        match self {
            Self::Stored(id) => Some(id),
            Self::Draft(_) => None,
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft(id) => write!(f, "draft#{}", id),
            Self::Stored(id) => write!(f, "#{}", id),
        }
    }
}

/// Whether two optional ids name the same frame. Unassigned ids never match.
pub fn same_frame(a: Option<FrameId>, b: Option<FrameId>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// A block of plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFrame {
    #[serde(default)]
    pub id: Option<FrameId>,
    pub content: String,
}

impl TextFrame {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
        }
    }

    pub fn with_id(mut self, id: FrameId) -> Self {
        self.id = Some(id);
        self
    }
}

impl PartialEq for TextFrame {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for TextFrame {}

/// An image referenced by resource filename.
///
/// Width and height are always positive; construction goes through
/// [`ImageFrame::new`], and deserialization applies the same check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ImageFrameRepr")]
pub struct ImageFrame {
    id: Option<FrameId>,
    filename: String,
    width: u32,
    height: u32,
    alt_text: Option<String>,
}

#[derive(Deserialize)]
struct ImageFrameRepr {
    #[serde(default)]
    id: Option<FrameId>,
    filename: String,
    width: u32,
    height: u32,
    #[serde(default)]
    alt_text: Option<String>,
}

impl TryFrom<ImageFrameRepr> for ImageFrame {
    type Error = ArchiveError;

    fn try_from(repr: ImageFrameRepr) -> ArchiveResult<Self> {
        let image = Self::new(repr.filename, repr.width, repr.height, repr.alt_text)?;
        Ok(Self {
            id: repr.id,
            ..image
        })
    }
}

impl ImageFrame {
    /// Create an image frame, rejecting zero dimensions.
    pub fn new(
        filename: impl Into<String>,
        width: u32,
        height: u32,
        alt_text: Option<String>,
    ) -> ArchiveResult<Self> {
        if width == 0 || height == 0 {
            return Err(ArchiveError::InvalidDimensions { width, height });
        }
        Ok(Self {
            id: None,
            filename: filename.into(),
            width,
            height,
            alt_text,
        })
    }

    pub fn with_id(mut self, id: FrameId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<FrameId> {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn alt_text(&self) -> Option<&str> {
        self.alt_text.as_deref()
    }
}

impl PartialEq for ImageFrame {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
            && self.width == other.width
            && self.height == other.height
            && self.alt_text == other.alt_text
    }
}

impl Eq for ImageFrame {}

/// A frame allowed inside an options list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeafFrame {
    Text(TextFrame),
    Image(ImageFrame),
}

impl LeafFrame {
    pub fn id(&self) -> Option<FrameId> {
        match self {
            Self::Text(text) => text.id,
            Self::Image(image) => image.id,
        }
    }

    pub fn with_id(self, id: FrameId) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.with_id(id)),
            Self::Image(image) => Self::Image(image.with_id(id)),
        }
    }

    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) => text.content.clone(),
            Self::Image(image) => image
                .alt_text()
                .unwrap_or(IMAGE_PLACEHOLDER)
                .to_string(),
        }
    }
}

impl From<TextFrame> for LeafFrame {
    fn from(text: TextFrame) -> Self {
        Self::Text(text)
    }
}

impl From<ImageFrame> for LeafFrame {
    fn from(image: ImageFrame) -> Self {
        Self::Image(image)
    }
}

impl TryFrom<Frame> for LeafFrame {
    type Error = ArchiveError;

    fn try_from(frame: Frame) -> ArchiveResult<Self> {
        match frame {
            Frame::Text(text) => Ok(Self::Text(text)),
            Frame::Image(image) => Ok(Self::Image(image)),
            Frame::Options(_) => Err(ArchiveError::NestedOptions),
        }
    }
}

/// One answer option of an options frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub frame: LeafFrame,
    /// Marks a correct answer. Several items may be keys.
    #[serde(default)]
    pub is_key: bool,
    /// Display order within the options frame.
    pub priority: i32,
}

impl OptionItem {
    pub fn new(frame: impl Into<LeafFrame>, is_key: bool, priority: i32) -> Self {
        Self {
            frame: frame.into(),
            is_key,
            priority,
        }
    }

    /// Build an item from an arbitrary frame. Fails with `NestedOptions` for an
    /// options frame.
    pub fn try_new(frame: Frame, is_key: bool, priority: i32) -> ArchiveResult<Self> {
        Ok(Self::new(LeafFrame::try_from(frame)?, is_key, priority))
    }
}

/// A set of answer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsFrame {
    #[serde(default)]
    pub id: Option<FrameId>,
    #[serde(default)]
    pub name: Option<String>,
    pub items: Vec<OptionItem>,
}

impl OptionsFrame {
    pub fn new(name: Option<String>, items: Vec<OptionItem>) -> Self {
        Self {
            id: None,
            name,
            items,
        }
    }

    pub fn with_id(mut self, id: FrameId) -> Self {
        self.id = Some(id);
        self
    }

    /// Items in display order. Equal priorities keep their stored order.
    pub fn sorted_items(&self) -> Vec<&OptionItem> {
        let mut items: Vec<&OptionItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.priority);
        items
    }

    /// Items marked as correct answers.
    pub fn keys(&self) -> impl Iterator<Item = &OptionItem> {
        self.items.iter().filter(|item| item.is_key)
    }

    pub fn preview(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.sorted_items()
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item.frame.preview()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PartialEq for OptionsFrame {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.items == other.items
    }
}

impl Eq for OptionsFrame {}

/// A unit of quiz content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    Text(TextFrame),
    Image(ImageFrame),
    Options(OptionsFrame),
}

impl Frame {
    pub fn id(&self) -> Option<FrameId> {
        match self {
            Self::Text(text) => text.id,
            Self::Image(image) => image.id,
            Self::Options(options) => options.id,
        }
    }

    pub fn with_id(self, id: FrameId) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.with_id(id)),
            Self::Image(image) => Self::Image(image.with_id(id)),
            Self::Options(options) => Self::Options(options.with_id(id)),
        }
    }

    /// Short name of the variant, as used in the XML schema.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Options(_) => "options",
        }
    }

    /// One-line-ish text used by list views.
    pub fn preview(&self) -> String {
        match self {
            Self::Text(text) => text.content.clone(),
            Self::Image(image) => image
                .alt_text()
                .unwrap_or(IMAGE_PLACEHOLDER)
                .to_string(),
            Self::Options(options) => options.preview(),
        }
    }

    /// Image filenames referenced anywhere in this frame.
    pub fn image_filenames(&self) -> Vec<&str> {
        match self {
            Self::Text(_) => Vec::new(),
            Self::Image(image) => vec![image.filename()],
            Self::Options(options) => options
                .items
                .iter()
                .filter_map(|item| match &item.frame {
                    LeafFrame::Image(image) => Some(image.filename()),
                    LeafFrame::Text(_) => None,
                })
                .collect(),
        }
    }
}

impl From<TextFrame> for Frame {
    fn from(text: TextFrame) -> Self {
        Self::Text(text)
    }
}

impl From<ImageFrame> for Frame {
    fn from(image: ImageFrame) -> Self {
        Self::Image(image)
    }
}

impl From<OptionsFrame> for Frame {
    fn from(options: OptionsFrame) -> Self {
        Self::Options(options)
    }
}

impl From<LeafFrame> for Frame {
    fn from(leaf: LeafFrame) -> Self {
        match leaf {
            LeafFrame::Text(text) => Self::Text(text),
            LeafFrame::Image(image) => Self::Image(image),
        }
    }
}

/// A top-level frame with its position among the quiz's other frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedFrame {
    pub frame: Frame,
    pub priority: i32,
}

impl PrioritizedFrame {
    pub fn new(frame: impl Into<Frame>, priority: i32) -> Self {
        Self {
            frame: frame.into(),
            priority,
        }
    }

    /// Interleave frames by priority. Equal priorities keep their input order.
    pub fn into_ordered(mut frames: Vec<PrioritizedFrame>) -> Vec<Frame> {
        frames.sort_by_key(|f| f.priority);
        frames.into_iter().map(|f| f.frame).collect()
    }
}
