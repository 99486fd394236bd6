//! A named quiz entry of an archive, with its frames and binary resources.

use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::frame::Frame;
use super::source::ByteSource;

/// Named binary assets in wire order.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    entries: Vec<(String, Arc<dyn ByteSource>)>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. A name already present keeps its position and gets the new source.
    pub fn insert(&mut self, name: impl Into<String>, source: impl ByteSource + 'static) {
        self.insert_shared(name, Arc::new(source));
    }

    pub fn insert_shared(&mut self, name: impl Into<String>, source: Arc<dyn ByteSource>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = source,
            None => self.entries.push((name, source)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ByteSource> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, source)| source.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn ByteSource>> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ByteSource)> {
        self.entries
            .iter()
            .map(|(n, source)| (n.as_str(), source.as_ref()))
    }

    /// Compare names, order and bytes, reading through every source.
    pub fn contents_eq(&self, other: &Self) -> io::Result<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for ((name_a, a), (name_b, b)) in self.iter().zip(other.iter()) {
            if name_a != name_b || a.len()? != b.len()? || a.read_all()? != b.read_all()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// One quiz of an archive.
#[derive(Debug, Clone)]
pub struct QuizArchive {
    pub name: String,
    pub creation_time: DateTime<Utc>,
    pub modification_time: Option<DateTime<Utc>>,
    pub frames: Vec<Frame>,
    pub resources: Resources,
}

impl QuizArchive {
    pub fn new(name: impl Into<String>, creation_time: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            creation_time,
            modification_time: None,
            frames: Vec::new(),
            resources: Resources::new(),
        }
    }

    pub fn modified_at(mut self, time: DateTime<Utc>) -> Self {
        self.modification_time = Some(time);
        self
    }

    pub fn with_frame(mut self, frame: impl Into<Frame>) -> Self {
        self.frames.push(frame.into());
        self
    }

    pub fn with_resource(
        mut self,
        name: impl Into<String>,
        source: impl ByteSource + 'static,
    ) -> Self {
        self.resources.insert(name, source);
        self
    }

    /// Image filenames referenced by frames but absent from `resources`.
    pub fn missing_resources(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .frames
            .iter()
            .flat_map(|f| f.image_filenames())
            .filter(|name| !self.resources.contains(name))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Field-by-field comparison that reads resource bytes through their sources.
    pub fn contents_eq(&self, other: &Self) -> io::Result<bool> {
        Ok(self.name == other.name
            && self.creation_time == other.creation_time
            && self.modification_time == other.modification_time
            && self.frames == other.frames
            && self.resources.contents_eq(&other.resources)?)
    }
}

/// Unreadable resources compare unequal.
impl PartialEq for QuizArchive {
    fn eq(&self, other: &Self) -> bool {
        self.contents_eq(other).unwrap_or(false)
    }
}
