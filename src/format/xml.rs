//! Frame tree <-> `frame_container` XML payload.
//!
//! The vocabulary is fixed:
//!
//! ```text
//! <frame_container>
//!   <text>raw content</text>
//!   <image width="400" height="295" src="cat.jpg" alt="optional"/>
//!   <options name="optional">
//!     <option key="true" priority="0"><text>yes</text></option>
//!     <option priority="1"><image .../></option>
//!   </options>
//! </frame_container>
//! ```
//!
//! Decoding is strict: unknown elements or attributes, stray text, and
//! anything but exactly one `<text>`/`<image>` inside `<option>` are
//! `InvalidArchiveSchema`. Ids are not part of the schema; decoded frames
//! carry none.

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::error::{ArchiveError, ArchiveResult};
use crate::types::{Frame, ImageFrame, LeafFrame, OptionItem, OptionsFrame, TextFrame};

const ROOT: &str = "frame_container";
const TEXT: &str = "text";
const IMAGE: &str = "image";
const OPTIONS: &str = "options";
const OPTION: &str = "option";

// ==================== Encoding ====================

/// Encode frames as a `frame_container` document. Never fails.
pub fn encode_frames(frames: &[Frame]) -> String {
    let mut out = String::with_capacity(64 + frames.len() * 48);
    out.push('<');
    out.push_str(ROOT);
    out.push('>');
    for frame in frames {
        match frame {
            Frame::Text(text) => write_text(&mut out, text),
            Frame::Image(image) => write_image(&mut out, image),
            Frame::Options(options) => write_options(&mut out, options),
        }
    }
    out.push_str("</");
    out.push_str(ROOT);
    out.push('>');
    out
}

fn write_text(out: &mut String, text: &TextFrame) {
    out.push_str("<text>");
    out.push_str(&escape_text(&text.content));
    out.push_str("</text>");
}

fn write_image(out: &mut String, image: &ImageFrame) {
    out.push_str(&format!(
        "<image width=\"{}\" height=\"{}\" src=\"{}\"",
        image.width(),
        image.height(),
        escape_attr(image.filename())
    ));
    if let Some(alt) = image.alt_text() {
        out.push_str(&format!(" alt=\"{}\"", escape_attr(alt)));
    }
    out.push_str("/>");
}

fn write_options(out: &mut String, options: &OptionsFrame) {
    match &options.name {
        Some(name) => out.push_str(&format!("<options name=\"{}\">", escape_attr(name))),
        None => out.push_str("<options>"),
    }
    for item in &options.items {
        if item.is_key {
            out.push_str(&format!("<option key=\"true\" priority=\"{}\">", item.priority));
        } else {
            out.push_str(&format!("<option priority=\"{}\">", item.priority));
        }
        match &item.frame {
            LeafFrame::Text(text) => write_text(out, text),
            LeafFrame::Image(image) => write_image(out, image),
        }
        out.push_str("</option>");
    }
    out.push_str("</options>");
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ==================== Decoding ====================

/// Decode a `frame_container` document.
pub fn decode_frames(xml: &str) -> ArchiveResult<Vec<Frame>> {
    let mut reader = Reader::from_str(xml);
    let mut frames = None;

    loop {
        match next_structural(&mut reader)? {
            Event::Start(start) if frames.is_none() && is(&start, ROOT) => {
                Attrs::parse(ROOT, &start, &[])?.finish()?;
                frames = Some(read_container(&mut reader)?);
                expect_closed(&reader, xml)?;
            }
            Event::Empty(start) if frames.is_none() && is(&start, ROOT) => {
                Attrs::parse(ROOT, &start, &[])?.finish()?;
                frames = Some(Vec::new());
                expect_closed(&reader, xml)?;
            }
            Event::Eof => break,
            other => return Err(unexpected(&other, "document")),
        }
    }

    frames.ok_or_else(|| schema(format!("missing <{}> root element", ROOT)))
}

/// The root tag must end in `>`: the reader hands back an end tag cut off
/// at end of input as if it were complete.
fn expect_closed(reader: &Reader<&[u8]>, xml: &str) -> ArchiveResult<()> {
    let consumed = xml.as_bytes().get(..reader.buffer_position());
    if consumed.and_then(|bytes| bytes.last()) == Some(&b'>') {
        Ok(())
    } else {
        Err(schema(format!("<{}> is not closed", ROOT)))
    }
}

fn read_container(reader: &mut Reader<&[u8]>) -> ArchiveResult<Vec<Frame>> {
    let mut frames = Vec::new();
    loop {
        match next_structural(reader)? {
            Event::Start(start) => frames.push(read_frame(reader, &start, false)?),
            Event::Empty(start) => frames.push(read_frame(reader, &start, true)?),
            Event::End(_) => return Ok(frames),
            other => return Err(unexpected(&other, ROOT)),
        }
    }
}

fn read_frame(reader: &mut Reader<&[u8]>, start: &BytesStart, empty: bool) -> ArchiveResult<Frame> {
    if is(start, OPTIONS) {
        return Ok(Frame::Options(read_options(reader, start, empty)?));
    }
    read_leaf(reader, start, empty, ROOT).map(Frame::from)
}

fn read_leaf(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
    parent: &str,
) -> ArchiveResult<LeafFrame> {
    if is(start, TEXT) {
        Attrs::parse(TEXT, start, &[])?.finish()?;
        let content = if empty {
            String::new()
        } else {
            read_text_content(reader)?
        };
        return Ok(LeafFrame::Text(TextFrame::new(content)));
    }
    if is(start, IMAGE) {
        let image = read_image(start)?;
        if !empty {
            expect_end(reader, IMAGE)?;
        }
        return Ok(LeafFrame::Image(image));
    }
    Err(schema(format!(
        "unexpected <{}> inside <{}>",
        element_name(start),
        parent
    )))
}

fn read_text_content(reader: &mut Reader<&[u8]>) -> ArchiveResult<String> {
    let mut content = String::new();
    loop {
        match reader.read_event().map_err(|e| xml_error(reader, e))? {
            Event::Text(text) => content.push_str(&text.unescape().map_err(|e| xml_error(reader, e))?),
            Event::CData(cdata) => {
                let bytes = cdata.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|_| schema("CDATA is not valid UTF-8".to_string()))?;
                content.push_str(text);
            }
            Event::Comment(_) => {}
            Event::End(_) => return Ok(content),
            other => return Err(unexpected(&other, TEXT)),
        }
    }
}

fn read_image(start: &BytesStart) -> ArchiveResult<ImageFrame> {
    let mut attrs = Attrs::parse(IMAGE, start, &["width", "height", "src", "alt"])?;
    let width = attrs.parsed("width")?;
    let height = attrs.parsed("height")?;
    let src = attrs.required("src")?;
    let alt = attrs.take("alt");
    ImageFrame::new(src, width, height, alt)
}

/// An `<options>` element with no `<option>` children decodes to an empty frame.
fn read_options(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    empty: bool,
) -> ArchiveResult<OptionsFrame> {
    let mut attrs = Attrs::parse(OPTIONS, start, &["name"])?;
    let name = attrs.take("name");
    let mut items = Vec::new();
    if empty {
        return Ok(OptionsFrame::new(name, items));
    }
    loop {
        match next_structural(reader)? {
            Event::Start(option) if is(&option, OPTION) => items.push(read_option(reader, &option)?),
            Event::End(_) => return Ok(OptionsFrame::new(name, items)),
            other => return Err(unexpected(&other, OPTIONS)),
        }
    }
}

fn read_option(reader: &mut Reader<&[u8]>, start: &BytesStart) -> ArchiveResult<OptionItem> {
    let mut attrs = Attrs::parse(OPTION, start, &["key", "priority"])?;
    let is_key = attrs.take("key").is_some();
    let priority = attrs.parsed("priority")?;

    let frame = match next_structural(reader)? {
        Event::Start(child) => read_leaf(reader, &child, false, OPTION)?,
        Event::Empty(child) => read_leaf(reader, &child, true, OPTION)?,
        Event::End(_) => return Err(schema("<option> without a frame".to_string())),
        other => return Err(unexpected(&other, OPTION)),
    };
    match next_structural(reader)? {
        Event::End(_) => Ok(OptionItem::new(frame, is_key, priority)),
        _ => Err(schema("<option> must hold exactly one frame".to_string())),
    }
}

fn expect_end(reader: &mut Reader<&[u8]>, element: &str) -> ArchiveResult<()> {
    match next_structural(reader)? {
        Event::End(_) => Ok(()),
        other => Err(unexpected(&other, element)),
    }
}

/// Next event that carries structure: skips declarations, comments,
/// processing instructions and whitespace-only text; rejects other text.
fn next_structural<'a>(reader: &mut Reader<&'a [u8]>) -> ArchiveResult<Event<'a>> {
    loop {
        let event = reader.read_event().map_err(|e| xml_error(reader, e))?;
        match event {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Text(ref text) if text.iter().all(u8::is_ascii_whitespace) => {}
            Event::Text(_) | Event::CData(_) => {
                return Err(schema(format!(
                    "stray text at byte {}",
                    reader.buffer_position()
                )))
            }
            other => return Ok(other),
        }
    }
}

/// Attributes of one element, checked against an allow-list.
struct Attrs {
    element: &'static str,
    values: Vec<(String, String)>,
}

impl Attrs {
    fn parse(element: &'static str, start: &BytesStart, allowed: &[&str]) -> ArchiveResult<Self> {
        let mut values = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| schema(format!("bad attribute on <{}>: {}", element, e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if !allowed.contains(&key.as_str()) {
                return Err(schema(format!("unknown attribute {} on <{}>", key, element)));
            }
            let value = attr
                .unescape_value()
                .map_err(|e| schema(format!("bad attribute {} on <{}>: {}", key, element, e)))?
                .into_owned();
            values.push((key, value));
        }
        Ok(Self { element, values })
    }

    fn take(&mut self, key: &str) -> Option<String> {
        let pos = self.values.iter().position(|(k, _)| k == key)?;
        Some(self.values.remove(pos).1)
    }

    fn required(&mut self, key: &str) -> ArchiveResult<String> {
        self.take(key).ok_or_else(|| {
            schema(format!("<{}> is missing attribute {}", self.element, key))
        })
    }

    fn parsed<T: FromStr>(&mut self, key: &str) -> ArchiveResult<T> {
        let value = self.required(key)?;
        value.trim().parse().map_err(|_| {
            schema(format!(
                "attribute {}=\"{}\" on <{}> is not a valid number",
                key, value, self.element
            ))
        })
    }

    fn finish(self) -> ArchiveResult<()> {
        match self.values.first() {
            Some((key, _)) => Err(schema(format!(
                "unexpected attribute {} on <{}>",
                key, self.element
            ))),
            None => Ok(()),
        }
    }
}

fn is(start: &BytesStart, name: &str) -> bool {
    start.name().as_ref() == name.as_bytes()
}

fn element_name(start: &BytesStart) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn unexpected(event: &Event, parent: &str) -> ArchiveError {
    let what = match event {
        Event::Start(e) | Event::Empty(e) => format!("<{}>", element_name(e)),
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Eof => "end of document".to_string(),
        _ => "content".to_string(),
    };
    schema(format!("unexpected {} inside {}", what, parent))
}

fn schema(message: String) -> ArchiveError {
    ArchiveError::InvalidArchiveSchema(message)
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> ArchiveError {
    schema(format!("{} at byte {}", err, reader.buffer_position()))
}
