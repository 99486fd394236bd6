//! CLI command implementations.
//!
//! `pack` and `extract` share one on-disk layout per quiz entry:
//!
//! ```text
//! <entry>/frames.xml      frame_container payload
//! <entry>/meta.json       name and timestamps (optional for pack)
//! <entry>/resources/*     one file per resource
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{optimize, EditOperation};
use crate::format::{decode_frames, encode_frames, ArchiveReader, ArchiveWriter};
use crate::types::{
    format_timestamp, now, parse_timestamp, ArchiveError, ArchiveResult, FileSource,
    QuizArchive, UNNAMED_QUIZ,
};

pub const FRAMES_FILE: &str = "frames.xml";
pub const META_FILE: &str = "meta.json";
pub const RESOURCES_DIR: &str = "resources";

/// Contents of `meta.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EntryMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub modification_time: Option<String>,
}

/// Display information about an archive.
pub fn cmd_info(path: &Path, json: bool) -> ArchiveResult<()> {
    let entries = ArchiveReader::read_from_file(path)?;
    let file_size = fs::metadata(path)?.len();

    if json {
        let mut list = Vec::with_capacity(entries.len());
        for entry in &entries {
            let mut resources = Vec::with_capacity(entry.resources.len());
            for (name, source) in entry.resources.iter() {
                resources.push(serde_json::json!({"name": name, "size": source.len()?}));
            }
            list.push(serde_json::json!({
                "name": entry.name,
                "creation_time": format_timestamp(&entry.creation_time),
                "modification_time": entry.modification_time.as_ref().map(format_timestamp),
                "frames": entry.frames.iter().map(|f| serde_json::json!({
                    "type": f.kind(),
                    "preview": f.preview(),
                })).collect::<Vec<_>>(),
                "resources": resources,
                "missing_resources": entry.missing_resources(),
            }));
        }
        let info = serde_json::json!({
            "file": path.display().to_string(),
            "file_size": file_size,
            "entries": list,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).unwrap_or_default()
        );
    } else {
        println!("File: {}", path.display());
        println!("File size: {}", format_size(file_size));
        println!("Entries: {}", entries.len());
        for (i, entry) in entries.iter().enumerate() {
            println!("[{}] {}", i, entry.name);
            println!("  Created: {}", format_timestamp(&entry.creation_time));
            if let Some(modified) = &entry.modification_time {
                println!("  Modified: {}", format_timestamp(modified));
            }
            println!("  Frames: {}", entry.frames.len());
            for frame in &entry.frames {
                println!("    {:<8} {:?}", frame.kind(), first_line(&frame.preview()));
            }
            println!("  Resources: {}", entry.resources.len());
            for (name, source) in entry.resources.iter() {
                println!("    {} ({})", name, format_size(source.len()?));
            }
            for name in entry.missing_resources() {
                println!("    missing: {}", name);
            }
        }
    }
    Ok(())
}

/// Pack entry directories into one archive.
pub fn cmd_pack(out: &Path, entry_dirs: &[PathBuf], gzip: bool, json: bool) -> ArchiveResult<()> {
    let entries = entry_dirs
        .iter()
        .map(|dir| load_entry(dir))
        .collect::<ArchiveResult<Vec<_>>>()?;
    ArchiveWriter::new().gzip(gzip).write_to_file(&entries, out)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "file": out.display().to_string(),
                "entries": entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
                "gzip": gzip,
            })
        );
    } else {
        println!(
            "Packed {} entries into {}{}",
            entries.len(),
            out.display(),
            if gzip { " (gzip)" } else { "" }
        );
    }
    Ok(())
}

/// Unpack every entry of an archive into `dest/<index>-<name>/`.
pub fn cmd_extract(path: &Path, dest: &Path, overwrite: bool) -> ArchiveResult<()> {
    let entries = ArchiveReader::read_from_file(path)?;
    fs::create_dir_all(dest)?;

    for (i, entry) in entries.iter().enumerate() {
        let dir = dest.join(entry_dir_name(i, &entry.name));
        if dir.exists() && !overwrite {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", dir.display()),
            )
            .into());
        }
        save_entry(entry, &dir)?;
        println!("Extracted {:?} to {}", entry.name, dir.display());
    }
    Ok(())
}

/// Compact a JSON edit log and print the result.
pub fn cmd_optimize(path: &Path, pretty: bool) -> ArchiveResult<()> {
    let data = fs::read_to_string(path)?;
    let edits: Vec<EditOperation> = serde_json::from_str(&data).map_err(|e| invalid(path, e))?;
    let compacted = optimize(edits);
    let output = if pretty {
        serde_json::to_string_pretty(&compacted)
    } else {
        serde_json::to_string(&compacted)
    };
    println!("{}", output.map_err(|e| invalid(path, e))?);
    Ok(())
}

/// Read one entry directory. Resources are opened lazily when the archive is written.
pub fn load_entry(dir: &Path) -> ArchiveResult<QuizArchive> {
    let frames_path = dir.join(FRAMES_FILE);
    let frames = decode_frames(&fs::read_to_string(&frames_path)?)?;

    let meta_path = dir.join(META_FILE);
    let meta: EntryMeta = match fs::read_to_string(&meta_path) {
        Ok(data) => serde_json::from_str(&data).map_err(|e| invalid(&meta_path, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => EntryMeta::default(),
        Err(e) => return Err(e.into()),
    };

    let name = meta.name.unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let creation_time = match meta.creation_time.as_deref() {
        Some(value) => parse_timestamp(value)?,
        None => now(),
    };
    let modification_time = meta
        .modification_time
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let mut entry = QuizArchive::new(name, creation_time);
    entry.modification_time = modification_time;
    entry.frames = frames;

    let resources_dir = dir.join(RESOURCES_DIR);
    if resources_dir.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(&resources_dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<io::Result<_>>()?;
        files.retain(|p| p.is_file());
        files.sort();
        for file in files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entry.resources.insert(name, FileSource::new(file));
        }
    }

    log::debug!(
        "Loaded entry {:?} from {}: {} frames, {} resources",
        entry.name,
        dir.display(),
        entry.frames.len(),
        entry.resources.len()
    );
    Ok(entry)
}

/// Write one entry in the directory layout `load_entry` reads.
pub fn save_entry(entry: &QuizArchive, dir: &Path) -> ArchiveResult<()> {
    let resources_dir = dir.join(RESOURCES_DIR);
    fs::create_dir_all(&resources_dir)?;
    fs::write(dir.join(FRAMES_FILE), encode_frames(&entry.frames))?;

    let meta = EntryMeta {
        name: Some(entry.name.clone()),
        creation_time: Some(format_timestamp(&entry.creation_time)),
        modification_time: entry.modification_time.as_ref().map(format_timestamp),
    };
    let meta_path = dir.join(META_FILE);
    let meta_json = serde_json::to_string_pretty(&meta).map_err(|e| invalid(&meta_path, e))?;
    fs::write(&meta_path, meta_json)?;

    for (name, source) in entry.resources.iter() {
        let target = resources_dir.join(safe_file_name(name)?);
        let mut out = fs::File::create(&target)?;
        io::copy(&mut source.open()?, &mut out)?;
    }
    Ok(())
}

/// Resource names come from untrusted archives; only plain file names are written.
fn safe_file_name(name: &str) -> ArchiveResult<&str> {
    let plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if plain && name != "." && name != ".." {
        Ok(name)
    } else {
        Err(ArchiveError::InvalidInput {
            path: name.to_string(),
            reason: "resource name is not a plain file name".to_string(),
        })
    }
}

fn entry_dir_name(index: usize, name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        format!("{:03}-{}", index, UNNAMED_QUIZ)
    } else {
        format!("{:03}-{}", index, cleaned)
    }
}

fn invalid(path: &Path, err: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::InvalidInput {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
