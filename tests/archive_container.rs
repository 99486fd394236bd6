//! Archive container: byte layout, multi-entry streams, failure modes,
//! gzip wrapping, file-backed reading.

use std::io::{self, Read, Write};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::NamedTempFile;

use quiz_archive::format::compression::{gunzip, GZIP_MAGIC};
use quiz_archive::{
    decode_archive, decode_single, encode_archive, ArchiveError, ArchiveReader, ArchiveStream,
    ArchiveWriter, ByteSource, BytesSource, FileSource, Frame, ImageFrame, OptionItem,
    OptionsFrame, QuizArchive, TextFrame,
};

fn time(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
}

fn cat_bytes() -> Vec<u8> {
    // JPEG-ish header followed by every byte value, NULs included
    let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
    bytes.extend((0..=255u8).cycle().take(4096));
    bytes
}

fn sample_quizzes() -> Vec<QuizArchive> {
    let quiz1 = QuizArchive::new("test quiz 1", time(9, 0, 0))
        .with_frame(TextFrame::new("Hi I am text frame by test quiz 1"));

    let quiz2 = QuizArchive::new("test quiz 2", time(9, 30, 0))
        .modified_at(time(10, 45, 12))
        .with_frame(TextFrame::new("Hi I am text frame by test quiz 2"))
        .with_frame(
            ImageFrame::new(
                "cat_walker.jpg",
                400,
                295,
                Some("The DJ Cat Walker popular among the Chinese".into()),
            )
            .unwrap(),
        )
        .with_frame(OptionsFrame::new(
            Some("nice options".into()),
            vec![
                OptionItem::new(TextFrame::new("Option 1"), false, 0),
                OptionItem::new(TextFrame::new("Option 2"), true, 1),
            ],
        ))
        .with_resource("cat_walker.jpg", BytesSource::new(cat_bytes()));

    vec![quiz1, quiz2]
}

fn expect_truncated(data: Vec<u8>) {
    match decode_archive(&BytesSource::new(data)).unwrap_err() {
        ArchiveError::TruncatedArchive(_) => {}
        e => panic!("Expected TruncatedArchive, got {:?}", e),
    }
}

// ==================== End to End ====================

#[test]
fn test_two_quizzes_round_trip() {
    let quizzes = sample_quizzes();
    let encoded = encode_archive(&quizzes).unwrap();
    let decoded = decode_archive(&encoded).unwrap();

    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded, quizzes);

    let second = &decoded[1];
    assert_eq!(second.name, "test quiz 2");
    assert_eq!(second.modification_time, Some(time(10, 45, 12)));
    assert_eq!(second.frames.len(), 3);
    assert_eq!(
        second.resources.get("cat_walker.jpg").unwrap().read_all().unwrap(),
        cat_bytes()
    );
    assert!(second.missing_resources().is_empty());
    assert_eq!(decoded[0].modification_time, None);
}

#[test]
fn test_decode_is_deterministic() {
    let encoded = encode_archive(&sample_quizzes()).unwrap();
    let first = decode_archive(&encoded).unwrap();
    let second = decode_archive(&encoded).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        encode_archive(&first).unwrap().as_bytes(),
        encoded.as_bytes()
    );
}

// ==================== Byte Layout ====================

#[test]
fn test_single_entry_layout() {
    let quiz = QuizArchive::new("q", Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        .with_frame(TextFrame::new("hi"));
    let encoded = encode_archive(&[quiz]).unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(b"q\0");
    expected.extend_from_slice(b"2024-01-02T03:04:05Z\0");
    expected.extend_from_slice(b"\0");
    expected.extend_from_slice(&[0, 0, 0, 0]);
    expected.extend_from_slice(b"<frame_container><text>hi</text></frame_container>");
    assert_eq!(encoded.as_bytes(), expected.as_slice());
}

#[test]
fn test_resource_layout_and_separator() {
    let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let first = QuizArchive::new("a", created)
        .modified_at(created)
        .with_resource("r", BytesSource::new(vec![0, 1, 0]));
    let second = QuizArchive::new("b", created);
    let encoded = encode_archive(&[first, second]).unwrap();
    let bytes = encoded.as_bytes();

    let mut expected = Vec::new();
    expected.extend_from_slice(b"a\0");
    expected.extend_from_slice(b"2024-01-02T03:04:05Z\0");
    expected.extend_from_slice(b"2024-01-02T03:04:05Z\0");
    expected.extend_from_slice(&1i32.to_be_bytes());
    expected.extend_from_slice(b"r\0");
    expected.extend_from_slice(&3i32.to_be_bytes());
    expected.extend_from_slice(&[0, 1, 0]);
    expected.extend_from_slice(b"<frame_container></frame_container>");
    expected.push(0);
    expected.extend_from_slice(b"b\0");
    expected.extend_from_slice(b"2024-01-02T03:04:05Z\0");
    expected.extend_from_slice(b"\0");
    expected.extend_from_slice(&0i32.to_be_bytes());
    expected.extend_from_slice(b"<frame_container></frame_container>");
    assert_eq!(bytes, expected.as_slice());

    // no trailing delimiter after the last entry
    assert_eq!(bytes.last(), Some(&b'>'));
}

#[test]
fn test_empty_input_has_no_entries() {
    assert!(decode_archive(&BytesSource::new(Vec::new())).unwrap().is_empty());
    assert!(encode_archive(&[]).unwrap().as_bytes().is_empty());
}

#[test]
fn test_subsecond_timestamps_survive() {
    let precise = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let quiz = QuizArchive::new("precise", precise).modified_at(precise);
    let decoded = decode_single(&encode_archive(&[quiz.clone()]).unwrap()).unwrap();
    assert_eq!(decoded, quiz);
}

#[test]
fn test_offset_timestamps_accepted() {
    let mut data = Vec::new();
    data.extend_from_slice(b"q\0");
    data.extend_from_slice(b"2024-01-02T05:04:05+02:00\0");
    data.extend_from_slice(b"\0");
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"<frame_container/>");

    let quiz = decode_single(&BytesSource::new(data)).unwrap();
    assert_eq!(quiz.creation_time, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
}

// ==================== Single Entry ====================

#[test]
fn test_decode_single() {
    let quizzes = sample_quizzes();

    let one = encode_archive(&quizzes[..1]).unwrap();
    assert_eq!(decode_single(&one).unwrap(), quizzes[0]);

    match decode_single(&encode_archive(&quizzes).unwrap()).unwrap_err() {
        ArchiveError::CompoundArchive(2) => {}
        e => panic!("Expected CompoundArchive(2), got {:?}", e),
    }

    match decode_single(&BytesSource::new(Vec::new())).unwrap_err() {
        ArchiveError::EmptyArchive => {}
        e => panic!("Expected EmptyArchive, got {:?}", e),
    }
}

#[test]
fn test_streamed_entries_match_batch() {
    let quizzes = sample_quizzes();
    let mut stream = ArchiveStream::new(Vec::new());
    assert!(stream.is_empty());
    for quiz in &quizzes {
        stream.push(quiz).unwrap();
    }
    assert_eq!(stream.len(), 2);
    let bytes = stream.finish().unwrap();

    assert_eq!(bytes, encode_archive(&quizzes).unwrap().as_bytes());
}

// ==================== Failure Modes ====================

#[test]
fn test_missing_delimiters_truncated() {
    expect_truncated(b"no delimiter at all".to_vec());
    expect_truncated(b"name\0".to_vec());
    expect_truncated(b"name\x002024-01-02T03:04:05Z\0".to_vec());
}

#[test]
fn test_short_count_truncated() {
    let mut data = b"q\x002024-01-02T03:04:05Z\0\0".to_vec();
    data.extend_from_slice(&[0, 0]);
    expect_truncated(data);
}

#[test]
fn test_short_resource_truncated() {
    let mut data = b"q\x002024-01-02T03:04:05Z\0\0".to_vec();
    data.extend_from_slice(&1i32.to_be_bytes());
    data.extend_from_slice(b"r\0");
    data.extend_from_slice(&10i32.to_be_bytes());
    data.extend_from_slice(b"abc");
    expect_truncated(data);
}

#[test]
fn test_cut_archive_never_decodes_silently() {
    let full = encode_archive(&sample_quizzes()).unwrap().as_bytes().to_vec();
    for cut in [1, 5, 12, full.len() / 2, full.len() - 1] {
        let result = decode_archive(&BytesSource::new(full[..cut].to_vec()));
        assert!(result.is_err(), "cut at {} decoded", cut);
    }
}

#[test]
fn test_last_byte_missing_is_schema_error() {
    let full = encode_archive(&sample_quizzes()).unwrap().as_bytes().to_vec();
    let cut = full[..full.len() - 1].to_vec();
    match decode_archive(&BytesSource::new(cut)).unwrap_err() {
        ArchiveError::InvalidArchiveSchema(_) => {}
        e => panic!("Expected InvalidArchiveSchema, got {:?}", e),
    }
}

#[test]
fn test_negative_count_corrupt() {
    let mut data = b"q\x002024-01-02T03:04:05Z\0\0".to_vec();
    data.extend_from_slice(&(-1i32).to_be_bytes());
    match decode_archive(&BytesSource::new(data)).unwrap_err() {
        ArchiveError::Corrupt { value: -1, .. } => {}
        e => panic!("Expected Corrupt, got {:?}", e),
    }
}

#[test]
fn test_bad_timestamp() {
    let mut data = b"q\0yesterday\0\0".to_vec();
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"<frame_container/>");
    match decode_archive(&BytesSource::new(data)).unwrap_err() {
        ArchiveError::InvalidTimestamp { value, .. } => assert_eq!(value, "yesterday"),
        e => panic!("Expected InvalidTimestamp, got {:?}", e),
    }
}

#[test]
fn test_bad_name_encoding() {
    let mut data = vec![0xc3, 0x28, 0];
    data.extend_from_slice(b"2024-01-02T03:04:05Z\0\0");
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"<frame_container/>");
    match decode_archive(&BytesSource::new(data)).unwrap_err() {
        ArchiveError::InvalidUtf8(_) => {}
        e => panic!("Expected InvalidUtf8, got {:?}", e),
    }
}

#[test]
fn test_payload_schema_violation() {
    let mut data = b"q\x002024-01-02T03:04:05Z\0\0".to_vec();
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(
        br#"<frame_container><options><option priority="0"><options/></option></options></frame_container>"#,
    );
    match decode_archive(&BytesSource::new(data)).unwrap_err() {
        ArchiveError::InvalidArchiveSchema(_) => {}
        e => panic!("Expected InvalidArchiveSchema, got {:?}", e),
    }
}

#[derive(Debug)]
struct ShortSource;

impl ByteSource for ShortSource {
    fn len(&self) -> io::Result<u64> {
        Ok(10)
    }

    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(io::Cursor::new(vec![1u8, 2, 3])))
    }
}

#[test]
fn test_resource_shorter_than_announced() {
    let quiz = QuizArchive::new("q", time(1, 0, 0)).with_resource("short", ShortSource);
    match encode_archive(&[quiz]).unwrap_err() {
        ArchiveError::ResourceLengthMismatch {
            name,
            expected: 10,
            actual: 3,
        } => assert_eq!(name, "short"),
        e => panic!("Expected ResourceLengthMismatch, got {:?}", e),
    }
}

// ==================== Gzip ====================

#[test]
fn test_gzip_round_trip() {
    let quizzes = sample_quizzes();
    let mut wrapped = Vec::new();
    ArchiveWriter::new()
        .gzip(true)
        .write_to(&quizzes, &mut wrapped)
        .unwrap();
    assert!(wrapped.starts_with(&GZIP_MAGIC));

    let plain = encode_archive(&quizzes).unwrap();
    assert_eq!(gunzip(&wrapped).unwrap(), plain.as_bytes());

    let decoded = ArchiveReader::read_from(&mut wrapped.as_slice()).unwrap();
    assert_eq!(decoded, quizzes);
}

// ==================== Files ====================

#[test]
fn test_file_round_trip() {
    let quizzes = sample_quizzes();
    let file = NamedTempFile::new().unwrap();
    ArchiveWriter::new().write_to_file(&quizzes, file.path()).unwrap();

    let decoded = ArchiveReader::read_from_file(file.path()).unwrap();
    assert_eq!(decoded, quizzes);

    let source = FileSource::new(file.path());
    assert_eq!(decode_archive(&source).unwrap(), quizzes);
}

#[test]
fn test_gzip_file_round_trip() {
    let quizzes = sample_quizzes();
    let file = NamedTempFile::new().unwrap();
    ArchiveWriter::new()
        .gzip(true)
        .write_to_file(&quizzes, file.path())
        .unwrap();
    assert_eq!(ArchiveReader::read_from_file(file.path()).unwrap(), quizzes);
}

#[test]
fn test_empty_file_has_no_entries() {
    let file = NamedTempFile::new().unwrap();
    assert!(ArchiveReader::read_from_file(file.path()).unwrap().is_empty());
}

#[test]
fn test_file_resources_stream_from_disk() {
    let mut resource = NamedTempFile::new().unwrap();
    resource.write_all(&cat_bytes()).unwrap();
    resource.flush().unwrap();

    let quiz = QuizArchive::new("from disk", time(8, 0, 0))
        .with_frame(ImageFrame::new("cat_walker.jpg", 400, 295, None).unwrap())
        .with_resource("cat_walker.jpg", FileSource::new(resource.path()));
    let archive = NamedTempFile::new().unwrap();
    ArchiveWriter::new().write_to_file(&[quiz.clone()], archive.path()).unwrap();

    let mut decoded = ArchiveReader::read_from_file(archive.path()).unwrap();
    assert_eq!(decoded, vec![quiz]);

    // a decoded resource keeps the mapping alive after its entry is gone
    let shared: Arc<dyn ByteSource> = decoded[0].resources.remove("cat_walker.jpg").unwrap();
    drop(decoded);
    assert_eq!(shared.len().unwrap(), cat_bytes().len() as u64);
    assert_eq!(shared.read_all().unwrap(), cat_bytes());
}

#[test]
fn test_frames_preserved_in_order() {
    let quizzes = sample_quizzes();
    let decoded = decode_archive(&encode_archive(&quizzes).unwrap()).unwrap();
    let kinds: Vec<&str> = decoded[1].frames.iter().map(Frame::kind).collect();
    assert_eq!(kinds, vec!["text", "image", "options"]);
}
