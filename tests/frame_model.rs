//! Frame model: construction rules, equality, previews.

use chrono::{TimeZone, Utc};

use quiz_archive::types::{same_frame, ArchiveError};
use quiz_archive::{
    BytesSource, Frame, FrameId, ImageFrame, LeafFrame, OptionItem, OptionsFrame,
    PrioritizedFrame, QuizArchive, TextFrame, IMAGE_PLACEHOLDER,
};

fn image(name: &str) -> ImageFrame {
    ImageFrame::new(name, 400, 295, None).unwrap()
}

// ==================== Construction ====================

#[test]
fn test_options_inside_options_rejected() {
    let inner = Frame::Options(OptionsFrame::new(Some("inner".into()), Vec::new()));
    let result = OptionItem::try_new(inner, false, 0);
    match result.unwrap_err() {
        ArchiveError::NestedOptions => {}
        e => panic!("Expected NestedOptions, got {:?}", e),
    }
}

#[test]
fn test_leaf_conversion() {
    let text = Frame::Text(TextFrame::new("leaf"));
    let leaf = LeafFrame::try_from(text).unwrap();
    assert_eq!(leaf, LeafFrame::Text(TextFrame::new("leaf")));

    let options = Frame::Options(OptionsFrame::new(None, Vec::new()));
    assert!(matches!(
        LeafFrame::try_from(options),
        Err(ArchiveError::NestedOptions)
    ));
}

#[test]
fn test_image_dimensions_must_be_positive() {
    for (w, h) in [(0, 10), (10, 0), (0, 0)] {
        match ImageFrame::new("a.png", w, h, None).unwrap_err() {
            ArchiveError::InvalidDimensions { width, height } => {
                assert_eq!((width, height), (w, h));
            }
            e => panic!("Expected InvalidDimensions, got {:?}", e),
        }
    }
    assert!(ImageFrame::new("a.png", 1, 1, None).is_ok());
}

#[test]
fn test_image_json_applies_dimension_check() {
    let ok = r#"{"type":"image","filename":"a.png","width":3,"height":4}"#;
    let frame: Frame = serde_json::from_str(ok).unwrap();
    assert_eq!(frame, Frame::Image(ImageFrame::new("a.png", 3, 4, None).unwrap()));

    let bad = r#"{"type":"image","filename":"a.png","width":0,"height":4}"#;
    assert!(serde_json::from_str::<Frame>(bad).is_err());
}

// ==================== Identity & Equality ====================

#[test]
fn test_equality_ignores_ids() {
    let a = Frame::Text(TextFrame::new("same").with_id(FrameId::Stored(1)));
    let b = Frame::Text(TextFrame::new("same").with_id(FrameId::Draft(9)));
    let c = Frame::Text(TextFrame::new("same"));
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, Frame::Text(TextFrame::new("other")));
}

#[test]
fn test_option_item_equality_covers_key_and_priority() {
    let base = OptionItem::new(TextFrame::new("a"), true, 0);
    assert_eq!(base, OptionItem::new(TextFrame::new("a"), true, 0));
    assert_ne!(base, OptionItem::new(TextFrame::new("a"), false, 0));
    assert_ne!(base, OptionItem::new(TextFrame::new("a"), true, 1));
}

#[test]
fn test_same_frame_requires_assigned_ids() {
    assert!(same_frame(Some(FrameId::Stored(3)), Some(FrameId::Stored(3))));
    assert!(same_frame(Some(FrameId::Draft(3)), Some(FrameId::Draft(3))));
    assert!(!same_frame(Some(FrameId::Draft(3)), Some(FrameId::Stored(3))));
    assert!(!same_frame(None, None));
    assert!(!same_frame(Some(FrameId::Stored(3)), None));
}

#[test]
fn test_frame_id_stored_value() {
    assert_eq!(FrameId::Stored(7).stored(), Some(7));
    assert_eq!(FrameId::Draft(7).stored(), None);
    assert_eq!(FrameId::Stored(7).to_string(), "#7");
    assert_eq!(FrameId::Draft(7).to_string(), "draft#7");
}

// ==================== Previews ====================

#[test]
fn test_previews() {
    assert_eq!(Frame::Text(TextFrame::new("hello")).preview(), "hello");

    let with_alt = ImageFrame::new("cat.jpg", 1, 1, Some("a cat".into())).unwrap();
    assert_eq!(Frame::Image(with_alt).preview(), "a cat");
    assert_eq!(Frame::Image(image("cat.jpg")).preview(), IMAGE_PLACEHOLDER);

    let named = OptionsFrame::new(
        Some("pick one".into()),
        vec![OptionItem::new(TextFrame::new("a"), true, 0)],
    );
    assert_eq!(Frame::Options(named).preview(), "pick one");

    let unnamed = OptionsFrame::new(
        None,
        vec![
            OptionItem::new(TextFrame::new("second"), false, 2),
            OptionItem::new(image("x.png"), true, 1),
        ],
    );
    assert_eq!(
        Frame::Options(unnamed).preview(),
        format!("1. {}\n2. second", IMAGE_PLACEHOLDER)
    );
}

#[test]
fn test_options_keys_and_sorting() {
    let options = OptionsFrame::new(
        None,
        vec![
            OptionItem::new(TextFrame::new("c"), true, 3),
            OptionItem::new(TextFrame::new("a"), false, 1),
            OptionItem::new(TextFrame::new("b"), true, 2),
        ],
    );
    let sorted: Vec<String> = options
        .sorted_items()
        .iter()
        .map(|i| i.frame.preview())
        .collect();
    assert_eq!(sorted, vec!["a", "b", "c"]);
    assert_eq!(options.keys().count(), 2);
}

#[test]
fn test_prioritized_frames_interleave() {
    let frames = vec![
        PrioritizedFrame::new(TextFrame::new("third"), 2),
        PrioritizedFrame::new(OptionsFrame::new(Some("first".into()), Vec::new()), 0),
        PrioritizedFrame::new(image("second.png"), 1),
    ];
    let ordered = PrioritizedFrame::into_ordered(frames);
    let kinds: Vec<&str> = ordered.iter().map(|f| f.kind()).collect();
    assert_eq!(kinds, vec!["options", "image", "text"]);
}

// ==================== Quiz Archive ====================

#[test]
fn test_missing_resources() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let quiz = QuizArchive::new("quiz", created)
        .with_frame(image("present.png"))
        .with_frame(OptionsFrame::new(
            None,
            vec![
                OptionItem::new(image("absent.png"), false, 0),
                OptionItem::new(image("present.png"), true, 1),
            ],
        ))
        .with_resource("present.png", BytesSource::new(vec![1, 2, 3]));
    assert_eq!(quiz.missing_resources(), vec!["absent.png"]);
}

#[test]
fn test_archive_equality_reads_resources() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let a = QuizArchive::new("q", created).with_resource("r", BytesSource::new(vec![1, 2, 3]));
    let b = QuizArchive::new("q", created).with_resource("r", BytesSource::new(vec![1, 2, 3]));
    let c = QuizArchive::new("q", created).with_resource("r", BytesSource::new(vec![1, 2, 4]));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_resource_insert_replaces_in_place() {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut quiz = QuizArchive::new("q", created)
        .with_resource("a", BytesSource::new(vec![1]))
        .with_resource("b", BytesSource::new(vec![2]));
    quiz.resources.insert("a", BytesSource::new(vec![9]));

    let names: Vec<&str> = quiz.resources.names().collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(quiz.resources.get("a").unwrap().read_all().unwrap(), vec![9]);
    assert!(quiz.resources.remove("b").is_some());
    assert_eq!(quiz.resources.len(), 1);
}
