use pretty_assertions::assert_eq;
use rfq_core::ingest::{DocumentKind, LoadedDocument, RecursiveSplitter};

#[test]
fn short_text_is_a_single_trimmed_chunk() {
    let splitter = RecursiveSplitter::new(1000, 200).expect("splitter");
    assert_eq!(
        splitter.split_text("  Closing date is 1 May.\n"),
        vec!["Closing date is 1 May.".to_string()]
    );
}

#[test]
fn paragraphs_are_merged_up_to_chunk_size() {
    let splitter = RecursiveSplitter::new(20, 0).expect("splitter");
    let chunks = splitter.split_text("aaaa bbbb\n\ncccc dddd\n\neeee");
    assert_eq!(
        chunks,
        vec!["aaaa bbbb\n\ncccc dddd".to_string(), "eeee".to_string()]
    );
}

#[test]
fn consecutive_chunks_overlap_on_word_boundaries() {
    let text = (0..30)
        .map(|i| format!("word{i:02}"))
        .collect::<Vec<_>>()
        .join(" ");
    let splitter = RecursiveSplitter::new(50, 20).expect("splitter");
    let chunks = splitter.split_text(&text);

    assert!(chunks.len() > 1);
    for c in chunks.iter() {
        assert!(c.chars().count() <= 50, "chunk too long: {c}");
    }
    assert_eq!(chunks[0], "word00 word01 word02 word03 word04 word05 word06");
    assert!(chunks[1].starts_with("word05 word06 word07"));
    assert!(chunks.last().expect("last").ends_with("word29"));
}

#[test]
fn unbroken_text_falls_back_to_characters() {
    let splitter = RecursiveSplitter::new(10, 0).expect("splitter");
    let chunks = splitter.split_text(&"x".repeat(25));
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![10, 10, 5]
    );

    let accents = RecursiveSplitter::new(4, 0).expect("splitter");
    assert_eq!(
        accents.split_text("éééééé"),
        vec!["éééé".to_string(), "éé".to_string()]
    );
}

#[test]
fn document_chunks_are_numbered_in_order() {
    let splitter = RecursiveSplitter::new(20, 0).expect("splitter");
    let doc = LoadedDocument {
        name: "DocA.pdf".to_string(),
        kind: DocumentKind::Text,
        text: "aaaa bbbb\n\ncccc dddd\n\neeee".to_string(),
    };
    let drafts = splitter.split_document(&doc);
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].ordinal, 0);
    assert_eq!(drafts[1].ordinal, 1);
    assert_eq!(drafts[1].text, "eeee");
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let err = RecursiveSplitter::new(100, 100).expect_err("invalid");
    assert_eq!(err.code, "INGEST_SPLITTER_INVALID");
    assert!(RecursiveSplitter::new(0, 0).is_err());
}
