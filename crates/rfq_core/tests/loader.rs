use std::io::Write;

use pretty_assertions::assert_eq;
use rfq_core::ingest::{load_bytes, load_document, DocumentKind};

fn docx_bytes(document_xml: &str) -> Vec<u8> {
    let mut zw = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zw.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .expect("start_file");
    zw.write_all(document_xml.as_bytes()).expect("write");
    zw.finish().expect("finish").into_inner()
}

#[test]
fn loads_plain_text_from_disk_and_normalizes_line_endings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "Scope of work\r\n\r\nSupport 50 users\r\n").expect("write");

    let doc = load_document(&path).expect("load");
    assert_eq!(doc.name, "notes.txt");
    assert_eq!(doc.kind, DocumentKind::Text);
    assert_eq!(doc.text, "Scope of work\n\nSupport 50 users\n");
}

#[test]
fn loads_docx_paragraphs() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>RFB 3059-2024</w:t></w:r></w:p><w:p><w:r><w:t>Bid Specification</w:t></w:r></w:p></w:body></w:document>"#;
    let doc = load_bytes("RFB 3059-2024 Bid Specification.docx", &docx_bytes(xml)).expect("load");
    assert_eq!(doc.kind, DocumentKind::Docx);
    assert_eq!(doc.text, "RFB 3059-2024\n\nBid Specification");
}

#[test]
fn docx_without_body_is_rejected() {
    let mut zw = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zw.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
        .expect("start_file");
    zw.write_all(b"<w:styles/>").expect("write");
    let bytes = zw.finish().expect("finish").into_inner();

    let err = load_bytes("broken.docx", &bytes).expect_err("missing body");
    assert_eq!(err.code, "INGEST_PARSE_FAILED");
    assert!(err.details.unwrap_or_default().contains("file=broken.docx"));
}

#[test]
fn unsupported_and_empty_documents_fail() {
    let err = load_bytes("budget.xlsx", b"anything").expect_err("unsupported");
    assert_eq!(err.code, "INGEST_UNSUPPORTED_TYPE");

    let err = load_bytes("blank.txt", b"  \n\n ").expect_err("empty");
    assert_eq!(err.code, "INGEST_EMPTY_DOCUMENT");

    let err = load_bytes("garbage.pdf", b"not a pdf").expect_err("bad pdf");
    assert_eq!(err.code, "INGEST_PARSE_FAILED");
}
