use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Result<Self, AppError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "md" | "markdown" => Ok(Self::Text),
            _ => Err(AppError::new(
                "INGEST_UNSUPPORTED_TYPE",
                "Only PDF, DOCX and plain text documents are supported",
            )
            .with_details(format!("file={name}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadedDocument {
    /// File name without directories; this is the name users pick as focus.
    pub name: String,
    pub kind: DocumentKind,
    pub text: String,
}

pub fn load_document(path: &Path) -> Result<LoadedDocument, AppError> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            AppError::new("INGEST_READ_FAILED", "Document path has no file name")
                .with_details(format!("path={}", path.display()))
        })?
        .to_string();
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("INGEST_READ_FAILED", "Failed to read document")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    load_bytes(&name, &bytes)
}

/// Parse an in-memory document (the upload path never touches disk).
pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<LoadedDocument, AppError> {
    let kind = DocumentKind::from_file_name(name)?;
    let raw = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AppError::new("INGEST_PARSE_FAILED", "Failed to extract text from PDF")
                .with_details(format!("file={name}; err={e}"))
        })?,
        DocumentKind::Docx => extract_docx_text(bytes).map_err(|e| {
            let inner = e.details.clone().unwrap_or_default();
            e.with_details(format!("file={name}; err={inner}"))
        })?,
        DocumentKind::Text => String::from_utf8(bytes.to_vec()).map_err(|e| {
            AppError::new("INGEST_PARSE_FAILED", "Text document is not valid UTF-8")
                .with_details(format!("file={name}; err={e}"))
        })?,
    };

    let text = normalize_text(&raw);
    if text.trim().is_empty() {
        return Err(AppError::new(
            "INGEST_EMPTY_DOCUMENT",
            "No text could be extracted from the document",
        )
        .with_details(format!("file={name}")));
    }
    debug!(file = name, chars = text.chars().count(), "loaded document");

    Ok(LoadedDocument {
        name: name.to_string(),
        kind,
        text,
    })
}

fn extract_docx_text(bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        AppError::new("INGEST_PARSE_FAILED", "DOCX is not a valid zip archive")
            .with_details(e.to_string())
    })?;
    let mut entry = archive.by_name("word/document.xml").map_err(|e| {
        AppError::new("INGEST_PARSE_FAILED", "DOCX is missing word/document.xml")
            .with_details(e.to_string())
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| {
        AppError::new("INGEST_PARSE_FAILED", "Failed to read DOCX body")
            .with_details(e.to_string())
    })?;
    Ok(docx_xml_to_text(&xml))
}

/// Text runs of a WordprocessingML body. Paragraphs end with a blank line so
/// the splitter's paragraph separator applies.
pub(crate) fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;
    let mut in_text = false;

    while let Some(lt) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..lt]));
        }
        let after = &rest[lt..];
        let Some(gt) = after.find('>') else {
            break;
        };
        let tag = &after[1..gt];
        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match name {
            "w:t" => in_text = !closing && !self_closing,
            "w:tab" if !closing => out.push('\t'),
            "w:br" | "w:cr" if !closing => out.push('\n'),
            "w:p" if closing || self_closing => out.push_str("\n\n"),
            _ => {}
        }
        rest = &after[gt + 1..];
    }

    out.trim_end().to_string()
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

pub(crate) fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docx_runs_join_and_paragraphs_split() {
        let xml = r#"<w:document><w:body>
<w:p><w:r><w:t>Closing date:</w:t></w:r><w:r><w:t xml:space="preserve"> 1 May</w:t></w:r></w:p>
<w:p><w:r><w:t>B-BBEE &amp; tax</w:t><w:tab/><w:t>clearance</w:t></w:r></w:p>
</w:body></w:document>"#;
        assert_eq!(
            docx_xml_to_text(xml),
            "Closing date: 1 May\n\nB-BBEE & tax\tclearance"
        );
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(decode_entities("R&#49;00 &#x2013; net"), "R100 \u{2013} net");
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
    }
}
