use serde::{Deserialize, Serialize};

/// Focus value meaning "search the whole corpus".
pub const ALL_DOCUMENTS: &str = "All Indexed Documents";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum Scope {
    All,
    Document(String),
}

impl Scope {
    /// Map a focus selection to a scope. Empty selections and the sentinel
    /// both mean the whole corpus; any other name is kept verbatim.
    pub fn from_focus(focus: Option<&str>) -> Self {
        match focus {
            None | Some("") | Some(ALL_DOCUMENTS) => Self::All,
            Some(name) => Self::Document(name.to_string()),
        }
    }
}

/// Choices offered to the user: the sentinel, every indexed document, then
/// the uploaded file when there is one.
pub fn focus_options(indexed_documents: &[String], uploaded: Option<&str>) -> Vec<String> {
    let mut out = Vec::with_capacity(indexed_documents.len() + 2);
    out.push(ALL_DOCUMENTS.to_string());
    out.extend(indexed_documents.iter().cloned());
    if let Some(name) = uploaded {
        if !out.iter().any(|o| o == name) {
            out.push(name.to_string());
        }
    }
    out
}
