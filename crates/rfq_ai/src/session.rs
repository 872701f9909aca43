use rfq_core::error::AppError;
use rfq_core::scope::Scope;
use tracing::info;

use crate::index::{UploadIndex, VectorIndex};

/// Per-session slot holding at most one uploaded document's index.
#[derive(Debug, Default)]
pub struct UploadSession {
    current: Option<UploadIndex>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded_name(&self) -> Option<&str> {
        self.current.as_ref().map(UploadIndex::document_name)
    }

    pub fn index(&self) -> Option<&UploadIndex> {
        self.current.as_ref()
    }

    /// Replace the active upload unless `name` is already the active one.
    /// Returns whether a new index was built. On a build error the previous
    /// upload stays active.
    pub fn replace_with<F>(&mut self, name: &str, build: F) -> Result<bool, AppError>
    where
        F: FnOnce() -> Result<UploadIndex, AppError>,
    {
        if self.uploaded_name() == Some(name) {
            return Ok(false);
        }
        let index = build()?;
        info!(
            document = name,
            chunks = index.len(),
            replaced = self.current.is_some(),
            "upload index ready"
        );
        self.current = Some(index);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// Where a query goes and the scope value handed to the orchestrator.
pub struct ResolvedTarget<'a> {
    pub index: Option<&'a dyn VectorIndex>,
    pub scope_filter: Option<String>,
}

/// Pick the index for a focus selection. Focusing on the uploaded file
/// queries its ephemeral index unfiltered; anything else goes to the corpus,
/// filtered to the named document unless the focus is the whole corpus.
pub fn resolve_target<'a>(
    focus: Option<&str>,
    corpus: Option<&'a dyn VectorIndex>,
    uploads: &'a UploadSession,
) -> ResolvedTarget<'a> {
    match Scope::from_focus(focus) {
        Scope::Document(name) if uploads.uploaded_name() == Some(name.as_str()) => {
            ResolvedTarget {
                index: uploads.index().map(|i| i as &dyn VectorIndex),
                scope_filter: None,
            }
        }
        Scope::Document(name) => ResolvedTarget {
            index: corpus,
            scope_filter: Some(name),
        },
        Scope::All => ResolvedTarget {
            index: corpus,
            scope_filter: None,
        },
    }
}
