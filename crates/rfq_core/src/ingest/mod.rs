pub mod loader;
pub mod splitter;

pub use loader::{load_bytes, load_document, DocumentKind, LoadedDocument};
pub use splitter::{ChunkDraft, RecursiveSplitter};
