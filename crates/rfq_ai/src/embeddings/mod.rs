use rfq_core::error::AppError;

/// Text to a fixed-dimension vector. `model` is the Ollama model name or the
/// Azure deployment name.
pub trait Embedder {
    fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError>;
}

pub mod azure_embed;
pub mod ollama_embed;

/// Keep requests bounded; the splitter already keeps chunks far below this.
pub(crate) const MAX_EMBED_INPUT_CHARS: usize = 12_000;

pub(crate) fn bounded_input(input: &str) -> &str {
    rfq_core::present::snippet(input, MAX_EMBED_INPUT_CHARS)
}
