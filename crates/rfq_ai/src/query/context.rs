use rfq_core::domain::RetrievedChunk;
use rfq_core::present::snippet;
use tracing::warn;

pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// The joined context block handed to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    pub text: String,
    /// Chunks that made it into `text`, counting a truncated one.
    pub included: usize,
    pub truncated: bool,
}

/// Join chunk texts in rank order. With a budget, the chunk that would
/// overflow it is cut at a char boundary and later chunks are left out.
/// Delimiters count against the budget.
pub fn build_context(chunks: &[RetrievedChunk], max_chars: Option<usize>) -> ContextBlock {
    let Some(budget) = max_chars else {
        let parts: Vec<&str> = chunks.iter().map(|c| c.page_content.as_str()).collect();
        return ContextBlock {
            text: parts.join(CONTEXT_DELIMITER),
            included: chunks.len(),
            truncated: false,
        };
    };

    let delim_len = CONTEXT_DELIMITER.chars().count();
    let mut text = String::new();
    let mut used = 0usize;
    let mut included = 0usize;
    let mut truncated = false;

    for (i, chunk) in chunks.iter().enumerate() {
        let sep = if i == 0 { 0 } else { delim_len };
        if used + sep >= budget {
            truncated = true;
            break;
        }
        let remaining = budget - used - sep;
        let len = chunk.page_content.chars().count();
        if i > 0 {
            text.push_str(CONTEXT_DELIMITER);
        }
        if len <= remaining {
            text.push_str(&chunk.page_content);
            used += sep + len;
            included += 1;
        } else {
            text.push_str(snippet(&chunk.page_content, remaining));
            included += 1;
            truncated = true;
            break;
        }
    }

    if truncated {
        warn!(
            budget,
            retrieved = chunks.len(),
            included,
            "context exceeded budget; truncated"
        );
    }

    ContextBlock {
        text,
        included,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(texts: &[&str]) -> Vec<RetrievedChunk> {
        texts.iter().map(|t| RetrievedChunk::new(*t)).collect()
    }

    #[test]
    fn unbounded_joins_everything() {
        let c = build_context(&chunks(&["a", "b", "c"]), None);
        assert_eq!(c.text, "a\n\n---\n\nb\n\n---\n\nc");
        assert_eq!(c.included, 3);
        assert!(!c.truncated);
    }

    #[test]
    fn fits_exactly_without_truncation() {
        // 3 + 7 + 3 chars
        let c = build_context(&chunks(&["abc", "def"]), Some(13));
        assert_eq!(c.text, "abc\n\n---\n\ndef");
        assert!(!c.truncated);
    }

    #[test]
    fn overflowing_chunk_is_cut_and_rest_dropped() {
        let c = build_context(&chunks(&["abc", "défgh", "ijk"]), Some(12));
        assert_eq!(c.text, "abc\n\n---\n\ndé");
        assert_eq!(c.included, 2);
        assert!(c.truncated);
    }

    #[test]
    fn delimiter_alone_exhausting_budget_stops() {
        let c = build_context(&chunks(&["abcd", "efgh"]), Some(8));
        assert_eq!(c.text, "abcd");
        assert_eq!(c.included, 1);
        assert!(c.truncated);
    }
}
