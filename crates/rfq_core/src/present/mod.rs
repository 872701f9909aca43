use crate::domain::SourceRecord;

/// Characters of each chunk shown in the sources panel.
pub const SNIPPET_CHARS: usize = 200;

pub const SUGGESTED_FOLLOW_UPS: [&str; 2] =
    ["Summarize key deadlines", "List all compliance requirements"];

/// Sources as Markdown quote blocks, one per source, separated by a blank line.
pub fn sources_markdown(sources: &[SourceRecord]) -> String {
    sources
        .iter()
        .map(|s| {
            format!(
                "> {}...\n> *Source: `{}`*",
                snippet(&s.content_snippet, SNIPPET_CHARS),
                s.source_document
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Follow-up questions offered after every answer the query path returns,
/// including no-match and error messages.
pub fn suggested_follow_ups() -> Vec<String> {
    SUGGESTED_FOLLOW_UPS.iter().map(|s| s.to_string()).collect()
}

/// First `max_chars` characters, cut on a char boundary.
pub fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("héllo", 2), "hé");
        assert_eq!(snippet("short", 200), "short");
    }
}
