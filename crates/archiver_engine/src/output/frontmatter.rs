/// Jekyll post: YAML front matter, then the full text wrapped in a raw block so
/// Liquid leaves it alone. The raw block is omitted when there is no text.
pub fn build_post_document(archive_id: &str, title: &str, category: &str, full_text: &str) -> String {
    let mut doc = format!(
        "---\narchive_id: \"{archive_id}\"\ntitle: \"{title}\"\ncategory: \"{category}\"\n---\n\n",
        title = escape_double_quotes(title),
        category = escape_double_quotes(category),
    );
    if !full_text.is_empty() {
        doc.push_str("{% raw %}\n");
        doc.push_str(full_text);
        doc.push_str("\n{% endraw %}\n");
    }
    doc
}

/// Only `"` is escaped; backslashes and newlines pass through unchanged.
pub fn escape_double_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_without_text_is_front_matter_only() {
        let doc = build_post_document("1234", "Title", "Unread", "");
        assert_eq!(
            doc,
            "---\narchive_id: \"1234\"\ntitle: \"Title\"\ncategory: \"Unread\"\n---\n\n"
        );
    }

    #[test]
    fn text_is_wrapped_in_raw_block() {
        let doc = build_post_document("7", "T", "Starred", "<p>{{ not liquid }}</p>");
        assert!(doc.ends_with("---\n\n{% raw %}\n<p>{{ not liquid }}</p>\n{% endraw %}\n"));
    }

    #[test]
    fn quotes_in_title_are_escaped() {
        let doc = build_post_document("7", "Say \"hi\"", "Unread", "");
        assert!(doc.contains("title: \"Say \\\"hi\\\"\"\n"));
        assert_eq!(escape_double_quotes(r"a\b"), r"a\b");
    }
}
