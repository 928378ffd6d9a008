/// Escapes the five XML-significant characters so user text can be embedded in markup.
///
/// Single pass, no other transformation. Escaping an already escaped string escapes it again.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_each_special_character() {
        assert_eq!(escape_xml("<"), "&lt;");
        assert_eq!(escape_xml(">"), "&gt;");
        assert_eq!(escape_xml("&"), "&amp;");
        assert_eq!(escape_xml("\""), "&quot;");
        assert_eq!(escape_xml("'"), "&apos;");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "Dear Hiring Manager,\n\nThank you, über café #1";
        assert_eq!(escape_xml(text), text);
    }

    #[test]
    fn test_no_raw_special_characters_survive() {
        let escaped = escape_xml(r#"<a href="x">Tom & Jerry's</a>"#);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
        assert!(!escaped.contains('"'));
        assert!(!escaped.contains('\''));
        // every remaining '&' starts one of the five entities
        let entities = ["&lt;", "&gt;", "&amp;", "&quot;", "&apos;"];
        for (idx, _) in escaped.match_indices('&') {
            assert!(
                entities.iter().any(|e| escaped[idx..].starts_with(e)),
                "unexpected '&' at {idx} in {escaped}"
            );
        }
    }

    #[test]
    fn test_ampersand_is_escaped_once_per_call() {
        assert_eq!(escape_xml("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(escape_xml(""), "");
    }
}
