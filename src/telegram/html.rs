//! HTML escaping for user-supplied text
//!
//! All outgoing messages use Telegram's HTML parse mode; catalog titles,
//! descriptions and flavor names come from admins and must be escaped before
//! interpolation into markup.

/// Escapes the characters Telegram's HTML parser treats specially.
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape("Чай Ассам 100г"), "Чай Ассам 100г");
    }

    #[test]
    fn test_escape_html_specials() {
        assert_eq!(escape("A<B & C>D"), "A&lt;B &amp; C&gt;D");
    }

    #[test]
    fn test_escape_amp_first() {
        // Already-escaped input is escaped again, not double-interpreted.
        assert_eq!(escape("&lt;"), "&amp;lt;");
    }
}
