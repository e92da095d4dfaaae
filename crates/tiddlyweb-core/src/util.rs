//! Encoding helpers shared by the serializations and the web layer.

use sha2::{Digest, Sha256};

/// Percent-encodes an entity name for use as one URL path segment.
///
/// Alphanumerics and `_.-~!*'()` are left alone, every other byte of the
/// UTF-8 encoding is escaped. `/` is escaped, so a name always maps to
/// exactly one segment.
#[must_use]
pub fn encode_name(name: &str) -> String {
    // urlencoding leaves `_.-~` alone; every `%` in its output starts an
    // escape, so the remaining safe characters can be restored textually.
    urlencoding::encode(name)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Escapes text for inclusion in HTML element content.
#[must_use]
pub fn html_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text for inclusion in a double-quoted HTML attribute.
#[must_use]
pub fn escape_attribute_value(text: &str) -> String {
    html_encode(text).replace('\'', "&#x27;")
}

/// Returns the lowercase hex SHA-256 digest of `data`.
#[must_use]
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_name_safe_set() {
        assert_eq!(encode_name("a.b-c_d~e!f*g'h(i)"), "a.b-c_d~e!f*g'h(i)");
    }

    #[test]
    fn test_encode_name_escapes_slash_and_space() {
        assert_eq!(encode_name("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_name("50%"), "50%25");
        assert_eq!(encode_name("é"), "%C3%A9");
    }

    #[test]
    fn test_html_encode() {
        assert_eq!(
            html_encode("<a href=\"x\">&</a>"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
        assert_eq!(escape_attribute_value("it's"), "it&#x27;s");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    proptest! {
        #[test]
        fn encoded_names_decode_back(name in "\\PC*") {
            let encoded = encode_name(&name);
            prop_assert!(!encoded.contains('/'));
            let decoded = urlencoding::decode(&encoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), name.as_str());
        }
    }
}
