//! Line protocol escaping rules
//!
//! | Element              | Escaped characters      |
//! |----------------------|-------------------------|
//! | measurement          | comma, space            |
//! | tag key/value, field | comma, equals, space    |
//! | string field value   | double quote, backslash |

/// Escape a measurement name
pub fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

/// Escape a tag key, tag value or field key
pub fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

/// Escape the contents of a string field value (without the quotes)
pub fn escape_string_value(s: &str) -> String {
    escape(s, &['\\', '"'])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Remove backslash escapes in front of `special` bytes
///
/// A backslash followed by any other byte is kept verbatim.
pub fn unescape(raw: &[u8], special: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() && special.contains(&raw[i + 1]) {
            out.push(raw[i + 1]);
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_measurement() {
        assert_eq!(escape_measurement("cpu load,x"), "cpu\\ load\\,x");
        assert_eq!(escape_measurement("a=b"), "a=b");
    }

    #[test]
    fn test_escape_key() {
        assert_eq!(escape_key("host name=a,b"), "host\\ name\\=a\\,b");
    }

    #[test]
    fn test_escape_string_value() {
        assert_eq!(escape_string_value(r#"say "hi" \o/"#), r#"say \"hi\" \\o/"#);
    }

    #[test]
    fn test_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(br"a\,b\xc", b","), b"a,b\\xc".to_vec());
        assert_eq!(unescape(b"trailing\\", b","), b"trailing\\".to_vec());
    }
}
