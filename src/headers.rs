use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ParseError, Result};
use crate::find_crlf;

/// The header fields of a request, keyed by lower-cased field name.
///
/// Values are kept exactly as received (minus surrounding whitespace) and
/// are not required to be UTF-8. Repeated field names are folded into a
/// single value joined by `", "` in arrival order. Distinct names keep their
/// first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: IndexMap<String, Vec<u8>>,
}

impl Headers {
    /// Create an empty header collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field value by name (case-insensitive) as text.
    ///
    /// Returns `None` if the field is absent or its value is not UTF-8; use
    /// [`Headers::get_bytes`] for the raw value.
    pub fn get(&self, name: &str) -> Option<&str> {
        std::str::from_utf8(self.get_bytes(name)?).ok()
    }

    /// Look up the raw field value by name (case-insensitive).
    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        self.fields.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// Returns `true` if a field with this name (case-insensitive) is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_lowercase())
    }

    /// Add a field, folding it into an existing value of the same name.
    ///
    /// The name is stored lower-cased. No validation happens here; use
    /// [`Headers::parse`] for wire input.
    pub fn append(&mut self, name: &str, value: &[u8]) {
        let name = name.to_lowercase();
        match self.fields.get_mut(&name) {
            Some(existing) => {
                existing.extend_from_slice(b", ");
                existing.extend_from_slice(value);
            }
            None => {
                self.fields.insert(name, value.to_vec());
            }
        }
    }

    /// Number of distinct field names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields have been stored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, raw value)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parse at most one header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line that
    /// ends the header section was reached. `(0, false)` means `data` does
    /// not yet hold a full line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedHeaderField`] when the colon is missing,
    /// leads the line, or follows a space, or when the field name is not
    /// UTF-8 or holds a character outside the token set.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool)> {
        let Some(idx) = find_crlf(data) else {
            return Ok((0, false));
        };
        if idx == 0 {
            return Ok((2, true));
        }

        let line = data[..idx].trim_ascii();
        let colon = match line.iter().position(|&b| b == b':') {
            Some(pos) if pos > 0 && line[pos - 1] != b' ' => pos,
            _ => {
                return Err(ParseError::MalformedHeaderField(format!(
                    "malformed field-name in '{}'",
                    String::from_utf8_lossy(line)
                )));
            }
        };

        let name = std::str::from_utf8(&line[..colon]).map_err(|_| {
            ParseError::MalformedHeaderField(format!(
                "field name '{}' is not valid UTF-8",
                String::from_utf8_lossy(&line[..colon])
            ))
        })?;
        if let Some(bad) = name.chars().find(|&c| !is_field_name_char(c)) {
            return Err(ParseError::MalformedHeaderField(format!(
                "invalid character {bad:?} in field name '{name}'"
            )));
        }

        self.append(name, line[colon + 1..].trim_ascii());
        Ok((idx + 2, false))
    }
}

/// Serializes as a map of name to value; values that are not UTF-8 are
/// rendered lossily.
impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &String::from_utf8_lossy(value))?;
        }
        map.end()
    }
}

/// Letters, digits and ``! # $ % & ' * + - . ^ _ ` | ~``.
#[inline]
fn is_field_name_char(c: char) -> bool {
    c.is_alphabetic()
        || c.is_numeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_single_header() {
        let mut headers = Headers::new();
        let (n, done) = headers.parse(b"Host: localhost:42069\r\n\r\n").unwrap();
        assert_eq!(headers.get("Host"), Some("localhost:42069"));
        assert_eq!(n, 23);
        assert!(!done);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut headers = Headers::new();
        let (n, done) = headers.parse(b"       Host: localhost:42069       \r\n\r\n").unwrap();
        assert_eq!(headers.get("host"), Some("localhost:42069"));
        assert_eq!(n, 37);
        assert!(!done);
    }

    #[test]
    fn existing_headers_are_kept() {
        let mut headers = Headers::new();
        headers.append("Accept", b"*/*");
        headers.parse(b"User-Agent: curl/7.81.0\r\n").unwrap();
        assert_eq!(headers.get("accept"), Some("*/*"));
        assert_eq!(headers.get("user-agent"), Some("curl/7.81.0"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn blank_line_ends_the_section() {
        let mut headers = Headers::new();
        let (n, done) = headers.parse(b"\r\n a bunch of other stuff").unwrap();
        assert!(headers.is_empty());
        assert_eq!(n, 2);
        assert!(done);
    }

    #[test]
    fn space_before_colon_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"       Host : localhost:42069       \r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderField(_)));
    }

    #[test]
    fn missing_or_leading_colon_is_rejected() {
        let mut headers = Headers::new();
        assert!(headers.parse(b"Host localhost\r\n").is_err());
        assert!(headers.parse(b": localhost\r\n").is_err());
        assert!(headers.parse(b"   \r\n").is_err());
    }

    #[test]
    fn invalid_name_character_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"H\xC2\xA9st: localhost:42069\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderField(_)));
        assert!(headers.parse(b"Ho@st: x\r\n").is_err());
        assert!(headers.parse(b"Ho st: x\r\n").is_err());
    }

    #[test]
    fn non_ascii_letters_in_name_are_accepted() {
        let mut headers = Headers::new();
        headers.parse("Hést: x\r\n".as_bytes()).unwrap();
        headers.parse("ZÄHLER-٣: 3\r\n".as_bytes()).unwrap();
        assert_eq!(headers.get("hést"), Some("x"));
        assert_eq!(headers.get("HÉST"), Some("x"));
        assert_eq!(headers.get("zähler-٣"), Some("3"));
    }

    #[test]
    fn non_utf8_name_is_rejected() {
        let mut headers = Headers::new();
        let err = headers.parse(b"Ho\xFFst: x\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedHeaderField(_)));
    }

    #[test]
    fn non_utf8_value_is_kept_byte_exact() {
        let mut headers = Headers::new();
        headers.parse(b"X-Bin: a\xFFb\r\n").unwrap();
        headers.parse(b"X-Bin: \xC3\r\n").unwrap();
        assert_eq!(headers.get_bytes("x-bin"), Some(&b"a\xFFb, \xC3"[..]));
        assert_eq!(headers.get("x-bin"), None);
        assert!(headers.contains("x-bin"));
    }

    #[test]
    fn every_token_special_is_accepted() {
        let mut headers = Headers::new();
        headers.parse(b"X-!#$%&'*+-.^_`|~9: ok\r\n").unwrap();
        assert_eq!(headers.get("x-!#$%&'*+-.^_`|~9"), Some("ok"));
    }

    #[test]
    fn repeated_names_fold_in_order() {
        let mut headers = Headers::new();
        headers.parse(b"Host: a\r\n").unwrap();
        headers.parse(b"HOST: b\r\n").unwrap();
        headers.parse(b"host: c\r\n").unwrap();
        assert_eq!(headers.get("Host"), Some("a, b, c"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn names_are_stored_lowercase() {
        let mut headers = Headers::new();
        headers.parse(b"Content-Type: text/plain\r\n").unwrap();
        let names: Vec<&str> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["content-type"]);
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn partial_line_needs_more_data() {
        let mut headers = Headers::new();
        assert_eq!(headers.parse(b"Host: local").unwrap(), (0, false));
        assert_eq!(headers.parse(b"Host: localhost\r").unwrap(), (0, false));
        assert!(headers.is_empty());
    }

    #[test]
    fn empty_value_is_allowed() {
        let mut headers = Headers::new();
        headers.parse(b"X-Empty:\r\n").unwrap();
        assert_eq!(headers.get("x-empty"), Some(""));
    }

    #[test]
    fn serializes_as_object() {
        let mut headers = Headers::new();
        headers.append("Host", b"h");
        headers.append("Accept", b"*/*");
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"host":"h","accept":"*/*"}"#);
    }
}
