use std::fmt;

use serde::Serialize;

use crate::error::{ParseError, Result};
use crate::find_crlf;

const PROTOCOL: &str = "HTTP";
const SUPPORTED_VERSION: &str = "1.1";

/// The first line of an HTTP request: `METHOD SP TARGET SP HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// The request method, e.g. `GET`. Always uppercase letters.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request target, exactly as received.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The HTTP version number without the `HTTP/` prefix (always `1.1`).
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {PROTOCOL}/{}", self.method, self.target, self.version)
    }
}

/// Parse a request line from the front of `data`.
///
/// Returns `Ok(None)` when no CRLF has arrived yet. On success the second
/// element is the number of bytes consumed, CRLF included.
///
/// # Errors
///
/// Returns [`ParseError::MalformedRequestLine`] if the line does not have
/// exactly three space-separated parts, the protocol is not `HTTP/1.1`, the
/// method is not all uppercase letters, or the target is empty.
pub fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>> {
    let Some(idx) = find_crlf(data) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&data[..idx])
        .map_err(|_| malformed("request line is not valid UTF-8".into()))?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, protocol] = parts[..] else {
        return Err(malformed(format!(
            "expected 3 space-separated parts, found {} in '{line}'",
            parts.len()
        )));
    };

    let (name, version) = match protocol.split('/').collect::<Vec<_>>()[..] {
        [name, version] => (name, version),
        _ => return Err(malformed(format!("malformed protocol/version '{protocol}'"))),
    };
    if name != PROTOCOL || version != SUPPORTED_VERSION {
        return Err(malformed(format!("unsupported protocol/version '{protocol}'")));
    }

    if method.is_empty() || !method.chars().all(char::is_uppercase) {
        return Err(malformed(format!("invalid method '{method}'")));
    }
    if target.is_empty() {
        return Err(malformed("empty request target".into()));
    }

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
    };
    Ok(Some((request_line, idx + 2)))
}

fn malformed(reason: String) -> ParseError {
    ParseError::MalformedRequestLine(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(data: &[u8]) -> (RequestLine, usize) {
        parse_request_line(data)
            .expect("should parse")
            .expect("should be complete")
    }

    #[test]
    fn good_get_request_line() {
        let (line, n) = parse_ok(b"GET /coffee HTTP/1.1\r\n");
        assert_eq!(line.method(), "GET");
        assert_eq!(line.target(), "/coffee");
        assert_eq!(line.version(), "1.1");
        assert_eq!(n, 22);
    }

    #[test]
    fn consumed_count_stops_after_crlf() {
        let (line, n) = parse_ok(b"POST /coffee HTTP/1.1\r\nHost: localhost\r\n\r\n");
        assert_eq!(line.method(), "POST");
        assert_eq!(n, 23);
    }

    #[test]
    fn missing_crlf_needs_more_data() {
        assert!(parse_request_line(b"GET / HTTP/1.1").unwrap().is_none());
        assert!(parse_request_line(b"GET / HTTP/1.1\r").unwrap().is_none());
        assert!(parse_request_line(b"").unwrap().is_none());
    }

    #[test]
    fn mixed_case_method_is_rejected() {
        let err = parse_request_line(b"GeT / HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine(_)));
    }

    #[test]
    fn non_ascii_uppercase_method_is_accepted() {
        let (line, n) = parse_ok("GÉT / HTTP/1.1\r\n".as_bytes());
        assert_eq!(line.method(), "GÉT");
        assert_eq!(n, 17);
    }

    #[test]
    fn method_with_non_letters_is_rejected() {
        assert!(parse_request_line("GÉt / HTTP/1.1\r\n".as_bytes()).is_err());
        assert!(parse_request_line(b"GET1 / HTTP/1.1\r\n").is_err());
        assert!(parse_request_line(b"GET-X / HTTP/1.1\r\n").is_err());
    }

    #[test]
    fn wrong_part_count_is_rejected() {
        assert!(parse_request_line(b"/coffee HTTP/1.1\r\n").is_err());
        assert!(parse_request_line(b"GET /coffee HTTP/1.1 extra\r\n").is_err());
        assert!(parse_request_line(b"GET  /coffee HTTP/1.1\r\n").is_err());
    }

    #[test]
    fn wrong_version_is_rejected() {
        assert!(parse_request_line(b"GET / HTTP/1.0\r\n").is_err());
        assert!(parse_request_line(b"GET / HTTP/2\r\n").is_err());
        assert!(parse_request_line(b"GET / HTTPS/1.1\r\n").is_err());
        assert!(parse_request_line(b"GET / HTTP/1.1/x\r\n").is_err());
        assert!(parse_request_line(b"GET / HTTP1.1\r\n").is_err());
    }

    #[test]
    fn empty_method_or_target_is_rejected() {
        assert!(parse_request_line(b" / HTTP/1.1\r\n").is_err());
        assert!(parse_request_line(b"GET  HTTP/1.1\r\n").is_err());
    }

    #[test]
    fn non_utf8_line_is_rejected() {
        let err = parse_request_line(b"GET /\xFF HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedRequestLine(_)));
    }

    #[test]
    fn display_reconstructs_the_line() {
        let (line, _) = parse_ok(b"DELETE /pot/1 HTTP/1.1\r\n");
        assert_eq!(line.to_string(), "DELETE /pot/1 HTTP/1.1");
    }
}
