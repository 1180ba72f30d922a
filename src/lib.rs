//! # reqstream
//!
//! An **incremental HTTP/1.1 request parser** that rebuilds a request from a
//! byte stream arriving in arbitrarily-sized reads.
//!
//! The parser is a small state machine (request line, headers, body) that
//! consumes whole lines or body bytes as they become available and asks for
//! more data otherwise. The stream driver pulls from any [`std::io::Read`]
//! into a growable buffer, so a request split into one-byte reads parses
//! exactly like one delivered at once.
//!
//! Only `Content-Length` framing is supported, and exactly one request is
//! read per source.
//!
//! ## Quick start: reading from a stream
//!
//! ```rust
//! use reqstream::request_from_reader;
//!
//! let raw = b"POST /coffee HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
//! let request = request_from_reader(&raw[..]).expect("valid request");
//! assert_eq!(request.method(), "POST");
//! assert_eq!(request.target(), "/coffee");
//! assert_eq!(request.body(), b"hello");
//! ```
//!
//! ## Quick start: driving the parser yourself
//!
//! ```rust
//! use reqstream::{ParserState, RequestParser};
//!
//! let mut parser = RequestParser::new();
//!
//! let consumed = parser.parse(b"GET / HTTP/1.1\r\nHo").unwrap();
//! assert_eq!(consumed, 16);
//! assert_eq!(parser.state(), ParserState::ParsingHeaders);
//!
//! parser.parse(b"Host: localhost\r\n\r\n").unwrap();
//! let request = parser.finish().unwrap();
//! assert_eq!(request.header("HOST"), Some("localhost"));
//! ```

mod error;
mod headers;
mod output;
mod reader;
mod request;
mod request_line;

// Re-export public API.
pub use error::{ParseError, Result};
pub use headers::Headers;
pub use output::{format_debug, format_headers_only, format_json};
pub use reader::{
    ChunkedReader, ReaderConfig, parse_request, request_from_reader,
    request_from_reader_with_config,
};
pub use request::{ParserState, Request, RequestParser};
pub use request_line::{RequestLine, parse_request_line};

/// HTTP line terminator.
const CRLF: &[u8] = b"\r\n";

/// Offset of the first CRLF in `data`, if any.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}
