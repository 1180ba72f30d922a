use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::error::{ParseError, Result};
use crate::headers::Headers;
use crate::request_line::{RequestLine, parse_request_line};

const CONTENT_LENGTH: &str = "content-length";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A fully parsed HTTP request.
///
/// Produced by [`RequestParser::finish`] or the stream driver once parsing
/// reaches [`ParserState::Done`]. Fields are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    #[serde(serialize_with = "serialize_body")]
    body: Vec<u8>,
}

/// Serialize body bytes as a UTF-8 string (lossy) for JSON output.
fn serialize_body<S: Serializer>(body: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(body))
}

impl Request {
    /// The parsed request line.
    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    /// Shorthand for `request_line().method()`.
    pub fn method(&self) -> &str {
        self.request_line.method()
    }

    /// Shorthand for `request_line().target()`.
    pub fn target(&self) -> &str {
        self.request_line.target()
    }

    /// Shorthand for `request_line().version()`.
    pub fn version(&self) -> &str {
        self.request_line.version()
    }

    /// The header collection.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Look up a header value by name (case-insensitive) as text.
    ///
    /// `None` if absent or not UTF-8; see [`Request::header_bytes`].
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Look up the raw header value by name (case-insensitive).
    pub fn header_bytes(&self, name: &str) -> Option<&[u8]> {
        self.headers.get_bytes(name)
    }

    /// The raw body bytes. Empty when the request carried no body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Return the body as `&str` if it is valid UTF-8.
    pub fn body_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// The declared `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get(CONTENT_LENGTH)?.parse().ok()
    }

    /// Split the request into its owned parts.
    pub fn into_parts(self) -> (RequestLine, Headers, Vec<u8>) {
        (self.request_line, self.headers, self.body)
    }
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

/// Progress of a [`RequestParser`]. States are only ever visited in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Waiting for a complete request line.
    Initialized,
    /// Reading header lines until the blank line.
    ParsingHeaders,
    /// Accumulating body bytes up to `Content-Length`.
    ParsingBody,
    /// A complete request has been parsed.
    Done,
}

impl ParserState {
    /// Return the state name as a static string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::ParsingHeaders => "parsing headers",
            Self::ParsingBody => "parsing body",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// An incremental HTTP/1.1 request parser.
///
/// Feed it the bytes received so far with [`RequestParser::parse`]; it
/// reports how many bytes it consumed, and the caller drops those from its
/// buffer before feeding the rest plus whatever arrives next.
///
/// ```rust
/// use reqstream::{ParserState, RequestParser};
///
/// let mut parser = RequestParser::new();
/// let data = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
///
/// assert_eq!(parser.parse(&data[..10]).unwrap(), 0);
/// assert_eq!(parser.parse(data).unwrap(), data.len());
/// assert_eq!(parser.state(), ParserState::Done);
///
/// let request = parser.finish().unwrap();
/// assert_eq!(request.target(), "/");
/// ```
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    body_bytes_read: usize,
}

impl RequestParser {
    /// Create a parser in the [`ParserState::Initialized`] state.
    pub fn new() -> Self {
        Self {
            state: ParserState::Initialized,
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
            body_bytes_read: 0,
        }
    }

    /// Current parser state.
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Returns `true` once a complete request has been parsed.
    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consume as much of `data` as possible.
    ///
    /// Runs single parse steps until the request is done or a step makes no
    /// progress, and returns the total bytes consumed. A return of zero with
    /// the parser not done means more input is needed.
    ///
    /// # Errors
    ///
    /// Any malformed input aborts the parse. Calling this on a parser that
    /// is already done returns [`ParseError::AlreadyDone`].
    pub fn parse(&mut self, data: &[u8]) -> Result<usize> {
        if self.is_done() {
            return Err(ParseError::AlreadyDone);
        }

        let mut total = 0;
        while !self.is_done() {
            let n = self.parse_single(&data[total..])?;
            total += n;
            if n == 0 {
                break;
            }
        }
        trace!(consumed = total, offered = data.len(), state = %self.state, "parse pass");
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize> {
        match self.state {
            ParserState::Initialized => {
                let Some((line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                debug!(method = %line.method(), target = %line.target(), "parsed request line");
                self.request_line = Some(line);
                self.transition(ParserState::ParsingHeaders);
                Ok(n)
            }

            ParserState::ParsingHeaders => {
                let (n, done) = self.headers.parse(data)?;
                if done {
                    debug!(fields = self.headers.len(), "end of header section");
                    self.transition(ParserState::ParsingBody);
                }
                Ok(n)
            }

            ParserState::ParsingBody => {
                let Some(declared) = self.declared_content_length()? else {
                    self.transition(ParserState::Done);
                    return Ok(0);
                };

                self.body.extend_from_slice(data);
                self.body_bytes_read += data.len();

                if self.body_bytes_read > declared {
                    return Err(ParseError::BodyOverflow {
                        declared,
                        read: self.body_bytes_read,
                    });
                }
                if self.body_bytes_read == declared {
                    self.transition(ParserState::Done);
                }
                Ok(data.len())
            }

            ParserState::Done => Err(ParseError::AlreadyDone),
        }
    }

    fn declared_content_length(&self) -> Result<Option<usize>> {
        self.headers
            .get_bytes(CONTENT_LENGTH)
            .map(|raw| {
                let invalid = || {
                    ParseError::MalformedContentLength(String::from_utf8_lossy(raw).into_owned())
                };
                std::str::from_utf8(raw)
                    .ok()
                    .and_then(|value| value.parse::<usize>().ok())
                    .ok_or_else(invalid)
            })
            .transpose()
    }

    fn transition(&mut self, next: ParserState) {
        debug!(from = %self.state, to = %next, "parser state change");
        self.state = next;
    }

    /// Consume the parser and return the parsed [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::IncompleteRequest`] carrying the current state
    /// if the parser has not reached [`ParserState::Done`].
    pub fn finish(self) -> Result<Request> {
        let incomplete = ParseError::IncompleteRequest { state: self.state };
        if self.state != ParserState::Done {
            return Err(incomplete);
        }
        Ok(Request {
            request_line: self.request_line.ok_or(incomplete)?,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}
