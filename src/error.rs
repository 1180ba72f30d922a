use std::io;

use crate::request::ParserState;

/// Errors that can occur while reading and parsing an HTTP request.
///
/// Every variant is fatal for the request being parsed. "Need more data" is
/// not an error: parse steps report it by consuming zero bytes.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Wrong token count, wrong protocol or version, or a bad method/target.
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header field line with a bad name or a misplaced colon.
    #[error("malformed header field: {0}")]
    MalformedHeaderField(String),

    /// The `Content-Length` header value is not a non-negative integer.
    #[error("malformed Content-Length: '{0}'")]
    MalformedContentLength(String),

    /// More body bytes arrived than `Content-Length` declared.
    #[error("request body length {read} exceeds Content-Length {declared}")]
    BodyOverflow {
        /// The declared `Content-Length`.
        declared: usize,
        /// Body bytes accumulated when the overflow was detected.
        read: usize,
    },

    /// The source ran out of data before the request was complete.
    #[error("incomplete request, in state: {state}")]
    IncompleteRequest {
        /// The state the parser stalled in.
        state: ParserState,
    },

    /// A parse step was attempted on a parser that already reached `Done`.
    #[error("trying to parse data in the done state")]
    AlreadyDone,

    /// Reading from the byte source failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParseError>;
