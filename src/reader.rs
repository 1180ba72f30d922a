use std::io::{self, Read};

use tracing::{debug, trace};

use crate::error::{ParseError, Result};
use crate::request::{Request, RequestParser};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for the stream driver.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Starting size of the read buffer in bytes (default: 8, minimum 1).
    /// The buffer doubles whenever it fills up.
    pub initial_buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Read and parse one HTTP request from `reader` with default settings.
///
/// # Errors
///
/// See [`request_from_reader_with_config`].
pub fn request_from_reader<R: Read>(reader: R) -> Result<Request> {
    request_from_reader_with_config(reader, &ReaderConfig::default())
}

/// Read and parse one HTTP request from `reader`.
///
/// Bytes are pulled into a growable buffer and offered to a
/// [`RequestParser`] after every read; consumed bytes are dropped from the
/// front of the buffer. Reads of any size, down to a single byte, produce
/// the same result.
///
/// # Errors
///
/// Returns [`ParseError::IncompleteRequest`] if the reader reports end of
/// input before the request is complete, [`ParseError::Io`] if a read
/// fails, and any parse error raised by the parser.
#[tracing::instrument(skip(reader), level = "debug")]
pub fn request_from_reader_with_config<R: Read>(
    mut reader: R,
    config: &ReaderConfig,
) -> Result<Request> {
    let mut buf = vec![0u8; config.initial_buffer_size.max(1)];
    let mut filled = 0;
    let mut parser = RequestParser::new();

    while !parser.is_done() {
        if filled >= buf.len() {
            let grown = buf.len() * 2;
            trace!(from = buf.len(), to = grown, "growing read buffer");
            buf.resize(grown, 0);
        }

        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            debug!(
                state = %parser.state(),
                buffered = filled,
                "end of input before request was complete"
            );
            return Err(ParseError::IncompleteRequest {
                state: parser.state(),
            });
        }
        filled += n;
        trace!(read = n, buffered = filled, "read from source");

        let consumed = parser.parse(&buf[..filled])?;
        buf.copy_within(consumed..filled, 0);
        filled -= consumed;
    }

    parser.finish()
}

/// Parse a complete HTTP request held in memory.
///
/// # Errors
///
/// Returns [`ParseError::IncompleteRequest`] if `data` ends before the
/// request does, or any parse error.
pub fn parse_request(data: &[u8]) -> Result<Request> {
    let config = ReaderConfig {
        initial_buffer_size: data.len(),
    };
    request_from_reader_with_config(data, &config)
}

// ---------------------------------------------------------------------------
// Chunked source
// ---------------------------------------------------------------------------

/// A reader adapter that returns at most `chunk_size` bytes per read.
///
/// Useful for exercising the parser against the small, uneven reads a
/// network socket produces.
#[derive(Debug)]
pub struct ChunkedReader<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> ChunkedReader<R> {
    /// Wrap `inner`, capping each read at `chunk_size` bytes (minimum 1).
    pub fn new(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Unwrap the adapter, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = buf.len().min(self.chunk_size);
        self.inner.read(&mut buf[..limit])
    }
}
