use std::fmt;

use crate::request::Request;

/// Serialize a [`Request`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json(request: &Request, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(request)
    } else {
        serde_json::to_string(request)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Render a [`Request`] in a human-readable debug format.
pub fn format_debug(request: &Request) -> String {
    DebugView(request).to_string()
}

/// Render only the request line and headers (no body).
pub fn format_headers_only(request: &Request) -> String {
    HeadersView(request).to_string()
}

struct DebugView<'a>(&'a Request);

impl fmt::Display for DebugView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request = self.0;
        writeln!(f, "Request line:")?;
        writeln!(f, "- Method: {}", request.method())?;
        writeln!(f, "- Target: {}", request.target())?;
        writeln!(f, "- Version: {}", request.version())?;

        writeln!(f, "Headers:")?;
        for (name, value) in request.headers().iter() {
            writeln!(f, "- {name}: {}", String::from_utf8_lossy(value))?;
        }

        writeln!(f, "Body:")?;
        let body = request.body();
        if body.is_empty() {
            return writeln!(f, "(empty)");
        }
        match std::str::from_utf8(body) {
            Ok(s) => writeln!(f, "{s}"),
            Err(_) => writeln!(f, "<binary data: {} bytes>", body.len()),
        }
    }
}

struct HeadersView<'a>(&'a Request);

impl fmt::Display for HeadersView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.0.request_line())?;
        for (name, value) in self.0.headers().iter() {
            writeln!(f, "{name}: {}", String::from_utf8_lossy(value))?;
        }
        Ok(())
    }
}
