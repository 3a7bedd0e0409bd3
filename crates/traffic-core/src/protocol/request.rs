//! Line tokenizer for the first bytes received on a freshly accepted
//! connection.
//!
//! The endpoint only ever looks at one bounded read per connection, so the
//! tokenizer works on a byte slice rather than a stream:
//!
//! ```text
//! GET /traffic_state HTTP/1.1\r\n      <- request line
//! Host: 192.168.4.1\r\n                <- header lines ("Name: Value")
//! Sec-WebSocket-Key: dGhl...==\r\n
//! \r\n                                 <- end of header block
//! ```
//!
//! Both the handshake negotiator and the request router consume the resulting
//! [`HttpRequest`], so the bytes are split exactly once.

use thiserror::Error;

/// Upper bound on the initial read from a new connection, in bytes.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Line terminator used by HTTP/1.1.
const CRLF: &str = "\r\n";

/// Separator between a header name and its value.
const HEADER_SEPARATOR: &str = ": ";

/// Errors produced while tokenizing a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The peer closed the connection before sending a single byte.
    #[error("empty request: peer sent no data")]
    Empty,
}

/// One header line of the request.
///
/// `value` is `None` when the line does not contain the `": "` separator.
/// Such lines are kept (rather than dropped) so that callers can tell "header
/// missing" apart from "header present but malformed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    /// Text before the separator (or before the first `:` for malformed lines).
    pub name: String,
    /// Text after the first `": "`, if the separator was present.
    pub value: Option<String>,
}

impl HeaderField {
    /// Tokenizes a single header line.
    pub fn parse(line: &str) -> Self {
        match line.split_once(HEADER_SEPARATOR) {
            Some((name, value)) => Self {
                name: name.to_string(),
                value: Some(value.to_string()),
            },
            None => Self {
                name: line.split(':').next().unwrap_or(line).to_string(),
                value: None,
            },
        }
    }
}

/// Structured view of the initial request bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The raw first line, e.g. `GET /traffic_state HTTP/1.1`.
    pub request_line: String,
    /// First whitespace-separated token of the request line (empty if absent).
    pub method: String,
    /// Second token of the request line (empty if absent).
    pub path: String,
    /// Third token of the request line (empty if absent).
    pub version: String,
    /// Header lines in the order they were received.
    pub headers: Vec<HeaderField>,
}

impl HttpRequest {
    /// Tokenizes the bytes of one bounded read.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than rejected; the header
    /// block ends at the first empty line or at the end of the buffer,
    /// whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Empty`] if `bytes` is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use traffic_core::protocol::request::HttpRequest;
    ///
    /// let req = HttpRequest::parse(b"GET / HTTP/1.1\r\nHost: esp32\r\n\r\n").unwrap();
    /// assert_eq!(req.method, "GET");
    /// assert_eq!(req.path, "/");
    /// assert_eq!(req.header_value("Host"), Some("esp32"));
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self, RequestError> {
        if bytes.is_empty() {
            return Err(RequestError::Empty);
        }

        let text = String::from_utf8_lossy(bytes);
        let mut lines = text.split(CRLF);

        let request_line = lines.next().unwrap_or_default().to_string();
        let mut tokens = request_line.split_whitespace();
        let method = tokens.next().unwrap_or_default().to_string();
        let path = tokens.next().unwrap_or_default().to_string();
        let version = tokens.next().unwrap_or_default().to_string();

        let headers = lines
            .take_while(|line| !line.is_empty())
            .map(HeaderField::parse)
            .collect();

        Ok(Self {
            request_line,
            method,
            path,
            version,
            headers,
        })
    }

    /// Returns the first header whose name matches `name` exactly
    /// (case-sensitive).
    pub fn header(&self, name: &str) -> Option<&HeaderField> {
        self.headers.iter().find(|h| h.name == name)
    }

    /// Returns the value of the first header named `name`, if that header is
    /// present and well formed.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|h| h.value.as_deref())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
