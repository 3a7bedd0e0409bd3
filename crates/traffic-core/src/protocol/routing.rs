//! Plain-HTTP request classification and response heads.
//!
//! The endpoint exposes exactly two behaviours: the JSON traffic-state
//! document and the cached HTML page.  Every plain response is `200 OK` with
//! `Connection: close`; there is no 404.

/// Request-line prefix that selects the traffic-state document.
pub const TRAFFIC_STATE_PREFIX: &str = "GET /traffic_state";

/// What a plain (non-upgraded) request should receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /traffic_state...` → JSON document.
    TrafficState,
    /// Anything else → the cached page.
    Page,
}

impl Route {
    /// Classifies a request by its raw request line.
    ///
    /// Only the prefix is compared, so `GET /traffic_state?x=1` also selects
    /// [`Route::TrafficState`].
    ///
    /// ```rust
    /// use traffic_core::protocol::routing::Route;
    ///
    /// assert_eq!(Route::classify("GET /traffic_state HTTP/1.1"), Route::TrafficState);
    /// assert_eq!(Route::classify("GET / HTTP/1.1"), Route::Page);
    /// ```
    pub fn classify(request_line: &str) -> Self {
        if request_line.starts_with(TRAFFIC_STATE_PREFIX) {
            Route::TrafficState
        } else {
            Route::Page
        }
    }

    /// The content type served for this route.
    pub fn content_type(self) -> ContentType {
        match self {
            Route::TrafficState => ContentType::Json,
            Route::Page => ContentType::Html,
        }
    }
}

/// Content types the endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Html,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Html => "text/html",
        }
    }
}

/// Builds the status line and headers of a plain `200 OK` response,
/// including the blank line that ends the header block.
pub fn response_head(content_type: ContentType) -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
        content_type.as_str()
    )
    .into_bytes()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
