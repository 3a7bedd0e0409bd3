//! Builds the plain-HTTP response for a request that did not upgrade.

use tracing::debug;
use traffic_core::{response_head, HttpRequest, Route};

use crate::application::page::CachedPage;
use crate::application::sensor_state::SensorStateReader;

/// A complete response, ready to be written before the socket is closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainResponse {
    pub route: Route,
    pub bytes: Vec<u8>,
}

/// Chooses between the traffic-state document and the cached page.
#[derive(Debug, Clone)]
pub struct RequestRouter {
    page: CachedPage,
}

impl RequestRouter {
    pub fn new(page: CachedPage) -> Self {
        Self { page }
    }

    /// Produces head and body for `request`.
    ///
    /// The serial port is only polled for `/traffic_state`; the page route
    /// never touches it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the traffic-state document fails to
    /// serialize.
    pub fn respond(
        &self,
        request: &HttpRequest,
        sensor: &mut SensorStateReader,
    ) -> Result<PlainResponse, serde_json::Error> {
        let route = Route::classify(&request.request_line);
        let mut bytes = response_head(route.content_type());

        match route {
            Route::TrafficState => {
                let body = sensor.read_state().to_json()?;
                debug!("traffic state body: {body}");
                bytes.extend_from_slice(body.as_bytes());
            }
            Route::Page => bytes.extend_from_slice(self.page.as_bytes()),
        }

        Ok(PlainResponse { route, bytes })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
