//! Application layer for traffic-server.
//!
//! Decides *what* goes back to a client that did not upgrade: the current
//! traffic state or the cached page.  Sockets, threads and files stay in the
//! infrastructure layer.
//!
//! # Responsibilities
//!
//! - Polling the serial port once per state request ([`SensorStateReader`])
//! - Rendering the page template once at startup ([`CachedPage`])
//! - Assembling plain-HTTP responses ([`RequestRouter`])

pub mod page;
pub mod router;
pub mod sensor_state;

pub use page::{render_template, template_values, CachedPage, DEFAULT_PAGE_TEMPLATE};
pub use router::{PlainResponse, RequestRouter};
pub use sensor_state::{SensorStateReader, SerialPort};
