//! Domain types for the traffic-state endpoint.
//!
//! Nothing in here touches sockets, files or the serial port; the types
//! describe what a sensor reading is and how it is presented to clients.

/// Sensor frames and the JSON traffic-state document.
pub mod traffic_state;

/// The Y-junction controller state table and lamp decoding.
pub mod junction;

pub use junction::{JunctionController, JunctionLights, JunctionState, Y_JUNCTION};
pub use traffic_state::{SensorFrame, TrafficState, NO_DATA_MESSAGE};
