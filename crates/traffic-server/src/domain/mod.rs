//! Domain layer for traffic-server.
//!
//! Pure configuration types: what the user wrote in `secrets.json`, and the
//! validated [`ServerConfig`] derived from it.  Reading the file is the
//! infrastructure layer's job.

pub mod config;

pub use config::{
    ConfigError, ListenConfig, SerialSelection, ServerConfig, Settings, WifiCredentials,
};
