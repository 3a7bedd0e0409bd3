//! Server configuration types.
//!
//! Configuration arrives in two shapes:
//!
//! - [`Settings`] mirrors the on-disk `secrets.json` (or `config.toml`) key
//!   for key.  Every field is optional so that a partially filled file still
//!   parses and the error message can say *what* is missing.
//! - [`ServerConfig`] is the validated, typed result.  It is built once at
//!   startup by [`ServerConfig::from_settings`] and never changes afterwards.
//!
//! ```json
//! {
//!   "SSID": "junction-ap",
//!   "PASSWORD": "********",
//!   "PORT": 80,
//!   "ESP_IP": "192.168.4.1",
//!   "WEBSOCKET_GUID": "258EAFA5-E914-47DA-95CA-C5AB0DC85B11",
//!   "TEMPLATE": { "TITLE": "Y Junction" },
//!   "PAGE": "index.html",
//!   "SERIAL": "/dev/ttyUSB0"
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use traffic_core::WEBSOCKET_GUID;

/// Port used when the configuration does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// `SERIAL` value that selects the built-in junction simulator.
pub const SIMULATED_SERIAL: &str = "simulated";

/// Required length of a WebSocket GUID (8-4-4-4-12 hex plus dashes).
const GUID_LEN: usize = 36;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `SSID` or `PASSWORD` is missing or empty.
    #[error("Wi-Fi credentials not found or incomplete")]
    MissingCredentials,

    /// `PORT` is outside 1..=65535.
    #[error("invalid port {0}: must be between 1 and 65535")]
    InvalidPort(i64),

    /// `ESP_IP` is not an IP address.
    #[error("invalid ESP_IP '{0}': not an IP address")]
    InvalidBindIp(String),

    /// `WEBSOCKET_GUID` does not have the protocol's fixed length.
    #[error("invalid WEBSOCKET_GUID: expected 36 characters, got {0}")]
    InvalidGuid(usize),

    /// The configuration file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

// ── Raw settings ──────────────────────────────────────────────────────────────

/// The configuration file as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "SSID", default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,

    #[serde(rename = "PASSWORD", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Kept wide so that out-of-range values are reported as
    /// [`ConfigError::InvalidPort`] rather than as a parse error.
    #[serde(rename = "PORT", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,

    #[serde(rename = "ESP_IP", default, skip_serializing_if = "Option::is_none")]
    pub esp_ip: Option<String>,

    #[serde(rename = "WEBSOCKET_GUID", default, skip_serializing_if = "Option::is_none")]
    pub websocket_guid: Option<String>,

    /// Extra `{{KEY}}` values for the page template.
    #[serde(rename = "TEMPLATE", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub template: BTreeMap<String, String>,

    /// Path of an HTML template to serve instead of the built-in page.
    #[serde(rename = "PAGE", default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PathBuf>,

    /// Serial device path, or `"simulated"`.
    #[serde(rename = "SERIAL", default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

// ── Validated configuration ───────────────────────────────────────────────────

/// Network credentials handed to the association provider.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the listener binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    pub bind_ip: IpAddr,
    pub port: u16,
}

impl ListenConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

/// Which serial source feeds the state reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialSelection {
    /// Read chunks from a device node or FIFO.
    Device(PathBuf),
    /// Run the built-in Y-junction simulator.
    Simulated,
    /// No source; every state request reports "no data".
    Disabled,
}

impl SerialSelection {
    fn from_setting(value: Option<String>) -> Self {
        match value {
            Some(v) if v == SIMULATED_SERIAL => SerialSelection::Simulated,
            Some(v) if !v.trim().is_empty() => SerialSelection::Device(PathBuf::from(v)),
            _ => SerialSelection::Disabled,
        }
    }
}

/// All runtime configuration, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub credentials: WifiCredentials,
    pub listen: ListenConfig,
    /// GUID appended to client keys during the handshake.
    pub websocket_guid: String,
    /// Values substituted into the page template, keyed by placeholder name.
    pub template_values: BTreeMap<String, String>,
    /// Optional on-disk page template.
    pub page_path: Option<PathBuf>,
    pub serial: SerialSelection,
}

impl ServerConfig {
    /// Validates raw settings and fills in defaults.
    ///
    /// | Key              | Default                                |
    /// |------------------|----------------------------------------|
    /// | `PORT`           | `80`                                   |
    /// | `ESP_IP`         | `0.0.0.0`                              |
    /// | `WEBSOCKET_GUID` | `258EAFA5-E914-47DA-95CA-C5AB0DC85B11` |
    /// | `SERIAL`         | disabled                               |
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingCredentials`] if `SSID` or `PASSWORD` is absent
    ///   or empty.
    /// - [`ConfigError::InvalidPort`], [`ConfigError::InvalidBindIp`] or
    ///   [`ConfigError::InvalidGuid`] for malformed values.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let ssid = settings.ssid.filter(|s| !s.is_empty());
        let password = settings.password.filter(|p| !p.is_empty());
        let (Some(ssid), Some(password)) = (ssid, password) else {
            return Err(ConfigError::MissingCredentials);
        };

        let raw_port = settings.port.unwrap_or(i64::from(DEFAULT_PORT));
        let port = u16::try_from(raw_port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ConfigError::InvalidPort(raw_port))?;

        let bind_ip = match settings.esp_ip {
            Some(ip) => ip.parse::<IpAddr>().map_err(|_| ConfigError::InvalidBindIp(ip))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let websocket_guid = settings
            .websocket_guid
            .unwrap_or_else(|| WEBSOCKET_GUID.to_string());
        let guid_len = websocket_guid.chars().count();
        if guid_len != GUID_LEN {
            return Err(ConfigError::InvalidGuid(guid_len));
        }

        Ok(Self {
            credentials: WifiCredentials { ssid, password },
            listen: ListenConfig { bind_ip, port },
            websocket_guid,
            template_values: settings.template,
            page_path: settings.page,
            serial: SerialSelection::from_setting(settings.serial),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
