//! Network association before the listener is bound.
//!
//! On the board this is the Wi-Fi station join; on a host the operating
//! system already owns the network, so [`HostNetworkLink`] associates
//! immediately and reports the configured bind address.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::WifiCredentials;

/// Upper bound on how long [`associate`] waits.
pub const ASSOCIATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between association checks.
pub const ASSOCIATION_POLL: Duration = Duration::from_secs(1);

/// Error type for network association.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("failed to join network '{ssid}' within {waited:?}")]
    Timeout { ssid: String, waited: Duration },
}

/// A network interface that can be asked to join a network.
pub trait NetworkLink: Send {
    /// Starts joining the network named in `credentials`.  Must not block.
    fn begin(&mut self, credentials: &WifiCredentials);

    /// Reports whether the link is up.
    fn is_associated(&mut self) -> bool;

    /// The address the link obtained.
    fn address(&self) -> IpAddr;
}

/// Host networking: always up, address taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct HostNetworkLink {
    address: IpAddr,
    started: bool,
}

impl HostNetworkLink {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            started: false,
        }
    }
}

impl NetworkLink for HostNetworkLink {
    fn begin(&mut self, credentials: &WifiCredentials) {
        debug!(
            "host network in use; SSID '{}' is not joined explicitly",
            credentials.ssid
        );
        self.started = true;
    }

    fn is_associated(&mut self) -> bool {
        self.started
    }

    fn address(&self) -> IpAddr {
        self.address
    }
}

/// Joins the network and waits until `link` reports association, checking
/// every `poll` for at most `timeout`.
///
/// # Errors
///
/// Returns [`LinkError::Timeout`] if the link is still down after `timeout`.
pub async fn associate(
    link: &mut dyn NetworkLink,
    credentials: &WifiCredentials,
    timeout: Duration,
    poll: Duration,
) -> Result<IpAddr, LinkError> {
    link.begin(credentials);

    let mut waited = Duration::ZERO;
    while !link.is_associated() {
        if waited >= timeout {
            return Err(LinkError::Timeout {
                ssid: credentials.ssid.clone(),
                waited,
            });
        }
        info!("waiting for network '{}'...", credentials.ssid);
        tokio::time::sleep(poll).await;
        waited += poll;
    }

    let address = link.address();
    info!("network up, address {address}");
    Ok(address)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
