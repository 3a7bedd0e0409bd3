//! Traffic-state endpoint: entry point.
//!
//! Serves the current Y-junction state read from a serial link as JSON on
//! `GET /traffic_state`, a cached HTML page on every other path, and a raw
//! byte echo to clients that send a `Sec-WebSocket-Key`.
//!
//! # Usage
//!
//! ```text
//! traffic-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>       Settings file (.json or .toml) [default: secrets.json]
//!   --port <PORT>         Overrides PORT from the settings file
//!   --bind <IP>           Overrides ESP_IP from the settings file
//!   --serial <PATH>       Serial device, or "simulated"; overrides SERIAL
//!   --log-level <LEVEL>   Used when RUST_LOG is unset [default: info]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable         | Flag          |
//! |------------------|---------------|
//! | `TRAFFIC_CONFIG` | `--config`    |
//! | `TRAFFIC_PORT`   | `--port`      |
//! | `TRAFFIC_BIND`   | `--bind`      |
//! | `TRAFFIC_SERIAL` | `--serial`    |
//! | `TRAFFIC_LOG`    | `--log-level` |
//!
//! CLI args take precedence over the environment, which takes precedence over
//! the settings file.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use traffic_server::application::{template_values, CachedPage, RequestRouter, SensorStateReader};
use traffic_server::domain::{ServerConfig, Settings};
use traffic_server::infrastructure::network::{ASSOCIATION_POLL, ASSOCIATION_TIMEOUT};
use traffic_server::infrastructure::{
    associate, load_page_template, load_settings, open_serial_or_null, run_server,
    HostNetworkLink, TrafficServer,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Traffic-state endpoint for a Y-junction controller.
#[derive(Debug, Parser)]
#[command(
    name = "traffic-server",
    about = "HTTP/WebSocket endpoint exposing traffic-light state read from a serial link",
    version
)]
struct Cli {
    /// Settings file with SSID, PASSWORD and optional PORT, ESP_IP, ...
    ///
    /// Files ending in `.toml` are read as TOML, everything else as JSON.
    #[arg(long, default_value = "secrets.json", env = "TRAFFIC_CONFIG")]
    config: PathBuf,

    /// TCP port to listen on.
    #[arg(long, env = "TRAFFIC_PORT")]
    port: Option<u16>,

    /// IP address to bind to (`0.0.0.0` for all interfaces).
    #[arg(long, env = "TRAFFIC_BIND")]
    bind: Option<String>,

    /// Serial device path, or `simulated` for the built-in junction.
    #[arg(long, env = "TRAFFIC_SERIAL")]
    serial: Option<String>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info", env = "TRAFFIC_LOG")]
    log_level: String,
}

impl Cli {
    /// Writes every flag that was given over the matching settings key.
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.port = Some(i64::from(port));
        }
        if let Some(bind) = &self.bind {
            settings.esp_ip = Some(bind.clone());
        }
        if let Some(serial) = &self.serial {
            settings.serial = Some(serial.clone());
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// # What happens at startup
///
/// 1. CLI arguments are parsed and logging is initialised.
/// 2. The settings file is loaded, overridden by the CLI, and validated.
///    Missing Wi-Fi credentials stop the process here.
/// 3. The network link is associated (at most 10 s).
/// 4. The page template is rendered once and cached.
/// 5. The serial source is opened.
/// 6. A Ctrl+C handler is installed and the accept loop runs until it fires.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let mut settings = load_settings(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    cli.apply_overrides(&mut settings);

    let config = match ServerConfig::from_settings(settings) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Err(e).context("invalid configuration");
        }
    };

    info!(
        "traffic-server starting: ssid={}, listen={}, serial={:?}",
        config.credentials.ssid,
        config.listen.socket_addr(),
        config.serial
    );

    // ── Network ───────────────────────────────────────────────────────────────
    let mut link = HostNetworkLink::new(config.listen.bind_ip);
    associate(
        &mut link,
        &config.credentials,
        ASSOCIATION_TIMEOUT,
        ASSOCIATION_POLL,
    )
    .await
    .context("network association failed")?;

    // ── Page, serial, server state ────────────────────────────────────────────
    let template = load_page_template(config.page_path.as_deref())?;
    let page = CachedPage::render(&template, &template_values(&config));
    info!("cached page ready ({} bytes)", page.len());

    let sensor = SensorStateReader::new(open_serial_or_null(&config.serial));
    let server = TrafficServer::new(
        config.websocket_guid.clone(),
        RequestRouter::new(page),
        sensor,
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; stopping after the current connection");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(config.listen, server, running).await?;

    info!("traffic-server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
