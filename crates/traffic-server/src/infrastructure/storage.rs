//! Reads the settings file and the optional page template from disk.
//!
//! The settings format is chosen by extension: `.toml` files are parsed as
//! TOML, everything else (including the default `secrets.json`) as JSON.

use std::path::Path;

use tracing::{debug, info};

use crate::application::DEFAULT_PAGE_TEMPLATE;
use crate::domain::{ConfigError, Settings};

/// Loads [`Settings`] from `path`.
///
/// # Errors
///
/// - [`ConfigError::Io`] if the file cannot be read.
/// - [`ConfigError::Json`] / [`ConfigError::Toml`] if it does not parse.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let settings = if is_toml {
        toml::from_str(&text)?
    } else {
        serde_json::from_str(&text)?
    };
    debug!("loaded settings from {}", path.display());
    Ok(settings)
}

/// Returns the page template at `path`, or the built-in page if `path` is
/// `None`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if a configured template cannot be read.
pub fn load_page_template(path: Option<&Path>) -> Result<String, ConfigError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!("serving page template {}", path.display());
            Ok(text)
        }
        None => Ok(DEFAULT_PAGE_TEMPLATE.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
