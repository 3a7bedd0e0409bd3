//! The cached HTML page served for every request that is not
//! `/traffic_state`.
//!
//! The page is rendered once at startup from a template with `{{KEY}}`
//! placeholders and then served verbatim for the lifetime of the process.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::ServerConfig;

/// Page served when the configuration does not name a template file.
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"
        <html>
            <head><title>ESP32 Web Server</title></head>
            <body><h1>Hello from ESP32</h1></body>
        </html>
    "#;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Immutable page bytes, produced once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    bytes: Vec<u8>,
}

impl CachedPage {
    /// Renders `template` with `values` and freezes the result.
    pub fn render(template: &str, values: &BTreeMap<String, String>) -> Self {
        Self {
            bytes: render_template(template, values).into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Placeholder values for `config`: the built-ins `PORT` and `ESP_IP`,
/// overridden by anything in the `TEMPLATE` table.
pub fn template_values(config: &ServerConfig) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert("PORT".to_string(), config.listen.port.to_string());
    values.insert("ESP_IP".to_string(), config.listen.bind_ip.to_string());
    values.extend(
        config
            .template_values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    values
}

/// Replaces every `{{KEY}}` in `template` whose key is in `values`.
///
/// Whitespace inside the braces is ignored (`{{ PORT }}` works).  Unknown
/// placeholders and an unterminated `{{` are copied through unchanged.
pub fn render_template(template: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after_open[..end].trim();
        match values.get(key) {
            Some(value) => out.push_str(value),
            None => {
                debug!("no value for page placeholder '{key}'; left as is");
                out.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]);
            }
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    out.push_str(rest);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
