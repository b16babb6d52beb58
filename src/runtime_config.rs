//! # Runtime Configuration Module
//!
//! Tunables for body streaming, size limits, handler timeouts and media type
//! matching.
//!
//! ## Sources
//!
//! - [`RuntimeConfig::from_env`] reads `BRRTD_*` environment variables
//! - [`RuntimeConfig::load`] reads a YAML, JSON or TOML file, chosen by extension
//!
//! Missing settings keep their defaults.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `BRRTD_BODY_QUEUE_BOUND` | `body_queue_bound` | `16` chunks |
//! | `BRRTD_BLOCKING_CHUNK_SIZE` | `blocking_chunk_size` | `0x2000` (8 KB) |
//! | `BRRTD_MAX_BODY_BYTES` | `max_body_bytes` | unlimited |
//! | `BRRTD_HANDLER_TIMEOUT_MS` | `handler_timeout_ms` | none |
//! | `BRRTD_CHARSET_MATCHING` | `charset_matching` | `strict` |
//!
//! Sizes accept decimal (`8192`) or hexadecimal (`0x2000`). Unparseable values are
//! logged and ignored.
//!
//! ## Usage
//!
//! ```rust
//! use brrtdispatch::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env_with(|key| match key {
//!     "BRRTD_MAX_BODY_BYTES" => Some("0x100000".to_string()),
//!     _ => None,
//! });
//! assert_eq!(config.max_body_bytes, Some(1024 * 1024));
//! assert_eq!(config.body_queue_bound, 16);
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::body::{Body, BodySender, DEFAULT_CHUNK_SIZE};
use crate::media::CharsetMatching;

/// Default number of chunks a fed body queues before the producer waits
pub const DEFAULT_BODY_QUEUE_BOUND: usize = 16;

/// Dispatcher and body tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Chunks a fed body buffers before [`BodySender::send`] waits
    pub body_queue_bound: usize,
    /// Bytes per read for blocking-reader bodies
    pub blocking_chunk_size: usize,
    /// Largest request body a handler may drain; `None` is unlimited
    pub max_body_bytes: Option<usize>,
    /// Handler time limit in milliseconds; `None` waits forever
    pub handler_timeout_ms: Option<u64>,
    /// Whether charsets take part in negotiation
    pub charset_matching: CharsetMatching,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            body_queue_bound: DEFAULT_BODY_QUEUE_BOUND,
            blocking_chunk_size: DEFAULT_CHUNK_SIZE,
            max_body_bytes: None,
            handler_timeout_ms: None,
            charset_matching: CharsetMatching::Strict,
        }
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal size
fn parse_size(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn env_size(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    let parsed = parse_size(&raw);
    if parsed.is_none() {
        warn!(variable = key, value = %raw, "Ignoring unparseable size");
    }
    parsed
}

fn to_usize(value: u64) -> Option<usize> {
    usize::try_from(value).ok()
}

impl RuntimeConfig {
    /// Load configuration from `BRRTD_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bound) = env_size(&lookup, "BRRTD_BODY_QUEUE_BOUND").and_then(to_usize) {
            config.body_queue_bound = bound;
        }
        if let Some(chunk) = env_size(&lookup, "BRRTD_BLOCKING_CHUNK_SIZE").and_then(to_usize) {
            config.blocking_chunk_size = chunk;
        }
        if let Some(max) = env_size(&lookup, "BRRTD_MAX_BODY_BYTES").and_then(to_usize) {
            config.max_body_bytes = Some(max);
        }
        if let Some(timeout) = env_size(&lookup, "BRRTD_HANDLER_TIMEOUT_MS") {
            config.handler_timeout_ms = Some(timeout);
        }
        if let Some(raw) = lookup("BRRTD_CHARSET_MATCHING") {
            match CharsetMatching::parse(&raw) {
                Some(matching) => config.charset_matching = matching,
                None => warn!(value = %raw, "Ignoring unknown BRRTD_CHARSET_MATCHING"),
            }
        }

        config
    }

    /// Load configuration from a `.yaml`/`.yml`, `.json` or `.toml` file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, has an unknown extension, or does not
    /// deserialize.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let config: RuntimeConfig = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&text)
                .with_context(|| format!("invalid YAML in {}", path.display()))?,
            "json" => serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in {}", path.display()))?,
            "toml" => toml::from_str(&text)
                .with_context(|| format!("invalid TOML in {}", path.display()))?,
            other => bail!(
                "unsupported config extension '{other}' for {}",
                path.display()
            ),
        };

        info!(
            path = %path.display(),
            body_queue_bound = config.body_queue_bound,
            max_body_bytes = ?config.max_body_bytes,
            handler_timeout_ms = ?config.handler_timeout_ms,
            "Runtime configuration loaded"
        );
        Ok(config)
    }

    /// Handler time limit, if configured
    #[must_use]
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }

    /// A fed body using the configured queue bound
    #[must_use]
    pub fn body_channel(&self, content_length: Option<u64>) -> (BodySender, Body) {
        Body::channel(content_length, self.body_queue_bound)
    }

    /// A blocking-reader body using the configured chunk size
    pub fn body_from_reader<R>(&self, reader: R, content_length: Option<u64>) -> Body
    where
        R: Read + Send + 'static,
    {
        Body::from_reader(reader, content_length, self.blocking_chunk_size)
    }
}
