//! # Configuration Management
//!
//! Where to connect, whether to use TLS, how fast outbound lines may go, and
//! how to log.
//!
//! Every field has a default, so a file only needs the keys it changes.
//! [`Config::from_file`] layers `LINEWIRE_*` environment variables over the
//! file and refuses a configuration that fails [`Config::validate`].
//! Durations are written as milliseconds.
//!
//! ## Example
//! ```toml
//! [client]
//! host = "irc.libera.chat"
//! port = 6697
//! tls = true
//! flood_delay = 500
//!
//! [logging]
//! filter = "linewire=debug,info"
//! format = "json"
//! ```
//!
//! ## Environment
//! | Variable | Field |
//! |---|---|
//! | `LINEWIRE_HOST` | `client.host` |
//! | `LINEWIRE_PORT` | `client.port` |
//! | `LINEWIRE_TLS` | `client.tls` |
//! | `LINEWIRE_SERVER_NAME` | `client.server_name` |
//! | `LINEWIRE_CONNECT_TIMEOUT_MS` | `client.connect_timeout` |
//! | `LINEWIRE_FLOOD_DELAY_MS` | `client.flood_delay` |
//! | `LINEWIRE_LOG` | `logging.filter` |
//! | `LINEWIRE_LOG_FORMAT` | `logging.format` |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::error::{ProtocolError, Result};
use crate::utils::flood::FloodProtector;
use crate::utils::timeout::{DEFAULT_FLOOD_DELAY, DEFAULT_TIMEOUT};

/// Default plaintext port for IRC-style servers
pub const DEFAULT_PORT: u16 = 6667;

const MIN_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_FLOOD_DELAY: Duration = Duration::from_secs(60);

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse TOML; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Invalid TOML: {e}")))
    }

    /// Read a TOML file, apply `LINEWIRE_*` overrides, then validate.
    ///
    /// Warnings are logged, errors reject the whole configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::ConfigError(format!("Cannot read {}: {e}", path.display()))
        })?;

        let mut config = Self::from_toml(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    /// Defaults with `LINEWIRE_*` overrides applied, then validated
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Unparseable values are errors rather than silently skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = &mut self.client;
        if let Some(host) = lookup("LINEWIRE_HOST") {
            client.host = host;
        }
        if let Some(port) = lookup("LINEWIRE_PORT") {
            client.port = parse_var("LINEWIRE_PORT", &port)?;
        }
        if let Some(tls) = lookup("LINEWIRE_TLS") {
            client.tls = parse_var("LINEWIRE_TLS", &tls)?;
        }
        if let Some(name) = lookup("LINEWIRE_SERVER_NAME") {
            client.server_name = Some(name);
        }
        if let Some(ms) = lookup("LINEWIRE_CONNECT_TIMEOUT_MS") {
            client.connect_timeout =
                Duration::from_millis(parse_var("LINEWIRE_CONNECT_TIMEOUT_MS", &ms)?);
        }
        if let Some(ms) = lookup("LINEWIRE_FLOOD_DELAY_MS") {
            client.flood_delay = Duration::from_millis(parse_var("LINEWIRE_FLOOD_DELAY_MS", &ms)?);
        }

        if let Some(filter) = lookup("LINEWIRE_LOG") {
            self.logging.filter = filter;
        }
        if let Some(format) = lookup("LINEWIRE_LOG_FORMAT") {
            self.logging.format = parse_var("LINEWIRE_LOG_FORMAT", &format)?;
        }
        Ok(())
    }

    /// Problems that make the configuration unusable. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = self.client.validate();
        errors.extend(self.logging.validate());
        errors
    }

    /// Settings that are accepted but probably not what was meant
    pub fn warnings(&self) -> Vec<String> {
        self.client.warnings()
    }

    /// Fail on any validation error and log the warnings
    pub fn check(&self) -> Result<()> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(ProtocolError::ConfigError(errors.join("; ")));
        }
        for warning in self.warnings() {
            warn!("{warning}");
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ProtocolError::ConfigError(format!("{name}: cannot parse '{value}'")))
}

/// Connection settings for one session
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,

    /// Name to verify the server certificate against, when it is not `host`
    pub server_name: Option<String>,

    /// Accept any server certificate (development only)
    pub insecure: bool,

    /// Extra PEM roots trusted alongside the system store
    pub ca_file: Option<String>,

    /// PEM certificate chain and key presented to the server
    pub client_cert: Option<String>,
    pub client_key: Option<String>,

    /// Bound on TCP connect plus TLS handshake
    #[serde(with = "millis")]
    pub connect_timeout: Duration,

    /// Minimum gap between outbound lines; zero turns throttling off
    #[serde(with = "millis")]
    pub flood_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            tls: false,
            server_name: None,
            insecure: false,
            ca_file: None,
            client_cert: None,
            client_key: None,
            connect_timeout: DEFAULT_TIMEOUT,
            flood_delay: DEFAULT_FLOOD_DELAY,
        }
    }
}

impl ClientConfig {
    /// A fresh protector for one session, or `None` when throttling is off
    pub fn flood_protector(&self) -> Option<Arc<FloodProtector>> {
        (!self.flood_delay.is_zero()).then(|| Arc::new(FloodProtector::new(self.flood_delay)))
    }

    /// Name presented for TLS verification
    pub fn tls_server_name(&self) -> &str {
        self.server_name.as_deref().unwrap_or(&self.host)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("client.host is empty".to_string());
        } else if self.host.contains(char::is_whitespace) {
            errors.push(format!("client.host contains whitespace: '{}'", self.host));
        }

        if self.port == 0 {
            errors.push("client.port must be non-zero".to_string());
        }

        if self.connect_timeout < MIN_CONNECT_TIMEOUT {
            errors.push(format!(
                "client.connect_timeout below {}ms",
                MIN_CONNECT_TIMEOUT.as_millis()
            ));
        } else if self.connect_timeout > MAX_CONNECT_TIMEOUT {
            errors.push(format!(
                "client.connect_timeout above {}s",
                MAX_CONNECT_TIMEOUT.as_secs()
            ));
        }

        if self.flood_delay > MAX_FLOOD_DELAY {
            errors.push(format!(
                "client.flood_delay above {}s",
                MAX_FLOOD_DELAY.as_secs()
            ));
        }

        if matches!(&self.server_name, Some(name) if name.trim().is_empty()) {
            errors.push("client.server_name is set but empty".to_string());
        }

        if self.client_cert.is_some() != self.client_key.is_some() {
            errors.push("client.client_cert and client.client_key go together".to_string());
        }

        errors
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.tls {
            return warnings;
        }

        let tls_only = [
            ("insecure", self.insecure),
            ("server_name", self.server_name.is_some()),
            ("ca_file", self.ca_file.is_some()),
            ("client_cert", self.client_cert.is_some()),
        ];
        for (field, set) in tls_only {
            if set {
                warnings.push(format!("client.{field} has no effect while client.tls is off"));
            }
        }
        warnings
    }
}

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Settings for [`init_logging`](crate::utils::logging::init_logging)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info` or `linewire=trace,warn`
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Vec<String> {
        match EnvFilter::try_new(&self.filter) {
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("logging.filter '{}' is invalid: {e}", self.filter)],
        }
    }
}

/// `Duration` as a whole number of milliseconds
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
