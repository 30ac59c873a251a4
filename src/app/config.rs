use crate::bridge::{DEFAULT_PORT, RemoteEndpoint, SenderConfig};
use crate::domain::LogCategory;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the bridge's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about = "Receives bridged log entries, prints and relays them", long_about = None)]
pub struct Config {
    /// Port the receiver listens on
    #[arg(long, env = "BRIDGE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Relay received entries to host:port (repeatable or comma separated)
    #[arg(long = "relay", env = "BRIDGE_RELAY", value_delimiter = ',')]
    pub relays: Vec<String>,

    /// Least severe category that is still printed
    #[arg(long, env = "BRIDGE_MIN_CATEGORY", default_value = "trace")]
    pub min_category: LogCategory,

    /// Log level of the bridge's own diagnostics
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Diagnostics format (json or text)
    #[arg(long, env = "RUST_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Relay request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent relay requests
    #[arg(long, env = "MAX_IN_FLIGHT", default_value = "256")]
    pub max_in_flight: usize,

    /// TOML file whose values replace the flags above
    #[serde(skip)]
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            relays: Vec::new(),
            min_category: LogCategory::Trace,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            request_timeout_secs: 30,
            max_in_flight: 256,
            config_file: None,
        }
    }
}

/// Keys a config file may set. Absent keys leave the current value alone.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOverrides {
    port: Option<u16>,
    relays: Option<Vec<String>>,
    min_category: Option<LogCategory>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
    request_timeout_secs: Option<u64>,
    max_in_flight: Option<usize>,
}

impl Config {
    /// Parses flags and environment, then applies `--config-file` if given.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?
            .finish()
    }

    /// Like [`from_args`](Self::from_args) on the process arguments, but
    /// lets clap print help, version and usage errors and exit.
    pub fn load() -> Result<Self, ConfigError> {
        Config::parse().finish()
    }

    fn finish(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = self.config_file.clone() {
            self.merge_file(&path)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Defaults overridden by the file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.merge_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: FileOverrides = toml::from_str(&content)?;

        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(relays) = file.relays {
            self.relays = relays;
        }
        if let Some(min_category) = file.min_category {
            self.min_category = min_category;
        }
        if let Some(log_level) = file.log_level {
            self.log_level = log_level;
        }
        if let Some(log_format) = file.log_format {
            self.log_format = log_format;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(max) = file.max_in_flight {
            self.max_in_flight = max;
        }
        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.port)?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_in_flight == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max in-flight requests must be greater than 0".to_string(),
            ));
        }

        self.relay_endpoints()?;
        Ok(())
    }

    pub fn relay_endpoints(&self) -> Result<Vec<RemoteEndpoint>, ConfigError> {
        self.relays
            .iter()
            .filter(|relay| !relay.trim().is_empty())
            .map(|relay| {
                relay.parse::<RemoteEndpoint>().map_err(|e| {
                    ConfigError::InvalidConfig(format!("Invalid relay '{relay}': {e}"))
                })
            })
            .collect()
    }

    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_in_flight: self.max_in_flight,
            ..SenderConfig::default()
        }
    }
}

fn validate_port(port: u16) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::InvalidConfig(
            "Port must be between 1 and 65535".to_string(),
        ));
    }
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validate_port() {
        assert!(validate_port(0).is_err());
        assert_eq!(validate_port(1).unwrap(), 1);
        assert_eq!(validate_port(5979).unwrap(), 5979);
        assert_eq!(validate_port(65535).unwrap(), 65535);
    }

    #[test]
    #[serial]
    fn test_defaults_from_empty_args() {
        let config = Config::from_args(["rask-log-bridge"]).unwrap();
        assert_eq!(config.port, 5979);
        assert!(config.relays.is_empty());
        assert_eq!(config.min_category, LogCategory::Trace);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.max_in_flight, 256);
    }

    #[test]
    #[serial]
    fn test_relays_accept_repeats_and_commas() {
        let config = Config::from_args([
            "rask-log-bridge",
            "--relay",
            "a.local:7000,b.local",
            "--relay",
            "[::1]:7001",
        ])
        .unwrap();

        let endpoints = config.relay_endpoints().unwrap();
        let rendered: Vec<String> = endpoints.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["a.local:7000", "b.local:5979", "::1:7001"]);
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_args(["rask-log-bridge", "--port", "0"]).is_err());
        assert!(Config::from_args(["rask-log-bridge", "--relay", "host:0"]).is_err());
        assert!(Config::from_args(["rask-log-bridge", "--max-in-flight", "0"]).is_err());
        assert!(Config::from_args(["rask-log-bridge", "--min-category", "loud"]).is_err());
    }

    #[test]
    #[serial]
    fn test_file_values_replace_flags() {
        let file = config_file(
            r#"
port = 6100
relays = ["collector.local:6200"]
min_category = "warning"
log_format = "json"
"#,
        );
        let path = file.path().to_str().unwrap();

        let config = Config::from_args([
            "rask-log-bridge",
            "--port",
            "6000",
            "--max-in-flight",
            "32",
            "--config-file",
            path,
        ])
        .unwrap();

        assert_eq!(config.port, 6100);
        assert_eq!(config.relays, vec!["collector.local:6200".to_string()]);
        assert_eq!(config.min_category, LogCategory::Warning);
        assert_eq!(config.log_format, LogFormat::Json);
        // Not in the file, so the flag survives
        assert_eq!(config.max_in_flight, 32);
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let file = config_file("prot = 6100\n");
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_a_file_error() {
        assert!(matches!(
            Config::from_file("/nonexistent/rask-log-bridge.toml"),
            Err(ConfigError::FileError(_))
        ));
    }

    #[test]
    fn test_sender_config_carries_limits() {
        let config = Config {
            request_timeout_secs: 5,
            max_in_flight: 8,
            ..Config::default()
        };
        let sender = config.sender_config();
        assert_eq!(sender.request_timeout, Duration::from_secs(5));
        assert_eq!(sender.max_in_flight, 8);
    }
}
