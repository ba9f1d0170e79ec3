use super::installer::InstallConfig;
use crate::cache::{MemoryStorage, Storage, StorageError};
use crate::channel::{ChannelConfig, FixedStreamName, HostnameStream, StreamNameResolver};
use crate::domain::Level;
use crate::sender::HttpTransportConfig;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Argument error: {0}")]
    Cli(#[from] clap::Error),
}

/// Verbosity of the shipper's own diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TracingLevel::Error => "error",
            TracingLevel::Warn => "warn",
            TracingLevel::Info => "info",
            TracingLevel::Debug => "debug",
            TracingLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

const DEFAULT_ENDPOINT: &str = "https://logs.us-east-1.amazonaws.com/";
const DEFAULT_LOG_GROUP: &str = "rask-log-shipper";
const DEFAULT_CHANNEL: &str = "default";

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Log sink endpoint URL
    #[arg(long, env = "LOGS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Destination log group
    #[arg(long, env = "LOG_GROUP_NAME", default_value = DEFAULT_LOG_GROUP)]
    pub log_group_name: String,

    /// Fixed log stream name (defaults to `<hostname>-<uuid>`)
    #[arg(long, env = "LOG_STREAM_NAME")]
    pub log_stream_name: Option<String>,

    /// Channel name, also the cache namespace for its stream state
    #[arg(long, env = "CHANNEL_NAME", default_value = DEFAULT_CHANNEL)]
    pub channel_name: String,

    /// Delivery interval in milliseconds
    #[arg(long, env = "DELIVERY_INTERVAL_MS", default_value = "3000")]
    pub interval_ms: u64,

    /// Levels to create sources for
    #[arg(
        long,
        env = "SOURCE_LEVELS",
        value_delimiter = ',',
        default_value = "debug,info,log,warn,error"
    )]
    pub levels: Vec<Level>,

    /// Level stdin lines are shipped at
    #[arg(long, env = "MESSAGE_LEVEL", default_value = "info")]
    pub message_level: Level,

    /// Shipper diagnostics level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: TracingLevel,

    /// Shipper diagnostics format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Ship tracing events from other crates as console messages
    #[arg(long, env = "CAPTURE_TRACING")]
    pub capture_tracing: bool,

    /// Ship panics as uncaught errors
    #[arg(long, env = "CAPTURE_PANICS")]
    pub capture_panics: bool,

    /// Persist stream name and sequence token at this path
    #[arg(long, env = "STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "CONNECTION_TIMEOUT_SECS", default_value = "10")]
    pub connection_timeout_secs: u64,

    /// Enable gzip for HTTP responses
    #[arg(long, env = "ENABLE_COMPRESSION")]
    pub enable_compression: bool,

    /// Upper bound on the final delivery at shutdown, in milliseconds
    #[arg(long, env = "SHUTDOWN_TIMEOUT_MS", default_value = "5000")]
    pub shutdown_timeout_ms: u64,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub interval: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub connection_timeout: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            log_group_name: DEFAULT_LOG_GROUP.to_string(),
            log_stream_name: None,
            channel_name: DEFAULT_CHANNEL.to_string(),
            interval_ms: 3000,
            levels: Level::ALL.to_vec(),
            message_level: Level::Info,
            log_level: TracingLevel::Info,
            log_format: LogFormat::Compact,
            capture_tracing: false,
            capture_panics: false,
            storage_path: None,
            request_timeout_secs: 30,
            connection_timeout_secs: 10,
            enable_compression: false,
            shutdown_timeout_ms: 5000,
            config_file: None,
            interval: Duration::from_millis(3000),
            request_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// CLI arguments with env fallbacks. A `--config-file` supplies values for every
    /// field left at its default on the command line.
    ///
    /// Bad arguments, `--help` and `--version` come back as `ConfigError::Cli`.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::try_parse_from(args)?;
        if let Some(path) = config.config_file.clone() {
            let content = std::fs::read_to_string(path)?;
            let file_config: Config = toml::from_str(&content)?;
            config.merge_defaults_from(file_config);
        }
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_defaults_from(&mut self, base: Config) {
        let defaults = Config::default();

        if self.endpoint == defaults.endpoint {
            self.endpoint = base.endpoint;
        }
        if self.log_group_name == defaults.log_group_name {
            self.log_group_name = base.log_group_name;
        }
        if self.log_stream_name.is_none() {
            self.log_stream_name = base.log_stream_name;
        }
        if self.channel_name == defaults.channel_name {
            self.channel_name = base.channel_name;
        }
        if self.interval_ms == defaults.interval_ms {
            self.interval_ms = base.interval_ms;
        }
        if self.levels == defaults.levels {
            self.levels = base.levels;
        }
        if self.message_level == defaults.message_level {
            self.message_level = base.message_level;
        }
        if self.log_level == defaults.log_level {
            self.log_level = base.log_level;
        }
        if self.log_format == defaults.log_format {
            self.log_format = base.log_format;
        }
        self.capture_tracing |= base.capture_tracing;
        self.capture_panics |= base.capture_panics;
        if self.storage_path.is_none() {
            self.storage_path = base.storage_path;
        }
        if self.request_timeout_secs == defaults.request_timeout_secs {
            self.request_timeout_secs = base.request_timeout_secs;
        }
        if self.connection_timeout_secs == defaults.connection_timeout_secs {
            self.connection_timeout_secs = base.connection_timeout_secs;
        }
        self.enable_compression |= base.enable_compression;
        if self.shutdown_timeout_ms == defaults.shutdown_timeout_ms {
            self.shutdown_timeout_ms = base.shutdown_timeout_ms;
        }
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.interval = Duration::from_millis(self.interval_ms);
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);
        self.connection_timeout = Duration::from_secs(self.connection_timeout_secs);
        self.shutdown_timeout = Duration::from_millis(self.shutdown_timeout_ms);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.log_group_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Log group name must not be empty".to_string(),
            ));
        }
        if self.channel_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Channel name must not be empty".to_string(),
            ));
        }
        if self
            .log_stream_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ConfigError::InvalidConfig(
                "Log stream name must not be empty when set".to_string(),
            ));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "Delivery interval must be greater than 0".to_string(),
            ));
        }
        if self.levels.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one source level is required".to_string(),
            ));
        }
        if !self.levels.contains(&self.message_level) {
            return Err(ConfigError::InvalidConfig(format!(
                "Message level '{}' has no source (levels: {:?})",
                self.message_level, self.levels
            )));
        }
        if self.request_timeout_secs == 0 || self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn stream_name_resolver(&self) -> Arc<dyn StreamNameResolver> {
        match &self.log_stream_name {
            Some(name) => Arc::new(FixedStreamName(name.clone())),
            None => Arc::new(HostnameStream::new()),
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            log_group_name: self.log_group_name.clone(),
            stream_name_resolver: self.stream_name_resolver(),
            interval: self.interval,
        }
    }

    pub fn http_transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            endpoint: self.endpoint.clone(),
            timeout: self.request_timeout,
            connection_timeout: self.connection_timeout,
            enable_compression: self.enable_compression,
            ..HttpTransportConfig::default()
        }
    }

    /// Sled at `storage_path` when set, otherwise process memory.
    pub fn storage(&self) -> Result<Arc<dyn Storage>, StorageError> {
        match &self.storage_path {
            #[cfg(feature = "sled-storage")]
            Some(path) => Ok(Arc::new(crate::cache::SledStorage::open(path)?)),
            #[cfg(not(feature = "sled-storage"))]
            Some(path) => Err(StorageError::Backend(format!(
                "persistent storage at {} requires the sled-storage feature",
                path.display()
            ))),
            None => Ok(Arc::new(MemoryStorage::new())),
        }
    }

    pub fn install_config(&self, storage: Arc<dyn Storage>) -> InstallConfig {
        InstallConfig {
            capture_panics: self.capture_panics,
            shutdown_timeout: self.shutdown_timeout,
            storage,
            ..InstallConfig::default()
        }
    }
}
