pub mod resolver;
pub mod set;

pub use resolver::{ANONYMOUS_STREAM, AnonymousStream, FixedStreamName, HostnameStream, StreamNameResolver};
pub use set::ChannelSet;

use crate::domain::LogEvent;
use crate::sender::{CreateLogStreamRequest, LogTransport, PutLogEventsRequest};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel name must not be empty")]
    EmptyName,
    #[error("Missing channel config for {channel}: log_group_name")]
    EmptyLogGroupName { channel: String },
    #[error("Channel {channel} interval must be greater than 0")]
    InvalidInterval { channel: String },
}

#[derive(Clone)]
pub struct ChannelConfig {
    pub log_group_name: String,
    pub stream_name_resolver: Arc<dyn StreamNameResolver>,
    pub interval: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            log_group_name: String::new(),
            stream_name_resolver: Arc::new(AnonymousStream),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("log_group_name", &self.log_group_name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// One destination log stream. Immutable after construction.
pub struct Channel {
    name: String,
    log_group_name: String,
    stream_name_resolver: Arc<dyn StreamNameResolver>,
    interval: Duration,
    transport: Arc<dyn LogTransport>,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        transport: Arc<dyn LogTransport>,
        config: ChannelConfig,
    ) -> Result<Self, ChannelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ChannelError::EmptyName);
        }
        if config.log_group_name.is_empty() {
            return Err(ChannelError::EmptyLogGroupName { channel: name });
        }
        if config.interval.is_zero() {
            return Err(ChannelError::InvalidInterval { channel: name });
        }

        Ok(Self {
            name,
            log_group_name: config.log_group_name,
            stream_name_resolver: config.stream_name_resolver,
            interval: config.interval,
            transport,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_group_name(&self) -> &str {
        &self.log_group_name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn transport(&self) -> &Arc<dyn LogTransport> {
        &self.transport
    }

    pub async fn resolve_stream_name(&self) -> anyhow::Result<String> {
        self.stream_name_resolver.resolve().await
    }

    pub fn create_log_stream_request(&self, log_stream_name: &str) -> CreateLogStreamRequest {
        CreateLogStreamRequest {
            log_group_name: self.log_group_name.clone(),
            log_stream_name: log_stream_name.to_string(),
        }
    }

    /// An empty token is treated as absent.
    pub fn put_log_events_request(
        &self,
        log_stream_name: &str,
        log_events: Vec<LogEvent>,
        sequence_token: Option<String>,
    ) -> PutLogEventsRequest {
        PutLogEventsRequest {
            log_group_name: self.log_group_name.clone(),
            log_stream_name: log_stream_name.to_string(),
            log_events,
            sequence_token: sequence_token.filter(|token| !token.is_empty()),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("log_group_name", &self.log_group_name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
