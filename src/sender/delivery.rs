use super::stats::DeliveryStats;
use super::transport::TransportError;
use crate::cache::{Cache, StorageError};
use crate::channel::Channel;
use crate::console::ConsoleSink;
use crate::domain::LogEvent;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const LOG_STREAM_NAME_KEY: &str = "logStreamName";
pub const SEQUENCE_TOKEN_KEY: &str = "sequenceToken";

/// Why a batch was dropped.
#[derive(Error, Debug)]
pub enum DeliveryFailure {
    #[error("Failed to resolve log stream name: {0}")]
    ResolveStreamName(anyhow::Error),
    #[error("Failed to create log stream: {0}")]
    CreateStream(TransportError),
    #[error("Failed to put log events: {0}")]
    PutLogEvents(TransportError),
    #[error("Cache error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing was buffered; no request was made.
    Empty,
    Delivered { events: usize },
    /// Accepted on the retry after a token mismatch.
    Retransmitted { events: usize },
    /// The sink already had the batch; its token was adopted.
    AlreadyAccepted { events: usize },
    /// Cached stream state was cleared and the batch dropped.
    Reset { events_dropped: usize },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            DeliveryOutcome::Delivered { .. }
                | DeliveryOutcome::Retransmitted { .. }
                | DeliveryOutcome::AlreadyAccepted { .. }
        )
    }
}

enum Recovery {
    Retransmit(String),
    Adopt(String),
    Unrecoverable,
}

fn recovery_for(error: &TransportError) -> Recovery {
    match (error, error.expected_sequence_token()) {
        (TransportError::InvalidSequenceToken { .. }, Some(token)) => {
            Recovery::Retransmit(token.to_string())
        }
        (TransportError::DataAlreadyAccepted { .. }, Some(token)) => {
            Recovery::Adopt(token.to_string())
        }
        _ => Recovery::Unrecoverable,
    }
}

/// Delivers one channel's batches and keeps its stream name and sequence token.
///
/// The cache must be scoped to the channel; two senders sharing a scope will fight
/// over the token.
pub struct Sender {
    channel: Arc<Channel>,
    cache: Cache,
    console: Arc<dyn ConsoleSink>,
    stats: Arc<DeliveryStats>,
}

impl Sender {
    pub fn new(channel: Arc<Channel>, cache: Cache, console: Arc<dyn ConsoleSink>) -> Self {
        Self {
            channel,
            cache,
            console,
            stats: Arc::new(DeliveryStats::new()),
        }
    }

    pub fn with_stats(mut self, stats: Arc<DeliveryStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn stats(&self) -> &Arc<DeliveryStats> {
        &self.stats
    }

    /// Sends one batch. Never fails: every failure ends in a reset and is reported
    /// on the console sink, never through the capture path.
    ///
    /// A token mismatch with a hint is retried exactly once.
    pub async fn send(&self, log_events: Vec<LogEvent>) -> DeliveryOutcome {
        if log_events.is_empty() {
            return DeliveryOutcome::Empty;
        }
        let events = log_events.len();

        let log_stream_name = match self.log_stream_name().await {
            Ok(name) => name,
            Err(failure) => return self.reset(failure, events).await,
        };
        let sequence_token = match self.cache.get_item(SEQUENCE_TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => return self.reset(e.into(), events).await,
        };

        let mut request =
            self.channel
                .put_log_events_request(&log_stream_name, log_events, sequence_token);
        let mut retransmitted = false;

        loop {
            let error = match self.channel.transport().put_log_events(&request).await {
                Ok(response) => {
                    if let Some(next) = response.next_sequence_token.filter(|t| !t.is_empty()) {
                        if let Err(e) = self.cache.set_item(SEQUENCE_TOKEN_KEY, &next).await {
                            return self.reset(e.into(), events).await;
                        }
                    }
                    self.stats.record_delivered(events);
                    debug!(
                        "Delivered {} events to {}/{}",
                        events,
                        self.channel.log_group_name(),
                        log_stream_name
                    );
                    return if retransmitted {
                        DeliveryOutcome::Retransmitted { events }
                    } else {
                        DeliveryOutcome::Delivered { events }
                    };
                }
                Err(error) => error,
            };

            match recovery_for(&error) {
                Recovery::Retransmit(expected) if !retransmitted => {
                    if let Err(e) = self.cache.set_item(SEQUENCE_TOKEN_KEY, &expected).await {
                        return self.reset(e.into(), events).await;
                    }
                    self.stats.record_token_recovery();
                    debug!(
                        "Sequence token mismatch on {}, retrying with expected token",
                        self.channel.name()
                    );
                    request.sequence_token = Some(expected);
                    retransmitted = true;
                    tokio::task::yield_now().await;
                }
                Recovery::Adopt(expected) => {
                    if let Err(e) = self.cache.set_item(SEQUENCE_TOKEN_KEY, &expected).await {
                        return self.reset(e.into(), events).await;
                    }
                    self.stats.record_duplicate_suppressed();
                    debug!(
                        "Batch already accepted on {}, adopting expected token",
                        self.channel.name()
                    );
                    return DeliveryOutcome::AlreadyAccepted { events };
                }
                _ => return self.reset(DeliveryFailure::PutLogEvents(error), events).await,
            }
        }
    }

    async fn log_stream_name(&self) -> Result<String, DeliveryFailure> {
        if let Some(name) = self
            .cache
            .get_item(LOG_STREAM_NAME_KEY)
            .await?
            .filter(|name| !name.is_empty())
        {
            return Ok(name);
        }

        let name = self
            .channel
            .resolve_stream_name()
            .await
            .map_err(DeliveryFailure::ResolveStreamName)?;
        let request = self.channel.create_log_stream_request(&name);

        match self.channel.transport().create_log_stream(&request).await {
            Ok(()) => {
                self.stats.record_stream_created();
                info!(
                    "Created log stream {}/{}",
                    self.channel.log_group_name(),
                    name
                );
            }
            Err(TransportError::StreamAlreadyExists) => {
                debug!(
                    "Log stream {}/{} already exists",
                    self.channel.log_group_name(),
                    name
                );
            }
            Err(e) => return Err(DeliveryFailure::CreateStream(e)),
        }

        self.cache.set_item(LOG_STREAM_NAME_KEY, &name).await?;
        Ok(name)
    }

    async fn reset(&self, failure: DeliveryFailure, events_dropped: usize) -> DeliveryOutcome {
        error!(
            "Dropping {} events on channel {}: {}",
            events_dropped,
            self.channel.name(),
            failure
        );
        self.console
            .error(&format!("[{}] {}", self.channel.name(), failure));

        if let Err(e) = self
            .cache
            .remove_items(&[LOG_STREAM_NAME_KEY, SEQUENCE_TOKEN_KEY])
            .await
        {
            warn!(
                "Failed to clear cached stream state for {}: {}",
                self.channel.name(),
                e
            );
        }

        self.stats.record_reset(events_dropped);
        DeliveryOutcome::Reset { events_dropped }
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("channel", &self.channel.name())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
