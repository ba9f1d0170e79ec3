use super::formatter::{JsonFormatter, MessageFormatter};
use super::queue::EventQueue;
use crate::domain::{Level, LogEvent, Message};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

pub type TimestampProvider = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Clone)]
pub struct SourceConfig {
    pub formatter: Arc<dyn MessageFormatter>,
    pub muted: bool,
    pub disabled: bool,
    pub timestamp_provider: TimestampProvider,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            formatter: Arc::new(JsonFormatter),
            muted: false,
            disabled: false,
            timestamp_provider: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("muted", &self.muted)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// A leveled queue of outbound events; the unit of filtering.
///
/// `muted` only suppresses passthrough to the original console. `disabled` discards pushes.
pub struct Source {
    level: Level,
    formatter: Arc<dyn MessageFormatter>,
    timestamp_provider: TimestampProvider,
    muted: AtomicBool,
    disabled: AtomicBool,
    queue: EventQueue,
}

impl Source {
    pub fn new(level: Level, config: SourceConfig) -> Self {
        Self {
            level,
            formatter: config.formatter,
            timestamp_provider: config.timestamp_provider,
            muted: AtomicBool::new(config.muted),
            disabled: AtomicBool::new(config.disabled),
            queue: EventQueue::new(),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Acquire)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn mute(&self) -> &Self {
        self.muted.store(true, Ordering::Release);
        self
    }

    pub fn unmute(&self) -> &Self {
        self.muted.store(false, Ordering::Release);
        self
    }

    pub fn enable(&self) -> &Self {
        self.disabled.store(false, Ordering::Release);
        self
    }

    pub fn disable(&self) -> &Self {
        self.disabled.store(true, Ordering::Release);
        self
    }

    /// Formats and enqueues messages in call order.
    pub async fn push(&self, messages: &[Message]) {
        if self.is_disabled() || messages.is_empty() {
            return;
        }

        let formatted = join_all(
            messages
                .iter()
                .map(|message| self.formatter.format(message)),
        )
        .await;

        let events: Vec<LogEvent> = formatted
            .into_iter()
            .filter_map(|result| match result {
                Ok(Some(text)) if !text.is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    debug!("Dropping {} message, formatter failed: {}", self.level, e);
                    None
                }
            })
            .map(|text| LogEvent::new((self.timestamp_provider)(), text))
            .collect();

        self.queue.append(events);
    }

    pub fn flush(&self) -> Vec<LogEvent> {
        self.queue.drain()
    }

    /// Events waiting for the next flush.
    pub fn pending(&self) -> Vec<LogEvent> {
        self.queue.snapshot()
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("level", &self.level)
            .field("muted", &self.is_muted())
            .field("disabled", &self.is_disabled())
            .field("pending", &self.queue.len())
            .finish()
    }
}
