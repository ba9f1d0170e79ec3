#![allow(dead_code)]

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rask_log_shipper::buffer::{Source, SourceConfig, SourceSet};
use rask_log_shipper::cache::MemoryStorage;
use rask_log_shipper::channel::{Channel, ChannelConfig, FixedStreamName};
use rask_log_shipper::collector::Collector;
use rask_log_shipper::console::ConsoleSink;
use rask_log_shipper::domain::{Level, Message};
use rask_log_shipper::sender::{
    CreateLogStreamRequest, LogTransport, PutLogEventsRequest, PutLogEventsResponse,
    TransportError,
};
use rask_log_shipper::worker::Worker;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub const CHANNEL: &str = "app";
pub const GROUP: &str = "frontend";
pub const STREAM: &str = "visitor-1";

/// Replies in scripted order; unscripted calls succeed without a next token.
#[derive(Default)]
pub struct ScriptedTransport {
    create_replies: Mutex<VecDeque<Result<(), TransportError>>>,
    put_replies: Mutex<VecDeque<Result<PutLogEventsResponse, TransportError>>>,
    creates: Mutex<Vec<CreateLogStreamRequest>>,
    puts: Mutex<Vec<PutLogEventsRequest>>,
    put_delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_put_delay(delay: Duration) -> Self {
        Self {
            put_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn script_create(&self, reply: Result<(), TransportError>) -> &Self {
        self.create_replies.lock().push_back(reply);
        self
    }

    pub fn script_put(&self, reply: Result<PutLogEventsResponse, TransportError>) -> &Self {
        self.put_replies.lock().push_back(reply);
        self
    }

    pub fn creates(&self) -> Vec<CreateLogStreamRequest> {
        self.creates.lock().clone()
    }

    pub fn puts(&self) -> Vec<PutLogEventsRequest> {
        self.puts.lock().clone()
    }
}

impl LogTransport for ScriptedTransport {
    fn create_log_stream<'a>(
        &'a self,
        request: &'a CreateLogStreamRequest,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.creates.lock().push(request.clone());
            self.create_replies.lock().pop_front().unwrap_or(Ok(()))
        })
    }

    fn put_log_events<'a>(
        &'a self,
        request: &'a PutLogEventsRequest,
    ) -> BoxFuture<'a, Result<PutLogEventsResponse, TransportError>> {
        Box::pin(async move {
            self.puts.lock().push(request.clone());
            if let Some(delay) = self.put_delay {
                tokio::time::sleep(delay).await;
            }
            let reply = self.put_replies.lock().pop_front();
            reply.unwrap_or_else(|| Ok(PutLogEventsResponse::default()))
        })
    }
}

pub fn next_token(token: &str) -> Result<PutLogEventsResponse, TransportError> {
    Ok(PutLogEventsResponse {
        next_sequence_token: Some(token.to_string()),
    })
}

pub fn mismatch(expected: Option<&str>) -> Result<PutLogEventsResponse, TransportError> {
    Err(TransportError::InvalidSequenceToken {
        expected_sequence_token: expected.map(str::to_string),
    })
}

pub fn already_accepted(expected: &str) -> Result<PutLogEventsResponse, TransportError> {
    Err(TransportError::DataAlreadyAccepted {
        expected_sequence_token: Some(expected.to_string()),
    })
}

#[derive(Default)]
pub struct RecordingConsole {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl ConsoleSink for RecordingConsole {
    fn write(&self, level: Level, text: &str) {
        self.lines.lock().push((level, text.to_string()));
    }
}

/// Formats a message as its payload text, timestamped by a counter starting at 1.
pub fn text_source_config() -> SourceConfig {
    let clock = Arc::new(AtomicI64::new(0));
    SourceConfig {
        formatter: Arc::new(|message: &Message| -> anyhow::Result<Option<String>> {
            Ok(Some(message.payload().describe()))
        }),
        timestamp_provider: Arc::new(move || clock.fetch_add(1, Ordering::SeqCst) + 1),
        ..SourceConfig::default()
    }
}

pub fn channel_config() -> ChannelConfig {
    ChannelConfig {
        log_group_name: GROUP.to_string(),
        stream_name_resolver: Arc::new(FixedStreamName(STREAM.to_string())),
        interval: Duration::from_millis(100),
    }
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<MemoryStorage>,
    pub console: Arc<RecordingConsole>,
    pub sources: SourceSet,
    pub worker: Worker,
}

impl Harness {
    pub fn new(levels: &[Level]) -> Self {
        Self::with_transport(levels, ScriptedTransport::new(), channel_config())
    }

    pub fn with_transport(
        levels: &[Level],
        transport: ScriptedTransport,
        config: ChannelConfig,
    ) -> Self {
        let transport = Arc::new(transport);
        let storage = Arc::new(MemoryStorage::new());
        let console = Arc::new(RecordingConsole::default());
        let sources = SourceSet::for_levels(levels, &text_source_config());

        let channel = Arc::new(Channel::new(CHANNEL, transport.clone(), config).unwrap());
        let collector = Arc::new(Collector::new(channel, sources.clone()));
        let worker = Worker::new(collector, storage.clone(), console.clone());

        Self {
            transport,
            storage,
            console,
            sources,
            worker,
        }
    }

    pub fn source(&self, level: Level) -> Arc<Source> {
        self.sources.find_by_level(level).unwrap()
    }

    pub async fn push(&self, level: Level, text: &str) {
        self.source(level)
            .push(&[Message::console(level, text, vec![])])
            .await;
    }

    pub fn cached(&self, key: &str) -> Option<String> {
        self.storage.raw(&format!("RaskLogShipper:{CHANNEL}:{key}"))
    }
}
