use super::capture::{
    CaptureSender, Captured, ConsoleCaptureLayer, DEFAULT_IGNORED_TARGETS, install_panic_hook,
};
use crate::buffer::SourceSet;
use crate::cache::{MemoryStorage, Storage};
use crate::channel::ChannelSet;
use crate::collector::CollectorSet;
use crate::console::{ConsoleSink, StdConsole};
use crate::domain::{ErrorEvent, Level, Message, Payload};
use crate::sender::DeliveryOutcome;
use crate::worker::WorkerSet;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("Logger is already installed")]
    AlreadyInstalled,
    #[error("A panic hook is already installed by this process")]
    PanicHookAlreadyInstalled,
    #[error("Nothing to install: no collectors given")]
    NoCollectors,
}

#[derive(Clone)]
pub struct InstallConfig {
    pub capture_panics: bool,
    pub ignored_targets: Vec<String>,
    pub shutdown_timeout: Duration,
    pub storage: Arc<dyn Storage>,
    pub console: Arc<dyn ConsoleSink>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            capture_panics: false,
            ignored_targets: DEFAULT_IGNORED_TARGETS
                .iter()
                .map(|target| target.to_string())
                .collect(),
            shutdown_timeout: Duration::from_secs(5),
            storage: Arc::new(MemoryStorage::new()),
            console: Arc::new(StdConsole),
        }
    }
}

impl fmt::Debug for InstallConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallConfig")
            .field("capture_panics", &self.capture_panics)
            .field("ignored_targets", &self.ignored_targets)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

/// Routes captured messages into the sources of their level.
pub struct Handler {
    sources: SourceSet,
    console: Arc<dyn ConsoleSink>,
}

impl Handler {
    pub fn new(sources: SourceSet, console: Arc<dyn ConsoleSink>) -> Self {
        Self { sources, console }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Echoes to the original console unless every `level` source is muted, then enqueues.
    pub async fn console(&self, level: Level, payload: impl Into<Payload>, params: Vec<Value>) {
        let message = Message::console(level, payload, params);
        let sources = self.sources.filter_by_level(level);
        if !sources.is_muted() {
            self.console.write(level, &render(&message));
        }
        sources.push(std::slice::from_ref(&message)).await;
    }

    /// Enqueues a message whose echo already happened elsewhere.
    pub async fn record(&self, message: Message) {
        let level = message.level().unwrap_or(Level::Log);
        self.sources
            .filter_by_level(level)
            .push(std::slice::from_ref(&message))
            .await;
    }

    pub async fn uncaught(&self, event: ErrorEvent) {
        let message = Message::uncaught(event);
        self.sources
            .filter_by_level(Level::Error)
            .push(std::slice::from_ref(&message))
            .await;
    }

    pub async fn notify(&self, level: Level, payload: impl Into<Payload>, params: Vec<Value>) {
        let message = Message::custom(payload, params);
        self.sources
            .filter_by_level(level)
            .push(std::slice::from_ref(&message))
            .await;
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

fn render(message: &Message) -> String {
    let mut parts = vec![message.payload().describe()];
    parts.extend(message.params().iter().map(|param| match param {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }));
    parts.join(" ")
}

/// One-time wiring of capture, handler and workers.
#[derive(Debug)]
pub struct Installer {
    config: InstallConfig,
    installed: AtomicBool,
}

impl Installer {
    pub fn new(config: InstallConfig) -> Self {
        Self {
            config,
            installed: AtomicBool::new(false),
        }
    }

    /// Starts one worker per collector and returns the logger handle.
    ///
    /// Must be called from within a tokio runtime. Fails on a second call.
    pub fn install(&self, collectors: CollectorSet) -> Result<Logger, InstallError> {
        if collectors.is_empty() {
            return Err(InstallError::NoCollectors);
        }
        if self.installed.swap(true, Ordering::SeqCst) {
            return Err(InstallError::AlreadyInstalled);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if self.config.capture_panics && !install_panic_hook(tx.clone()) {
            // Nothing was wired; release the installer for another attempt.
            self.installed.store(false, Ordering::SeqCst);
            return Err(InstallError::PanicHookAlreadyInstalled);
        }

        let handler = Arc::new(Handler::new(
            collectors.sources(),
            self.config.console.clone(),
        ));
        let workers = WorkerSet::for_collectors(
            &collectors,
            self.config.storage.clone(),
            self.config.console.clone(),
        );

        let cancel = CancellationToken::new();
        tokio::spawn(dispatch(handler.clone(), rx, cancel.clone()));
        workers.start();

        info!(
            "Installed logger with {} channels and {} sources",
            workers.len(),
            handler.sources().len()
        );

        Ok(Logger {
            handler,
            workers,
            capture_tx: tx,
            ignored_targets: self.config.ignored_targets.clone(),
            dispatcher_cancel: cancel,
            shutdown_timeout: self.config.shutdown_timeout,
            shut_down: AtomicBool::new(false),
        })
    }
}

async fn dispatch(
    handler: Arc<Handler>,
    mut rx: mpsc::UnboundedReceiver<Captured>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            captured = rx.recv() => match captured {
                Some(Captured::Console(message)) => handler.record(message).await,
                Some(Captured::Uncaught(event)) => handler.uncaught(event).await,
                Some(Captured::Flush(ack)) => {
                    let _ = ack.send(());
                }
                None => break,
            },
        }
    }
    debug!("Capture dispatcher stopped");
}

/// Handle over an installed pipeline.
pub struct Logger {
    handler: Arc<Handler>,
    workers: WorkerSet,
    capture_tx: CaptureSender,
    ignored_targets: Vec<String>,
    dispatcher_cancel: CancellationToken,
    shutdown_timeout: Duration,
    shut_down: AtomicBool,
}

impl Logger {
    pub async fn debug(&self, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.console(Level::Debug, payload, params).await;
    }

    pub async fn info(&self, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.console(Level::Info, payload, params).await;
    }

    pub async fn log(&self, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.console(Level::Log, payload, params).await;
    }

    pub async fn warn(&self, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.console(Level::Warn, payload, params).await;
    }

    pub async fn error(&self, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.console(Level::Error, payload, params).await;
    }

    pub async fn notify(&self, level: Level, payload: impl Into<Payload>, params: Vec<Value>) {
        self.handler.notify(level, payload, params).await;
    }

    pub async fn uncaught(&self, event: ErrorEvent) {
        self.handler.uncaught(event).await;
    }

    /// A layer shipping `tracing` events from outside this crate. Add it to the
    /// global subscriber.
    pub fn capture_layer(&self) -> ConsoleCaptureLayer {
        ConsoleCaptureLayer::new(self.capture_tx.clone(), &self.ignored_targets)
    }

    pub fn handler(&self) -> &Arc<Handler> {
        &self.handler
    }

    pub fn workers(&self) -> &WorkerSet {
        &self.workers
    }

    pub fn sources(&self) -> SourceSet {
        self.workers.sources()
    }

    pub fn channels(&self) -> ChannelSet {
        self.workers.channels()
    }

    /// Stops every worker and delivers what is still queued. Later calls return nothing.
    ///
    /// Outcomes are returned for the channels that finished within `shutdown_timeout`.
    /// A slower final delivery keeps running in the background and is reported on the
    /// console.
    pub async fn shutdown(&self) -> Vec<DeliveryOutcome> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        // Let the dispatcher push everything captured so far.
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.capture_tx.send(Captured::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }

        self.workers.stop();

        // Each final tick runs as its own task so the deadline never cuts a put short.
        let drains: Vec<_> = self
            .workers
            .iter()
            .map(|worker| {
                let drained = worker.clone();
                (worker.clone(), tokio::spawn(async move { drained.drain().await }))
            })
            .collect();

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut outcomes = Vec::with_capacity(drains.len());
        for (worker, mut drain) in drains {
            match tokio::time::timeout_at(deadline, &mut drain).await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => {
                    error!(
                        "Final delivery for channel {} failed: {}",
                        worker.channel().name(),
                        e
                    );
                    self.handler.console.error(&format!(
                        "rask-log-shipper: final delivery for channel {} failed: {e}",
                        worker.channel().name()
                    ));
                }
                Err(_) => {
                    warn!(
                        "Final delivery for channel {} did not finish within {:?}, leaving it running",
                        worker.channel().name(),
                        self.shutdown_timeout
                    );
                    self.handler.console.error(&format!(
                        "rask-log-shipper: final delivery for channel {} still in flight after {:?}",
                        worker.channel().name(),
                        self.shutdown_timeout
                    ));
                }
            }
        }
        self.dispatcher_cancel.cancel();

        info!("Logger shut down after {} final deliveries", outcomes.len());
        outcomes
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("workers", &self.workers)
            .field("shut_down", &self.shut_down.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
