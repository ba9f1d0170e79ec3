pub mod set;

pub use set::WorkerSet;

use crate::buffer::SourceSet;
use crate::cache::{Cache, Storage};
use crate::channel::Channel;
use crate::collector::Collector;
use crate::console::ConsoleSink;
use crate::sender::{DeliveryOutcome, DeliveryStats, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Root namespace for per-channel delivery state.
pub const CACHE_NAMESPACE: &str = "RaskLogShipper";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The previous tick for this channel had not resolved yet.
    Skipped,
    Completed(DeliveryOutcome),
}

struct TickState {
    collector: Arc<Collector>,
    sender: Sender,
    in_flight: AtomicBool,
    idle: Notify,
}

struct InFlightGuard<'a>(&'a TickState);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
        self.0.idle.notify_waiters();
    }
}

impl TickState {
    async fn tick(&self) -> TickOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.sender.stats().record_skipped_tick();
            debug!(
                "Skipping tick for {}: previous tick still in flight",
                self.collector.channel().name()
            );
            return TickOutcome::Skipped;
        }
        let _guard = InFlightGuard(self);

        TickOutcome::Completed(self.collector.collect(&self.sender).await)
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives one collector on its channel's interval.
///
/// Ticks for a channel never overlap. `stop` only cancels future ticks; one already
/// running completes.
pub struct Worker {
    state: Arc<TickState>,
    running: Mutex<Option<Running>>,
}

impl Worker {
    /// Delivery state is cached under `RaskLogShipper:<channel name>` in `storage`.
    pub fn new(
        collector: Arc<Collector>,
        storage: Arc<dyn Storage>,
        console: Arc<dyn ConsoleSink>,
    ) -> Self {
        let cache = Cache::new(storage, CACHE_NAMESPACE).scoped(collector.channel().name());
        let sender = Sender::new(collector.channel().clone(), cache, console);
        Self::with_sender(collector, sender)
    }

    pub fn with_sender(collector: Arc<Collector>, sender: Sender) -> Self {
        Self {
            state: Arc::new(TickState {
                collector,
                sender,
                in_flight: AtomicBool::new(false),
                idle: Notify::new(),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn collector(&self) -> &Arc<Collector> {
        &self.state.collector
    }

    pub fn channel(&self) -> &Arc<Channel> {
        self.state.collector.channel()
    }

    pub fn sources(&self) -> &SourceSet {
        self.state.collector.sources()
    }

    pub fn sender(&self) -> &Sender {
        &self.state.sender
    }

    pub fn stats(&self) -> &Arc<DeliveryStats> {
        self.state.sender.stats()
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Starts the periodic timer. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let period = self.channel().interval();
        let state = self.state.clone();
        let loop_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            state.tick().await;
                        });
                    }
                }
            }
        });

        info!(
            "Started worker for channel {} (interval={:?})",
            self.channel().name(),
            period
        );
        *running = Some(Running { cancel, handle });
        true
    }

    /// Cancels future ticks. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let Some(running) = self.running.lock().take() else {
            return false;
        };
        running.cancel.cancel();
        drop(running.handle);

        info!("Stopped worker for channel {}", self.channel().name());
        true
    }

    /// Runs one drain-and-deliver cycle now, unless one is already in flight.
    pub async fn tick(&self) -> TickOutcome {
        self.state.tick().await
    }

    /// Waits out any in-flight tick, then runs one more.
    pub async fn drain(&self) -> DeliveryOutcome {
        loop {
            // Registered before the attempt so a tick ending in between is not missed.
            let idle = self.state.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();

            match self.state.tick().await {
                TickOutcome::Completed(outcome) => return outcome,
                TickOutcome::Skipped => idle.await,
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("channel", &self.channel().name())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
