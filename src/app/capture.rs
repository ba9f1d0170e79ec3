//! Boundary adapters turning ambient process events into discrete messages.
//!
//! Both adapters only enqueue onto an unbounded channel; the installer's dispatcher
//! task is what pushes into sources.

use crate::domain::{ErrorEvent, Level, Message, Payload};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Our own diagnostics are never captured, so delivery failures cannot re-enter a queue.
pub const SELF_TARGET: &str = "rask_log_shipper";

/// Targets the delivery path itself logs under.
pub const DEFAULT_IGNORED_TARGETS: &[&str] =
    &["hyper", "hyper_util", "reqwest", "h2", "rustls", "sled", "tokio", "mio"];

static PANIC_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
pub enum Captured {
    Console(Message),
    Uncaught(ErrorEvent),
    /// Acknowledged once everything enqueued before it has been pushed.
    Flush(oneshot::Sender<()>),
}

pub type CaptureSender = mpsc::UnboundedSender<Captured>;

/// A `tracing` layer forwarding events as console messages.
#[derive(Clone)]
pub struct ConsoleCaptureLayer {
    tx: CaptureSender,
    ignored_targets: Arc<[String]>,
}

impl ConsoleCaptureLayer {
    pub fn new(tx: CaptureSender, ignored_targets: &[String]) -> Self {
        Self {
            tx,
            ignored_targets: ignored_targets.into(),
        }
    }

    fn is_ignored(&self, target: &str) -> bool {
        is_within(target, SELF_TARGET)
            || self
                .ignored_targets
                .iter()
                .any(|ignored| is_within(target, ignored))
    }
}

fn is_within(target: &str, module: &str) -> bool {
    target == module
        || target
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl fmt::Debug for ConsoleCaptureLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleCaptureLayer")
            .field("ignored_targets", &self.ignored_targets)
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Layer<S> for ConsoleCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if self.is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let params = if visitor.fields.is_empty() {
            Vec::new()
        } else {
            vec![Value::Object(visitor.fields)]
        };
        let message = Message::console(
            Level::from(metadata.level()),
            visitor.message.unwrap_or_default(),
            params,
        )
        .with_extra("target", metadata.target());

        // The dispatcher is gone after shutdown; late events are dropped.
        let _ = self.tx.send(Captured::Console(message));
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.insert(field, Value::from(format!("{value:?}")));
        }
    }
}

/// Reports panics as uncaught errors, then defers to the previously installed hook.
///
/// Returns `false` when a hook from this crate is already installed in the process.
pub fn install_panic_hook(tx: CaptureSender) -> bool {
    if PANIC_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return false;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let text = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        let mut event = ErrorEvent::new(Payload::error("panic", text));
        if let Some(location) = info.location() {
            event = event.at(location.file(), location.line(), location.column());
        }
        let _ = tx.send(Captured::Uncaught(event));

        previous(info);
    }));

    true
}
