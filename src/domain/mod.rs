//! Domain layer for rask-log-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `Level`: source severity (debug/info/log/warn/error)
//! - `Message`: a captured console call, uncaught error or custom notification
//! - `LogEvent`: the timestamped record actually transmitted
//! - `ShipperError`: Top-level error type

pub mod error;
pub mod level;
pub mod log_event;
pub mod message;

pub use error::ShipperError;
pub use level::{Level, ParseLevelError};
pub use log_event::LogEvent;
pub use message::{ErrorEvent, Message, MessageKind, Payload};
