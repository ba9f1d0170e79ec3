pub mod formatter;
pub mod queue;
pub mod source;
pub mod sources;

pub use formatter::{JsonFormatter, MessageFormatter};
pub use queue::EventQueue;
pub use source::{Source, SourceConfig, TimestampProvider};
pub use sources::SourceSet;
