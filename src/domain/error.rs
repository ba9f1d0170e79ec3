use thiserror::Error;

/// Top-level error type for the shipper.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Channel error: {0}")]
    Channel(#[from] crate::channel::ChannelError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::cache::StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::sender::TransportError),

    #[error("Install error: {0}")]
    Install(#[from] crate::app::InstallError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] crate::app::LoggingError),
}
