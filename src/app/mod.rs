pub mod capture;
pub mod config;
pub mod installer;
pub mod logging_system;

pub use capture::{Captured, ConsoleCaptureLayer};
pub use config::{Config, ConfigError, LogFormat, TracingLevel};
pub use installer::{Handler, InstallConfig, InstallError, Installer, Logger};
pub use logging_system::{LoggingError, init_tracing};

use crate::buffer::{SourceConfig, SourceSet};
use crate::channel::Channel;
use crate::collector::{Collector, CollectorSet};
use crate::domain::ShipperError;
use crate::sender::HttpTransport;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

/// The `rask-log-shipper` binary: ships stdin lines until EOF or Ctrl+C.
#[derive(Debug)]
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the single-channel pipeline described by the config and installs it.
    pub fn install(&self) -> Result<Logger, ShipperError> {
        let transport = Arc::new(HttpTransport::new(self.config.http_transport_config())?);
        let channel = Arc::new(Channel::new(
            self.config.channel_name.clone(),
            transport,
            self.config.channel_config(),
        )?);
        let sources = SourceSet::for_levels(&self.config.levels, &SourceConfig::default());
        let collectors = CollectorSet::new(vec![Arc::new(Collector::new(channel, sources))]);

        let storage = self.config.storage()?;
        let logger = Installer::new(self.config.install_config(storage)).install(collectors)?;
        Ok(logger)
    }

    pub async fn run(self) -> Result<(), ShipperError> {
        let logger = self.install()?;

        let capture = self.config.capture_tracing.then(|| logger.capture_layer());
        init_tracing(self.config.log_format, self.config.log_level, capture)?;

        info!(
            "Shipping stdin to {}/{} every {:?}",
            self.config.log_group_name, self.config.channel_name, self.config.interval
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                    break;
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !line.trim().is_empty() {
                            logger.notify(self.config.message_level, line, Vec::new()).await;
                        }
                    }
                    Ok(None) => {
                        info!("Reached end of input, shutting down");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                },
            }
        }

        let outcomes = logger.shutdown().await;
        let delivered = outcomes.iter().filter(|outcome| outcome.is_delivered()).count();
        info!("Final delivery: {}/{} channels delivered", delivered, outcomes.len());

        for worker in logger.workers().items() {
            info!(
                "Channel {} stats: {:?}",
                worker.channel().name(),
                worker.stats().snapshot()
            );
        }

        Ok(())
    }
}
