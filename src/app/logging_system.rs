use super::capture::ConsoleCaptureLayer;
use super::config::{LogFormat, TracingLevel};
use thiserror::Error;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to set global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] TryInitError),
}

/// Transport and storage crates are kept quiet unless `RUST_LOG` says otherwise.
pub const DEFAULT_DIRECTIVES: &[(&str, TracingLevel)] = &[
    ("hyper", TracingLevel::Warn),
    ("hyper_util", TracingLevel::Warn),
    ("reqwest", TracingLevel::Warn),
    ("h2", TracingLevel::Warn),
    ("rustls", TracingLevel::Warn),
    ("sled", TracingLevel::Warn),
];

pub fn build_filter_string(default_level: TracingLevel) -> String {
    let mut filter_parts = Vec::with_capacity(DEFAULT_DIRECTIVES.len() + 1);
    filter_parts.push(default_level.as_str().to_string());

    for (target, level) in DEFAULT_DIRECTIVES {
        filter_parts.push(format!("{}={}", target, level.as_str()));
    }

    filter_parts.join(",")
}

/// `RUST_LOG` when set, otherwise `default_level` plus [`DEFAULT_DIRECTIVES`].
pub fn env_filter(default_level: TracingLevel) -> Result<EnvFilter, LoggingError> {
    let filter = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| build_filter_string(default_level));

    EnvFilter::try_new(&filter).map_err(|source| LoggingError::InvalidFilter { filter, source })
}

/// Installs the global subscriber, optionally with the console capture layer.
///
/// The capture layer sits behind the same filter, so only events that would be
/// printed are shipped.
pub fn init_tracing(
    format: LogFormat,
    level: TracingLevel,
    capture: Option<ConsoleCaptureLayer>,
) -> Result<(), LoggingError> {
    let registry = tracing_subscriber::registry()
        .with(env_filter(level)?)
        .with(capture);

    match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .compact(),
            )
            .try_init()?,
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false),
            )
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_string() {
        let filter = build_filter_string(TracingLevel::Debug);
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("sled=warn"));
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(build_filter_string(TracingLevel::Info)).is_ok());
    }
}
