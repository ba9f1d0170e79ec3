use crate::domain::LogEvent;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("The specified log stream already exists")]
    StreamAlreadyExists,
    #[error("The given sequenceToken is invalid (expected {expected_sequence_token:?})")]
    InvalidSequenceToken {
        expected_sequence_token: Option<String>,
    },
    #[error("The given batch of log events has already been accepted (expected {expected_sequence_token:?})")]
    DataAlreadyAccepted {
        expected_sequence_token: Option<String>,
    },
    #[error("Service error: {status} {code} - {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// The sink's hint for the token it expects next, if it sent a usable one.
    pub fn expected_sequence_token(&self) -> Option<&str> {
        match self {
            TransportError::InvalidSequenceToken {
                expected_sequence_token,
            }
            | TransportError::DataAlreadyAccepted {
                expected_sequence_token,
            } => expected_sequence_token
                .as_deref()
                .filter(|token| !token.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogStreamRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsRequest {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub log_events: Vec<LogEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsResponse {
    #[serde(default)]
    pub next_sequence_token: Option<String>,
}

/// The remote log sink.
///
/// Implementations classify failures into [`TransportError`]; the delivery protocol
/// relies on `StreamAlreadyExists`, `InvalidSequenceToken` and `DataAlreadyAccepted`
/// being reported as such.
pub trait LogTransport: Send + Sync {
    fn create_log_stream<'a>(
        &'a self,
        request: &'a CreateLogStreamRequest,
    ) -> BoxFuture<'a, Result<(), TransportError>>;

    fn put_log_events<'a>(
        &'a self,
        request: &'a PutLogEventsRequest,
    ) -> BoxFuture<'a, Result<PutLogEventsResponse, TransportError>>;
}

/// Accepts everything. For unit tests that never reach the sink.
#[cfg(test)]
pub(crate) struct NoopTransport;

#[cfg(test)]
impl LogTransport for NoopTransport {
    fn create_log_stream<'a>(
        &'a self,
        _request: &'a CreateLogStreamRequest,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(futures::future::ready(Ok(())))
    }

    fn put_log_events<'a>(
        &'a self,
        _request: &'a PutLogEventsRequest,
    ) -> BoxFuture<'a, Result<PutLogEventsResponse, TransportError>> {
        Box::pin(futures::future::ready(Ok(PutLogEventsResponse::default())))
    }
}
