use super::transport::{
    CreateLogStreamRequest, LogTransport, PutLogEventsRequest, PutLogEventsResponse,
    TransportError,
};
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const TARGET_PREFIX: &str = "Logs_20140328";
pub const AMZ_TARGET_HEADER: &str = "X-Amz-Target";
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
    pub enable_compression: bool,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://logs.us-east-1.amazonaws.com/".to_string(),
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            max_connections: 20,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: "rask-log-shipper/0.1.0".to_string(),
            enable_compression: true,
        }
    }
}

/// Speaks the CloudWatch Logs JSON 1.1 protocol. Requests are not signed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    endpoint_url: Url,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
    #[serde(rename = "expectedSequenceToken", default)]
    expected_sequence_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let endpoint_url: Url = config.endpoint.parse().map_err(|e| {
            TransportError::InvalidConfiguration(format!("Invalid endpoint URL: {}", e))
        })?;

        let mut client_builder = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent);

        if config.enable_compression {
            client_builder = client_builder.gzip(true);
        }

        let client = client_builder.build().map_err(|e| {
            TransportError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            config,
            endpoint_url,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn call<T: Serialize>(&self, action: &str, body: &T) -> Result<Vec<u8>, TransportError> {
        let payload = serde_json::to_vec(body)?;
        debug!("{} request: {} bytes", action, payload.len());

        let response = self
            .client
            .post(self.endpoint_url.clone())
            .header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .header(AMZ_TARGET_HEADER, format!("{}.{}", TARGET_PREFIX, action))
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        if status.is_success() {
            Ok(bytes)
        } else {
            Err(classify_error(status.as_u16(), &bytes))
        }
    }
}

/// Maps a service error body onto the transport taxonomy.
///
/// `__type` may carry a namespace prefix such as `com.amazonaws.logs#`.
pub(crate) fn classify_error(status: u16, body: &[u8]) -> TransportError {
    let parsed: ServiceErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = parsed
        .error_type
        .as_deref()
        .and_then(|error_type| error_type.rsplit('#').next())
        .unwrap_or_default()
        .to_string();

    match code.as_str() {
        "ResourceAlreadyExistsException" => TransportError::StreamAlreadyExists,
        "InvalidSequenceTokenException" => TransportError::InvalidSequenceToken {
            expected_sequence_token: parsed.expected_sequence_token,
        },
        "DataAlreadyAcceptedException" => TransportError::DataAlreadyAccepted {
            expected_sequence_token: parsed.expected_sequence_token,
        },
        _ => TransportError::Service {
            status,
            code,
            message: parsed
                .message
                .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned()),
        },
    }
}

impl LogTransport for HttpTransport {
    fn create_log_stream<'a>(
        &'a self,
        request: &'a CreateLogStreamRequest,
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            self.call("CreateLogStream", request).await?;
            Ok(())
        })
    }

    fn put_log_events<'a>(
        &'a self,
        request: &'a PutLogEventsRequest,
    ) -> BoxFuture<'a, Result<PutLogEventsResponse, TransportError>> {
        Box::pin(async move {
            let body = self.call("PutLogEvents", request).await?;
            if body.is_empty() {
                return Ok(PutLogEventsResponse::default());
            }
            Ok(serde_json::from_slice(&body)?)
        })
    }
}
