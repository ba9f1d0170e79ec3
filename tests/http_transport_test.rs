use rask_log_shipper::domain::LogEvent;
use rask_log_shipper::sender::{
    CreateLogStreamRequest, HttpTransport, HttpTransportConfig, LogTransport,
    PutLogEventsRequest, TransportError,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method},
};

fn transport(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfig {
        endpoint: server.uri(),
        timeout: Duration::from_secs(5),
        connection_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    HttpTransport::new(config).unwrap()
}

fn put_request(sequence_token: Option<&str>) -> PutLogEventsRequest {
    PutLogEventsRequest {
        log_group_name: "frontend".to_string(),
        log_stream_name: "visitor-1".to_string(),
        log_events: vec![LogEvent::new(1_700_000_000_000, "boom")],
        sequence_token: sequence_token.map(str::to_string),
    }
}

#[tokio::test]
async fn test_create_log_stream_request_shape() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "Logs_20140328.CreateLogStream"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_json(json!({
            "logGroupName": "frontend",
            "logStreamName": "visitor-1",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateLogStreamRequest {
        log_group_name: "frontend".to_string(),
        log_stream_name: "visitor-1".to_string(),
    };
    transport(&server).create_log_stream(&request).await.unwrap();
}

#[tokio::test]
async fn test_put_log_events_returns_next_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("x-amz-target", "Logs_20140328.PutLogEvents"))
        .and(body_json(json!({
            "logGroupName": "frontend",
            "logStreamName": "visitor-1",
            "logEvents": [{"timestamp": 1_700_000_000_000_i64, "message": "boom"}],
            "sequenceToken": "A",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nextSequenceToken": "B"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .put_log_events(&put_request(Some("A")))
        .await
        .unwrap();
    assert_eq!(response.next_sequence_token.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_existing_stream_maps_to_already_exists() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.logs#ResourceAlreadyExistsException",
            "message": "The specified log stream already exists",
        })))
        .mount(&server)
        .await;

    let request = CreateLogStreamRequest {
        log_group_name: "frontend".to_string(),
        log_stream_name: "visitor-1".to_string(),
    };
    let result = transport(&server).create_log_stream(&request).await;
    assert!(matches!(result, Err(TransportError::StreamAlreadyExists)));
}

#[tokio::test]
async fn test_token_errors_carry_expected_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "DataAlreadyAcceptedException",
            "message": "The given batch of log events has already been accepted.",
            "expectedSequenceToken": "T2",
        })))
        .mount(&server)
        .await;

    let error = transport(&server)
        .put_log_events(&put_request(None))
        .await
        .unwrap_err();
    assert!(matches!(error, TransportError::DataAlreadyAccepted { .. }));
    assert_eq!(error.expected_sequence_token(), Some("T2"));
}

#[tokio::test]
async fn test_server_error_is_unrecognized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    match transport(&server).put_log_events(&put_request(None)).await {
        Err(TransportError::Service { status, message, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("Expected Service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    let config = HttpTransportConfig {
        endpoint: "http://127.0.0.1:9/".to_string(),
        timeout: Duration::from_secs(2),
        connection_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let transport = HttpTransport::new(config).unwrap();

    let result = transport.put_log_events(&put_request(None)).await;
    assert!(matches!(result, Err(TransportError::Network(_))));
}
