#![cfg(feature = "http")]

mod common;

use common::{quiet_config, record};
use serverless_log_sink::http::HttpLogSink;
use serverless_log_sink::selflog::MemorySelfLog;
use serverless_log_sink::{BatchingSink, DeliveryError, LogSink};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS_PATH: &str = "/log-groups/app/streams/test-stream/events";
const STREAM_PATH: &str = "/log-groups/app/streams/test-stream";

#[tokio::test]
async fn posts_a_batch_as_log_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpLogSink::new(server.uri());
    sink.deliver("app", "test-stream", &[record(1), record(2)]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["logGroupName"], "app");
    assert_eq!(body["logStreamName"], "test-stream");

    let events = body["logEvents"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0]["timestamp"].as_i64().unwrap() > 0);
    let message: serde_json::Value = serde_json::from_str(events[0]["message"].as_str().unwrap()).unwrap();
    assert_eq!(message["@m"], "record 1");
    assert_eq!(message["seq"], 1);
}

#[tokio::test]
async fn maps_statuses_to_failure_kinds() {
    let server = MockServer::start().await;
    let sink = HttpLogSink::new(server.uri());

    for (status, expected) in [(404u16, "missing"), (503, "transient"), (429, "transient"), (400, "permanent")] {
        server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = sink.deliver("app", "test-stream", &[record(0)]).await.unwrap_err();
        let kind = match err {
            DeliveryError::DestinationMissing(_) => "missing",
            DeliveryError::Transient(_) => "transient",
            DeliveryError::Permanent(_) => "permanent",
            DeliveryError::Timeout(_) => "timeout",
        };
        assert_eq!(kind, expected, "status {status}");
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transient_failure() {
    // nothing listens on the discard port
    let sink = HttpLogSink::new("http://127.0.0.1:9");
    let err = sink.deliver("app", "test-stream", &[record(0)]).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn batching_sink_creates_the_stream_then_delivers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let self_log = Arc::new(MemorySelfLog::new());
    let config = serverless_log_sink::SinkConfig {
        log_group: "app".to_string(),
        ..quiet_config()
    };
    let batching = BatchingSink::with_self_log(Arc::new(HttpLogSink::new(server.uri())), config, self_log.clone());

    batching.emit(record(0));
    batching.shutdown().await;

    assert_eq!(batching.stats().delivered, 1);
    assert_eq!(self_log.count_containing("created log stream app/test-stream"), 1);
}
