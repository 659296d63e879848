mod common;

use common::{quiet_config, Behavior, RecordingSink};
use serverless_log_sink::layer::BatchingLayer;
use serverless_log_sink::selflog::{MemorySelfLog, TracingSelfLog, SELFLOG_TARGET};
use serverless_log_sink::{BatchingSink, SinkConfig};
use std::sync::Arc;
use tracing::{debug, error, info, info_span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[tokio::test]
async fn events_become_records_with_span_properties() {
    let sink = RecordingSink::new(Behavior::Succeed);
    let batching = BatchingSink::with_self_log(sink.clone(), quiet_config(), Arc::new(MemorySelfLog::new()));
    let subscriber = Registry::default().with(BatchingLayer::new(batching.clone()).with_service_name("values-api"));

    tracing::subscriber::with_default(subscriber, || {
        let span = info_span!("request", request_id = 7u64, route = "api/values");
        let _guard = span.enter();
        info!(value = "some-value", "Retrieve {}", "some-value");
        debug!("below the minimum level");
    });
    batching.flush().await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    let records = &batches[0];
    assert_eq!(records.len(), 1);

    let record = &records[0];
    assert_eq!(record.level, tracing::Level::INFO);
    assert_eq!(record.message.as_deref(), Some("Retrieve some-value"));
    assert_eq!(record.properties["value"], "some-value");
    assert_eq!(record.properties["request_id"], 7);
    assert_eq!(record.properties["route"], "api/values");
    assert_eq!(record.service_name.as_deref(), Some("values-api"));
    assert_eq!(record.target, module_path!());
    assert!(record.line.is_some());
}

#[tokio::test]
async fn event_fields_override_span_fields() {
    let sink = RecordingSink::new(Behavior::Succeed);
    let batching = BatchingSink::with_self_log(sink.clone(), quiet_config(), Arc::new(MemorySelfLog::new()));
    let subscriber = Registry::default().with(BatchingLayer::new(batching.clone()));

    tracing::subscriber::with_default(subscriber, || {
        let outer = info_span!("outer", attempt = 1u64, user = tracing::field::Empty);
        let _outer = outer.enter();
        outer.record("user", "alice");
        error!(attempt = 2u64, "order failed");
    });
    batching.flush().await;

    let record = &sink.batches()[0][0];
    assert_eq!(record.properties["attempt"], 2);
    assert_eq!(record.properties["user"], "alice");
}

#[tokio::test]
async fn diagnostic_events_do_not_loop_back_into_the_sink() {
    let sink = RecordingSink::new(Behavior::Succeed);
    let batching = BatchingSink::with_self_log(sink.clone(), quiet_config(), Arc::new(MemorySelfLog::new()));
    let subscriber = Registry::default().with(BatchingLayer::new(batching.clone()));

    tracing::subscriber::with_default(subscriber, || {
        error!(target: SELFLOG_TARGET, "queue full (3 records), dropped newest record");
    });
    batching.flush().await;

    assert_eq!(sink.deliver_calls(), 0);
    assert_eq!(batching.stats().received, 0);
}

#[tokio::test]
async fn tracing_selflog_diagnostics_stay_out_of_the_batches() {
    let sink = RecordingSink::new(Behavior::Succeed);
    let config = SinkConfig {
        queue_size_limit: 1,
        min_level: tracing::Level::DEBUG,
        ..quiet_config()
    };
    let batching = BatchingSink::with_self_log(sink.clone(), config, Arc::new(TracingSelfLog));
    let subscriber = Registry::default().with(BatchingLayer::new(batching.clone()));

    tracing::subscriber::with_default(subscriber, || {
        info!("kept");
        info!("dropped on overflow");
    });
    batching.flush().await;

    assert_eq!(batching.stats().dropped_overflow, 1);
    let batches = sink.batches();
    let records: Vec<_> = batches.iter().flatten().collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message.as_deref(), Some("kept"));
    assert!(records.iter().all(|r| r.target != SELFLOG_TARGET));
}
