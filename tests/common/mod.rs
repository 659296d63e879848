#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serverless_log_sink::stream_name::ConstantLogStreamProvider;
use serverless_log_sink::{DeliveryError, LogRecord, LogSink, SinkConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// How a [`RecordingSink`] answers `deliver`.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    Succeed,
    Transient,
    Permanent,
    /// `DestinationMissing` until `create_destination` was called.
    MissingUntilCreated,
    /// Never completes.
    Hang,
}

pub struct RecordingSink {
    behavior: Behavior,
    delay: Duration,
    batches: Mutex<Vec<Vec<LogRecord>>>,
    deliver_calls: AtomicUsize,
    create_calls: AtomicUsize,
    created: AtomicBool,
    in_flight: AtomicBool,
    overlaps: AtomicUsize,
}

impl RecordingSink {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_delay(behavior, Duration::ZERO)
    }

    pub fn with_delay(behavior: Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(RecordingSink {
            behavior,
            delay,
            batches: Mutex::new(Vec::new()),
            deliver_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            created: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
        })
    }

    pub fn batches(&self) -> Vec<Vec<LogRecord>> {
        self.batches.lock().clone()
    }

    /// `seq` property of every delivered record, in delivery order.
    pub fn delivered_seqs(&self) -> Vec<u64> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|r| r.properties["seq"].as_u64().unwrap())
            .collect()
    }

    pub fn deliver_calls(&self) -> usize {
        self.deliver_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn deliver(&self, _destination: &str, _stream: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        self.deliver_calls.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Transient => Err(DeliveryError::Transient("service unavailable".into())),
            Behavior::Permanent => Err(DeliveryError::Permanent("invalid payload".into())),
            Behavior::MissingUntilCreated => {
                if self.created.load(Ordering::SeqCst) {
                    Ok(())
                } else {
                    Err(DeliveryError::DestinationMissing("group/stream".into()))
                }
            }
            Behavior::Hang => std::future::pending().await,
        };

        if result.is_ok() {
            self.batches.lock().push(records.to_vec());
        }
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn create_destination(&self, _destination: &str, _stream: &str) -> Result<(), DeliveryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn record(seq: u64) -> LogRecord {
    LogRecord::new(Level::INFO, format!("record {seq}")).with_property("seq", seq)
}

/// Config with a timer far enough away that only explicit triggers flush.
pub fn quiet_config() -> SinkConfig {
    SinkConfig {
        period: Duration::from_secs(3600),
        retry_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(100),
        stream_name_provider: Arc::new(ConstantLogStreamProvider::new("test-stream")),
        ..SinkConfig::default()
    }
}
