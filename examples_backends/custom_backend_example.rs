use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use serverless_log_sink::{
    init::init_tracing,
    DeliveryError, LogRecord, LogSink,
};

/// Example of integrating a completely custom backend by implementing
/// the `LogSink` trait directly. Imagine this talks to some
/// proprietary log store for which this crate does not provide a
/// built-in sink.
struct MyCustomStoreSink;

#[async_trait]
impl LogSink for MyCustomStoreSink {
    async fn deliver(&self, destination: &str, stream: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        // Here you would call your own client library for the target store.
        // For the sake of example we just print the batch.
        println!("[my-custom-store] {destination}/{stream}: {} records", records.len());
        for record in records {
            println!("[my-custom-store]   {:?}", record.message);
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let delivery: Arc<dyn LogSink> = Arc::new(MyCustomStoreSink);

    let sink = init_tracing(delivery)?;

    info!("custom backend example started");
    error!(store = "my-custom-store", "simulated error sent via custom backend");

    sink.shutdown().await;
    Ok(())
}
