//! Simulates a function host that freezes the process between invocations.
//!
//! While "frozen" (a blocking sleep on the runtime's only thread) the flush
//! timer cannot run, so the diagnostic log shows a gap in the
//! `empty batch (timer)` lines. Records logged during an invocation still
//! reach the backend because the handler flushes before returning.

use std::sync::Arc;
use std::time::Duration;

use serverless_log_sink::console_sink::ConsoleSink;
use serverless_log_sink::layer::BatchingLayer;
use serverless_log_sink::selflog::MemorySelfLog;
use serverless_log_sink::{BatchingSink, SinkConfig};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

async fn handle_invocation(sink: &BatchingSink, n: u32) -> Vec<&'static str> {
    info!(invocation = n, "Retrieve values");
    let values = vec!["value1", "value2"];
    // ship before handing control back to the host
    sink.flush().await;
    values
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let self_log = Arc::new(MemorySelfLog::new());
    let sink = BatchingSink::with_self_log(
        Arc::new(ConsoleSink),
        SinkConfig {
            period: Duration::from_millis(250),
            ..SinkConfig::default()
        },
        self_log.clone(),
    );
    tracing::subscriber::set_global_default(Registry::default().with(BatchingLayer::new(sink.clone())))?;

    for n in 0..3 {
        let values = handle_invocation(&sink, n).await;
        println!("invocation {n} returned {values:?}");

        // host is idle but awake: ticks keep coming
        tokio::time::sleep(Duration::from_secs(1)).await;
        // host freezes the process: no ticks at all
        std::thread::sleep(Duration::from_secs(2));
    }

    sink.shutdown().await;
    for line in self_log.lines() {
        eprintln!("selflog: {line}");
    }
    Ok(())
}
