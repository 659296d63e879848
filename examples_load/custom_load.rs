use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::error;

use serverless_log_sink::init::{init_tracing_with_config, LayerConfig};
use serverless_log_sink::noop_sink::NoopSink;
use serverless_log_sink::queue::OverflowPolicy;
use serverless_log_sink::selflog::MemorySelfLog;
use serverless_log_sink::SinkConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let self_log = Arc::new(MemorySelfLog::new());

    let layer_config = LayerConfig {
        sink: SinkConfig {
            queue_size_limit: 50_000,
            batch_size_limit: 1_000,
            period: Duration::from_millis(200),
            overflow_policy: OverflowPolicy::DropOldest,
            ..SinkConfig::default()
        },
        enable_stdout: false,
        service_name: Some("load-test".to_string()),
        self_log: Some(self_log.clone()),
    };

    let sink = init_tracing_with_config(Arc::new(NoopSink), layer_config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "custom load test error");
    }

    let elapsed = start.elapsed();
    println!("custom config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sink.shutdown().await;
    let stats = sink.stats();
    println!(
        "delivered {} records, dropped {} on overflow, {} diagnostic lines",
        stats.delivered,
        stats.dropped_overflow,
        self_log.lines().len()
    );
    Ok(())
}
