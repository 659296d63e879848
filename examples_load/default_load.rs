use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use serverless_log_sink::init::{init_tracing_with_config, LayerConfig};
use serverless_log_sink::noop_sink::NoopSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sink = init_tracing_with_config(Arc::new(NoopSink), LayerConfig::default())?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "default load test error");
    }

    let elapsed = start.elapsed();
    println!("default config: sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    sink.shutdown().await;
    println!("{:?}", sink.stats());
    Ok(())
}
