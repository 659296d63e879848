use tracing::{error, info};
use serverless_log_sink::{
    backend::{make_sink_from_config, parse_dsn},
    env::{env_or, LOG_SINK_DSN_ENV},
    init::{init_tracing_with_config, LayerConfig},
    SinkConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example DSN: http://localhost:4566 (base URL of the log-group service)
    let dsn = env_or(LOG_SINK_DSN_ENV, "http://localhost:4566");

    let backend_cfg = parse_dsn(&dsn)?;
    let delivery = make_sink_from_config(&backend_cfg)?;

    let sink = init_tracing_with_config(
        delivery,
        LayerConfig {
            sink: SinkConfig::from_env()?,
            enable_stdout: true,
            ..LayerConfig::default()
        },
    )?;

    info!(stream = sink.stream_name(), "http backend example started");
    error!(order_id = 123, "simulated error sent via the log-group service");

    sink.shutdown().await;
    Ok(())
}
