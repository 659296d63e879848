use crate::batching::BatchingSink;
use crate::config::SinkConfig;
use crate::error::InitError;
use crate::layer::BatchingLayer;
use crate::selflog::SelfLog;
use crate::sink::LogSink;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the logging pipeline installed by
/// [`init_tracing_with_config`].
///
/// **Fields**
/// - `sink`: [`SinkConfig`] of the batching sink (batching, retries,
///   destination).
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to the [`BatchingLayer`] and every event is also printed to
///   the console.
/// - `service_name`: optional service name stamped on every record.
/// - `self_log`: diagnostic channel of the sink; `None` means stderr.
#[derive(Clone, Default)]
pub struct LayerConfig {
    pub sink: SinkConfig,
    pub enable_stdout: bool,
    pub service_name: Option<String>,
    pub self_log: Option<Arc<dyn SelfLog>>,
}

/// Start a [`BatchingSink`] and install it as the global `tracing`
/// subscriber.
///
/// **Parameters**
/// - `delivery`: implementation of [`LogSink`] that receives the batches.
/// - `config`: [`LayerConfig`] controlling the sink and the console output.
///
/// **Returns**
/// - The running sink. Keep it: call [`BatchingSink::flush`] at the end of
///   each invocation and [`BatchingSink::shutdown`] before the process
///   exits.
/// - `Err(InitError::SubscriberAlreadySet)` if a global subscriber exists.
///
/// Must be called from within a Tokio runtime.
pub fn init_tracing_with_config(delivery: Arc<dyn LogSink>, config: LayerConfig) -> Result<BatchingSink, InitError> {
    let sink = match config.self_log {
        Some(self_log) => BatchingSink::with_self_log(delivery, config.sink, self_log),
        None => BatchingSink::new(delivery, config.sink),
    };

    let mut layer = BatchingLayer::new(sink.clone());
    if let Some(service_name) = config.service_name {
        layer = layer.with_service_name(service_name);
    }

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    let installed = if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = installed {
        // nobody will ever feed this sink
        let orphan = sink.clone();
        tokio::spawn(async move { orphan.shutdown().await });
        return Err(e.into());
    }
    Ok(sink)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with the default
/// [`SinkConfig`] and console output enabled.
pub fn init_tracing(delivery: Arc<dyn LogSink>) -> Result<BatchingSink, InitError> {
    init_tracing_with_config(
        delivery,
        LayerConfig {
            enable_stdout: true,
            ..LayerConfig::default()
        },
    )
}
