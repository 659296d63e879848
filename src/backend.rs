use std::sync::Arc;

use crate::sink::LogSink;

/// Supported backend kinds that can be selected via DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Console,
    Noop,
}

/// High-level backend configuration built from a DSN.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Selected backend implementation.
    pub kind: BackendKind,
    /// Raw DSN that was used to construct this config.
    pub dsn: String,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, dsn: impl Into<String>) -> Self {
        BackendConfig { kind, dsn: dsn.into() }
    }
}

/// Parse a DSN string and infer the backend kind from its scheme.
///
/// Examples:
/// - "https://logs.internal:8443" (log-group service base URL)
/// - "console://"
/// - "noop://"
pub fn parse_dsn(dsn: &str) -> Result<BackendConfig, DsnError> {
    let lower = dsn.trim().to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(BackendConfig::new(BackendKind::Http, dsn.trim()))
    } else if lower.starts_with("console://") {
        Ok(BackendConfig::new(BackendKind::Console, dsn.trim()))
    } else if lower.starts_with("noop://") {
        Ok(BackendConfig::new(BackendKind::Noop, dsn.trim()))
    } else {
        Err(DsnError::UnknownScheme(dsn.to_string()))
    }
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme: {0}")]
    UnknownScheme(String),
}

/// Error type returned when building a backend sink from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error("http feature is not enabled")]
    HttpFeatureDisabled,
}

/// Create a concrete `LogSink` implementation from a `BackendConfig`.
///
/// This is the main entry point for applications that want to select
/// a backend using a single DSN string instead of constructing sinks
/// manually.
pub fn make_sink_from_config(cfg: &BackendConfig) -> Result<Arc<dyn LogSink>, BackendBuildError> {
    match cfg.kind {
        BackendKind::Http => {
            #[cfg(feature = "http")]
            {
                use crate::http::HttpLogSink;

                // The DSN is the service base URL as-is.
                Ok(Arc::new(HttpLogSink::new(cfg.dsn.clone())) as Arc<dyn LogSink>)
            }

            #[cfg(not(feature = "http"))]
            {
                Err(BackendBuildError::HttpFeatureDisabled)
            }
        }
        BackendKind::Console => Ok(Arc::new(crate::console_sink::ConsoleSink) as Arc<dyn LogSink>),
        BackendKind::Noop => Ok(Arc::new(crate::noop_sink::NoopSink) as Arc<dyn LogSink>),
    }
}
