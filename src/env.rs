/// Environment variable names used by this crate for convenient
/// configuration of the sink from a function's environment.
///
/// These are purely helpers; the core sink types remain decoupled from
/// environment access.

/// Backend DSN, e.g. `https://logs.internal:8443` or `console://`.
pub const LOG_SINK_DSN_ENV: &str = "LOG_SINK_DSN";

/// Remote log group the batches are delivered to.
pub const LOG_SINK_GROUP_ENV: &str = "LOG_SINK_GROUP";

/// Minimum accepted level (`trace`, `debug`, `info`, `warn`, `error`).
pub const LOG_SINK_MIN_LEVEL_ENV: &str = "LOG_SINK_MIN_LEVEL";

pub const LOG_SINK_BATCH_SIZE_ENV: &str = "LOG_SINK_BATCH_SIZE";

pub const LOG_SINK_QUEUE_SIZE_ENV: &str = "LOG_SINK_QUEUE_SIZE";

/// Flush period in milliseconds.
pub const LOG_SINK_PERIOD_MS_ENV: &str = "LOG_SINK_PERIOD_MS";

pub const LOG_SINK_RETRY_ATTEMPTS_ENV: &str = "LOG_SINK_RETRY_ATTEMPTS";

/// `true`/`false`: create the group/stream when it is missing.
pub const LOG_SINK_CREATE_GROUP_ENV: &str = "LOG_SINK_CREATE_GROUP";

/// Fixed stream name; when unset a fresh name is generated per start.
pub const LOG_SINK_STREAM_NAME_ENV: &str = "LOG_SINK_STREAM_NAME";

/// Optional logical service name stamped on every record.
pub const LOG_SINK_SERVICE_NAME_ENV: &str = "LOG_SINK_SERVICE_NAME";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
