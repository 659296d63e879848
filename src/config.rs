use crate::env::*;
use crate::error::ConfigError;
use crate::queue::OverflowPolicy;
use crate::stream_name::{ConstantLogStreamProvider, DefaultLogStreamProvider, LogStreamNameProvider};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Configuration of a [`crate::batching::BatchingSink`].
///
/// **Fields**
/// - `log_group`: destination the batches are delivered to.
/// - `min_level`: records less severe than this are discarded on emit.
/// - `batch_size_limit`: maximum number of records per delivery call;
///   reaching it in the queue also triggers an immediate flush.
/// - `queue_size_limit`: records held in memory before overflow drops start.
/// - `period`: interval of the flush timer.
/// - `retry_attempts`: total delivery attempts per batch.
/// - `retry_backoff` / `max_backoff`: first delay between attempts and its
///   cap; the delay doubles after every failed attempt.
/// - `delivery_timeout`: bound on a single delivery call.
/// - `shutdown_timeout`: bound on the final flush.
/// - `create_destination`: create the group/stream when delivery reports it
///   missing.
/// - `overflow_policy`: which record to discard on a full queue.
/// - `stream_name_provider`: names the stream once per sink start.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub log_group: String,
    pub min_level: Level,
    pub batch_size_limit: usize,
    pub queue_size_limit: usize,
    pub period: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub max_backoff: Duration,
    pub delivery_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub create_destination: bool,
    pub overflow_policy: OverflowPolicy,
    pub stream_name_provider: Arc<dyn LogStreamNameProvider>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            log_group: "serverless-log-sink".to_string(),
            min_level: Level::INFO,
            batch_size_limit: 100,
            queue_size_limit: 10_000,
            period: Duration::from_secs(1),
            retry_attempts: 5,
            retry_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            delivery_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            create_destination: true,
            overflow_policy: OverflowPolicy::DropNewest,
            stream_name_provider: Arc::new(DefaultLogStreamProvider),
        }
    }
}

impl SinkConfig {
    /// Whether a record at `level` passes the `min_level` filter.
    pub fn accepts(&self, level: Level) -> bool {
        // tracing orders more verbose levels as greater
        level <= self.min_level
    }

    /// Enforce minimal thresholds to avoid degenerate configs.
    pub fn normalized(mut self) -> Self {
        self.queue_size_limit = self.queue_size_limit.max(1);
        self.batch_size_limit = self.batch_size_limit.clamp(1, self.queue_size_limit);
        self.retry_attempts = self.retry_attempts.max(1);
        if self.period < Duration::from_millis(10) {
            self.period = Duration::from_millis(10);
        }
        if self.max_backoff < self.retry_backoff {
            self.max_backoff = self.retry_backoff;
        }
        self
    }

    /// Build a config from `LOG_SINK_*` environment variables, starting from
    /// [`SinkConfig::default`] for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SinkConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SinkConfig::default();

        if let Some(group) = lookup(LOG_SINK_GROUP_ENV) {
            config.log_group = group;
        }
        if let Some(level) = parse(&lookup, LOG_SINK_MIN_LEVEL_ENV)? {
            config.min_level = level;
        }
        if let Some(n) = parse(&lookup, LOG_SINK_BATCH_SIZE_ENV)? {
            config.batch_size_limit = n;
        }
        if let Some(n) = parse(&lookup, LOG_SINK_QUEUE_SIZE_ENV)? {
            config.queue_size_limit = n;
        }
        if let Some(ms) = parse::<u64, _>(&lookup, LOG_SINK_PERIOD_MS_ENV)? {
            config.period = Duration::from_millis(ms);
        }
        if let Some(n) = parse(&lookup, LOG_SINK_RETRY_ATTEMPTS_ENV)? {
            config.retry_attempts = n;
        }
        if let Some(create) = parse(&lookup, LOG_SINK_CREATE_GROUP_ENV)? {
            config.create_destination = create;
        }
        if let Some(name) = lookup(LOG_SINK_STREAM_NAME_ENV) {
            config.stream_name_provider = Arc::new(ConstantLogStreamProvider::new(name));
        }

        Ok(config.normalized())
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
