pub mod record;
pub mod error;
pub mod sink;
pub mod queue;
pub mod selflog;
pub mod stream_name;
pub mod config;
pub mod batching;
pub mod layer;
pub mod formatter;

#[cfg(feature = "http")]
pub mod http;

pub mod backend;
pub mod console_sink;
pub mod env;
pub mod init;
pub mod noop_sink;

pub use batching::{BatchingSink, SinkState, StatsSnapshot};
pub use config::SinkConfig;
pub use error::DeliveryError;
pub use record::LogRecord;
pub use sink::LogSink;
