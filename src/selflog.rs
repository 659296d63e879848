//! Self-diagnostic channel of the batching sink.
//!
//! Everything the sink wants to say about its own health (ticks, batch
//! sizes, drops, failed deliveries) goes through a [`SelfLog`] instead of the
//! application's log stream, so a misbehaving sink stays visible without
//! feeding records back into itself.

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::io::Write;

/// `tracing` target used by [`TracingSelfLog`]. The batching layer ignores
/// events with this target.
pub const SELFLOG_TARGET: &str = "serverless_log_sink::selflog";

/// Synchronous, non-failing sink for diagnostic lines.
pub trait SelfLog: Send + Sync {
    fn write_line(&self, message: &str);
}

/// Writes timestamped lines to the process standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSelfLog;

impl SelfLog for StderrSelfLog {
    fn write_line(&self, message: &str) {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        // stderr being closed is not worth failing over
        let _ = writeln!(std::io::stderr().lock(), "{now} {message}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySelfLog {
    lines: Mutex<Vec<String>>,
}

impl MemorySelfLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all lines written so far, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|l| l.contains(needle)).count()
    }
}

impl SelfLog for MemorySelfLog {
    fn write_line(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// Re-emits diagnostics as `tracing` events on [`SELFLOG_TARGET`], so they
/// show up in the console layer next to the application logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSelfLog;

impl SelfLog for TracingSelfLog {
    fn write_line(&self, message: &str) {
        tracing::debug!(target: SELFLOG_TARGET, "{}", message);
    }
}
