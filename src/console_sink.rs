use crate::error::DeliveryError;
use crate::formatter::compact_json_line;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use std::io::Write;

/// Writes every batch to stdout as compact JSON lines.
///
/// Inside a function runtime stdout is usually captured by the platform's
/// own log service, so this is the zero-configuration backend.
#[derive(Clone, Default)]
pub struct ConsoleSink;

#[async_trait]
impl LogSink for ConsoleSink {
    async fn deliver(&self, _destination: &str, _stream: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        let mut out = std::io::stdout().lock();
        for record in records {
            writeln!(out, "{}", compact_json_line(record))
                .map_err(|e| DeliveryError::Transient(format!("stdout write failed: {e}")))?;
        }
        out.flush()
            .map_err(|e| DeliveryError::Transient(format!("stdout flush failed: {e}")))
    }

    async fn create_destination(&self, _destination: &str, _stream: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}
