use crate::error::DeliveryError;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;

/// A sink that simply drops all batches.
///
/// Useful for measuring the overhead of the batching sink itself without
/// any external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn deliver(&self, _destination: &str, _stream: &str, _records: &[LogRecord]) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn create_destination(&self, _destination: &str, _stream: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}
