use crate::error::DeliveryError;
use crate::record::LogRecord;
use async_trait::async_trait;

/// Asynchronous destination for batches of [`LogRecord`]s.
///
/// Implementations are responsible for transporting records to a concrete
/// backend (an HTTP log service, stdout, etc). The batching sink calls
/// `deliver` from its background task and never awaits it on the
/// application thread.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver one batch to `stream` inside log group `destination`.
    ///
    /// **Parameters**
    /// - `destination`: log group name from the sink configuration.
    /// - `stream`: stream name resolved when the sink started.
    /// - `records`: batch in enqueue order; never empty.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the whole batch.
    /// - `Err(DeliveryError::Transient(..))` for failures worth retrying.
    /// - `Err(DeliveryError::DestinationMissing(..))` if the group or
    ///   stream does not exist yet.
    /// - `Err(DeliveryError::Permanent(..))` for anything that will never
    ///   succeed.
    ///
    /// The caller bounds this call with a timeout, so implementations may
    /// be cancelled at any await point.
    async fn deliver(
        &self,
        destination: &str,
        stream: &str,
        records: &[LogRecord],
    ) -> Result<(), DeliveryError>;

    /// Create the log group and stream.
    ///
    /// Called at most once per failed delivery, and only when the sink is
    /// configured to auto-create. Default implementation reports that the
    /// backend cannot create destinations.
    async fn create_destination(&self, destination: &str, stream: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::Permanent(format!(
            "backend cannot create {destination}/{stream}"
        )))
    }
}
