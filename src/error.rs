use std::time::Duration;

/// Failure reported by a [`crate::sink::LogSink`] when delivering a batch.
///
/// The batching sink uses the variant to decide whether another attempt is
/// worth making; none of these ever reach application logging call sites.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Network hiccup, throttling or a 5xx from the log service.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The service rejected the batch and will keep rejecting it.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),

    /// The target log group or stream does not exist.
    #[error("destination does not exist: {0}")]
    DestinationMissing(String),

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl DeliveryError {
    /// Whether the same batch may succeed if delivered again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryError::Transient(_) | DeliveryError::Timeout(_))
    }
}

/// Error returned when a configuration value cannot be parsed.
#[derive(thiserror::Error, Debug)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

/// Error returned by the `init_tracing*` helpers.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    SubscriberAlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retried() {
        assert!(DeliveryError::Transient("503".into()).is_retryable());
        assert!(DeliveryError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!DeliveryError::Permanent("400".into()).is_retryable());
        assert!(!DeliveryError::DestinationMissing("group/stream".into()).is_retryable());
    }
}
