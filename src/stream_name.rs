use chrono::Utc;
use std::fmt;

/// Strategy that names the log stream a sink writes into.
///
/// The batching sink asks for a name once, when it starts.
pub trait LogStreamNameProvider: Send + Sync + fmt::Debug {
    fn stream_name(&self) -> String;
}

/// `<yyyy-MM-dd-HH-mm-ss>_<hostname>_<uuid>`, all parts taken at call time.
///
/// Every cold start of a function instance gets its own stream, so
/// concurrent instances never interleave writes into the same stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLogStreamProvider;

impl LogStreamNameProvider for DefaultLogStreamProvider {
    fn stream_name(&self) -> String {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        format!(
            "{}_{}_{}",
            Utc::now().format("%Y-%m-%d-%H-%M-%S"),
            host,
            uuid::Uuid::new_v4()
        )
    }
}

/// Always returns the same, caller-chosen name.
#[derive(Clone, Debug)]
pub struct ConstantLogStreamProvider {
    name: String,
}

impl ConstantLogStreamProvider {
    pub fn new(name: impl Into<String>) -> Self {
        ConstantLogStreamProvider { name: name.into() }
    }
}

impl LogStreamNameProvider for ConstantLogStreamProvider {
    fn stream_name(&self) -> String {
        self.name.clone()
    }
}
