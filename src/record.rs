use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::Level;

/// A single log event as seen by the batching sink.
///
/// Records are built once (by [`crate::layer::BatchingLayer`] or directly by
/// application code) and never mutated afterwards; the sink only moves them
/// from its queue into batches.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_level")]
    pub level: Level,
    pub target: String,
    pub module_path: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: Option<String>,
    pub properties: BTreeMap<String, serde_json::Value>,
    pub service_name: Option<String>,
}

impl LogRecord {
    /// Build a record stamped with the current time and no source location.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level,
            target: String::new(),
            module_path: None,
            file: None,
            line: None,
            message: Some(message.into()),
            properties: BTreeMap::new(),
            service_name: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

fn serialize_level<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(level.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_level_as_plain_string() {
        let record = LogRecord::new(Level::WARN, "disk almost full").with_property("free_mb", 12);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["level"], "WARN");
        assert_eq!(json["message"], "disk almost full");
        assert_eq!(json["properties"]["free_mb"], 12);
    }
}
