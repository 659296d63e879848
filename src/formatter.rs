//! Compact JSON rendering of [`LogRecord`]s.
//!
//! One record becomes one flat JSON object: `@t` (RFC 3339 timestamp),
//! `@m` (message), `@l` (level, omitted for `INFO`), then the source
//! location and properties. Property names starting with `@` are escaped by
//! doubling the `@` so they cannot collide with the reserved keys.

use crate::record::LogRecord;
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::Level;

pub fn compact_json(record: &LogRecord) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "@t".to_string(),
        Value::String(record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    if let Some(message) = &record.message {
        obj.insert("@m".to_string(), Value::String(message.clone()));
    }
    if record.level != Level::INFO {
        obj.insert("@l".to_string(), Value::String(record.level.as_str().to_string()));
    }
    if !record.target.is_empty() {
        obj.insert("SourceContext".to_string(), Value::String(record.target.clone()));
    }
    if let Some(service) = &record.service_name {
        obj.insert("ServiceName".to_string(), Value::String(service.clone()));
    }
    for (key, value) in &record.properties {
        let key = if key.starts_with('@') {
            format!("@{key}")
        } else {
            key.clone()
        };
        obj.insert(key, value.clone());
    }
    Value::Object(obj)
}

/// [`compact_json`] serialized to a single line.
pub fn compact_json_line(record: &LogRecord) -> String {
    compact_json(record).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_records_omit_the_level() {
        let record = LogRecord::new(Level::INFO, "Retrieve values");
        let json = compact_json(&record);

        assert_eq!(json["@m"], "Retrieve values");
        assert!(json.get("@l").is_none());
        assert!(json["@t"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn other_levels_and_properties_are_rendered() {
        let record = LogRecord::new(Level::ERROR, "order failed")
            .with_target("orders::api")
            .with_property("order_id", 123)
            .with_property("@t", "spoofed");
        let json = compact_json(&record);

        assert_eq!(json["@l"], "ERROR");
        assert_eq!(json["SourceContext"], "orders::api");
        assert_eq!(json["order_id"], 123);
        assert_eq!(json["@@t"], "spoofed");
        assert_ne!(json["@t"], "spoofed");
    }

    #[test]
    fn line_form_has_no_newlines() {
        let record = LogRecord::new(Level::WARN, "multi\nline");
        let line = compact_json_line(&record);
        assert!(!line.contains('\n'));
    }
}
