use crate::batching::BatchingSink;
use crate::record::LogRecord;
use crate::selflog::SELFLOG_TARGET;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`BatchingSink`].
///
/// Fields recorded on enclosing spans are merged into each record's
/// properties (root span first, so inner spans and finally the event's own
/// fields win). Events below the sink's minimum level are skipped before a
/// record is built. Events on the sink's own diagnostic target are ignored
/// so diagnostics never loop back into the sink.
pub struct BatchingLayer {
    sink: BatchingSink,
    service_name: Option<String>,
}

impl BatchingLayer {
    pub fn new(sink: BatchingSink) -> Self {
        BatchingLayer { sink, service_name: None }
    }

    /// Stamp every record with a logical service name.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    pub fn sink(&self) -> &BatchingSink {
        &self.sink
    }
}

/// Fields captured from a span, stored in the span's extensions.
struct SpanFields(BTreeMap<String, Value>);

impl<S> Layer<S> for BatchingLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = BTreeMap::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            let mut message = None;
            values.record(&mut FieldVisitor { fields, message: &mut message });
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == SELFLOG_TARGET || !self.sink.config().accepts(*meta.level()) {
            return;
        }

        let mut properties = BTreeMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    properties.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor { fields: &mut properties, message: &mut message };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level: *meta.level(),
            target: meta.target().to_string(),
            module_path: meta.module_path().map(|s| s.to_string()),
            file: meta.file().map(|s| s.to_string()),
            line: meta.line(),
            message,
            properties,
            service_name: self.service_name.clone(),
        };

        self.sink.emit(record);
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `info!("...")` hands the formatted message over as a Debug value
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
