use crate::error::DeliveryError;
use crate::formatter::compact_json_line;
use crate::record::LogRecord;
use crate::sink::LogSink;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// Log-group service sink speaking a small JSON-over-HTTP protocol.
///
/// A batch is posted to `<base>/log-groups/<group>/streams/<stream>/events`
/// as `{"logGroupName", "logStreamName", "logEvents": [{"timestamp",
/// "message"}]}`, where every message is the compact JSON rendering of one
/// record. The destination is created with
/// `PUT <base>/log-groups/<group>/streams/<stream>`.
#[derive(Clone)]
pub struct HttpLogSink {
    client: Client,
    /// Base URL of the log service, e.g. "http://localhost:4566".
    base_url: String,
}

impl HttpLogSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpLogSink {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn stream_url(&self, group: &str, stream: &str) -> String {
        format!(
            "{}/log-groups/{}/streams/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(group),
            urlencoding::encode(stream)
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PutLogEvents<'a> {
    log_group_name: &'a str,
    log_stream_name: &'a str,
    log_events: Vec<InputLogEvent>,
}

#[derive(Serialize)]
struct InputLogEvent {
    timestamp: i64,
    message: String,
}

/// Map a non-success HTTP status to the sink's failure kinds.
fn classify(status: StatusCode, body: String, what: &str) -> DeliveryError {
    let detail = format!("{what} failed with status {status}: {body}");
    if status == StatusCode::NOT_FOUND {
        DeliveryError::DestinationMissing(detail)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        DeliveryError::Transient(detail)
    } else {
        DeliveryError::Permanent(detail)
    }
}

fn transport(e: reqwest::Error) -> DeliveryError {
    DeliveryError::Transient(format!("request failed: {e}"))
}

#[async_trait]
impl LogSink for HttpLogSink {
    async fn deliver(&self, destination: &str, stream: &str, records: &[LogRecord]) -> Result<(), DeliveryError> {
        let body = PutLogEvents {
            log_group_name: destination,
            log_stream_name: stream,
            log_events: records
                .iter()
                .map(|r| InputLogEvent {
                    timestamp: r.timestamp.timestamp_millis(),
                    message: compact_json_line(r),
                })
                .collect(),
        };

        let url = format!("{}/events", self.stream_url(destination, stream));
        let resp = self.client.post(&url).json(&body).send().await.map_err(transport)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(classify(status, text, "log event upload"))
        }
    }

    async fn create_destination(&self, destination: &str, stream: &str) -> Result<(), DeliveryError> {
        let url = self.stream_url(destination, stream);
        let resp = self.client.put(&url).send().await.map_err(transport)?;

        // 409: someone else created it first
        if resp.status().is_success() || resp.status() == StatusCode::CONFLICT {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            match classify(status, text, "log stream creation") {
                // a 404 here means the service cannot create it
                DeliveryError::DestinationMissing(detail) => Err(DeliveryError::Permanent(detail)),
                other => Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_encodes_names() {
        let sink = HttpLogSink::new("http://localhost:4566/");
        assert_eq!(
            sink.stream_url("Serilog.Custom", "2024_host a"),
            "http://localhost:4566/log-groups/Serilog.Custom/streams/2024_host%20a"
        );
    }

    #[test]
    fn status_classification() {
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, String::new(), "x"),
            DeliveryError::DestinationMissing(_)
        ));
        assert!(classify(StatusCode::SERVICE_UNAVAILABLE, String::new(), "x").is_retryable());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, String::new(), "x").is_retryable());
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST, String::new(), "x"),
            DeliveryError::Permanent(_)
        ));
    }
}
