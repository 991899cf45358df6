//! Seq HTTP sink
//!
//! Posts each event as a single CLEF JSON document to `/ingest/clef`.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{HostMetrics, MetricsSink, ReportError};

pub const API_KEY_HEADER: &str = "X-Seq-ApiKey";

/// Longest response body kept in an error.
const MAX_ERROR_BODY: usize = 512;

/// Client for the Seq ingestion API
pub struct SeqSink {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl SeqSink {
    /// Create a new Seq sink for `base_url` (e.g. `http://seq:5341`)
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(base_url, api_key, client))
    }

    /// Use a preconfigured client (proxy, TLS or timeout settings).
    pub fn with_client(base_url: &str, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: format!("{}/ingest/clef", base_url.trim().trim_end_matches('/')),
            api_key,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl MetricsSink for SeqSink {
    async fn report(&mut self, metrics: &HostMetrics) -> Result<(), ReportError> {
        let body = serde_json::to_vec(metrics)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("Seq accepted event ({})", status);
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(ReportError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_metrics;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one request, answer with `status_line`, return the raw request.
    async fn one_shot_server(status_line: &'static str, reply: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                reply.len(),
                reply
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn local_sink(url: &str, api_key: Option<String>) -> SeqSink {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        SeqSink::with_client(url, api_key, client)
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let sink = SeqSink::new("http://seq:5341/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(sink.endpoint(), "http://seq:5341/ingest/clef");
    }

    #[tokio::test]
    async fn test_posts_clef_json() {
        let (url, server) = one_shot_server("201 Created", "").await;
        let mut sink = local_sink(&url, Some("secret".into()));

        sink.report(&sample_metrics()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /ingest/clef HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.to_ascii_lowercase().contains("x-seq-apikey: secret"));
        assert!(request.contains("\"@mt\":\"System Metrics from {Hostname}\""));
        assert!(request.contains("\"Hostname\":\"web-01\""));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (url, server) = one_shot_server("400 Bad Request", "invalid event").await;
        let mut sink = local_sink(&url, None);

        let err = sink.report(&sample_metrics()).await.unwrap_err();
        server.await.unwrap();
        match err {
            ReportError::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "invalid event");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut sink = local_sink(&format!("http://{}", addr), None);
        let err = sink.report(&sample_metrics()).await.unwrap_err();
        assert!(matches!(err, ReportError::Transport(_)));
    }
}
