//! Reporting sinks
//!
//! The sampling loop hands one [`HostMetrics`] event per tick to a
//! [`MetricsSink`]. Events use Seq's compact log event format (CLEF), so
//! the `@t`/`@mt` properties are the timestamp and message template.

pub mod console;
pub mod seq;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use console::ConsoleSink;
pub use seq::SeqSink;

pub const MESSAGE_TEMPLATE: &str = "System Metrics from {Hostname}";

/// One sample as delivered to Seq.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    #[serde(rename = "@t")]
    pub timestamp: String,
    #[serde(rename = "@mt")]
    pub message_template: String,
    #[serde(rename = "Application")]
    pub application: String,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "CPU_Percent")]
    pub cpu_percent: f64,
    #[serde(rename = "Memory_Percent")]
    pub memory_percent: f64,
    #[serde(rename = "Memory_MB")]
    pub memory_mb: f64,
    #[serde(rename = "Disk_Percent")]
    pub disk_percent: f64,
    #[serde(rename = "Disk_Free_GB")]
    pub disk_free_gb: f64,
    #[serde(rename = "Network_RX_BPS")]
    pub network_rx_bps: u64,
    #[serde(rename = "Network_TX_BPS")]
    pub network_tx_bps: u64,
    #[serde(rename = "TCP_Connections")]
    pub tcp_connections: usize,
}

/// Errors from delivering a sample.
#[derive(Debug)]
pub enum ReportError {
    /// The event could not be encoded
    Serialize(String),
    /// The request never produced a response
    Transport(String),
    /// The endpoint answered with a non-2xx status
    Http { status: u16, body: String },
    /// Writing to the console failed
    Io(std::io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(msg) => write!(f, "JSON encoding failed: {}", msg),
            ReportError::Transport(msg) => write!(f, "Sending to Seq failed: {}", msg),
            ReportError::Http { status, body } => {
                write!(f, "Seq rejected the event (HTTP {}): {}", status, body)
            }
            ReportError::Io(err) => write!(f, "Console output failed: {}", err),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialize(err.to_string())
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Destination for computed samples.
#[allow(async_fn_in_trait)]
pub trait MetricsSink {
    async fn report(&mut self, metrics: &HostMetrics) -> Result<(), ReportError>;
}

/// Either sink, chosen at startup from the `debug` flag.
pub enum Reporter {
    Seq(SeqSink),
    Console(ConsoleSink),
}

impl Reporter {
    pub fn from_config(config: &crate::core::config::MonitorConfig) -> Result<Self, ReportError> {
        if config.debug {
            Ok(Reporter::Console(ConsoleSink::stdout()))
        } else {
            Ok(Reporter::Seq(SeqSink::new(
                &config.seq_url,
                config.seq_api_key.clone(),
                config.request_timeout,
            )?))
        }
    }
}

impl MetricsSink for Reporter {
    async fn report(&mut self, metrics: &HostMetrics) -> Result<(), ReportError> {
        match self {
            Reporter::Seq(sink) => sink.report(metrics).await,
            Reporter::Console(sink) => sink.report(metrics).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_metrics() -> HostMetrics {
        HostMetrics {
            timestamp: "2024-05-01T12:00:00+02:00".into(),
            message_template: MESSAGE_TEMPLATE.into(),
            application: "Monitor".into(),
            hostname: "web-01".into(),
            cpu_percent: 12.5,
            memory_percent: 40.0,
            memory_mb: 2048.0,
            disk_percent: 55.5,
            disk_free_gb: 120.25,
            network_rx_bps: 100_000,
            network_tx_bps: 2_000,
            tcp_connections: 42,
        }
    }

    #[test]
    fn test_clef_field_names() {
        let value = serde_json::to_value(sample_metrics()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "@t",
            "@mt",
            "Application",
            "Hostname",
            "CPU_Percent",
            "Memory_Percent",
            "Memory_MB",
            "Disk_Percent",
            "Disk_Free_GB",
            "Network_RX_BPS",
            "Network_TX_BPS",
            "TCP_Connections",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj.len(), 12);
        assert_eq!(value["@mt"], "System Metrics from {Hostname}");
        assert_eq!(value["Network_RX_BPS"], 100_000);
    }

    #[test]
    fn test_report_error_display() {
        let err = ReportError::Http {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Seq rejected the event (HTTP 503): unavailable"
        );
    }

    #[test]
    fn test_reporter_follows_debug_flag() {
        let mut config = crate::core::config::MonitorConfig::default();
        config.debug = true;
        assert!(matches!(Reporter::from_config(&config), Ok(Reporter::Console(_))));
        config.debug = false;
        assert!(matches!(Reporter::from_config(&config), Ok(Reporter::Seq(_))));
    }
}
