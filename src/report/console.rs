//! Console sink used in debug mode

use std::io::{self, Stdout, Write};

use super::{HostMetrics, MetricsSink, ReportError};

/// Render one sample as the framed debug block.
pub fn format_metrics(m: &HostMetrics) -> String {
    format!(
        "===== System Metrics =====\n\
         Timestamp: {}\n\
         Hostname: {}\n\
         CPU Usage: {:.2}%\n\
         Memory Usage: {:.2}%\n\
         Memory Usage: {:.2} MB\n\
         Disk Usage: {:.2}%\n\
         Disk Free: {:.2} GB\n\
         Network RX: {} Bytes/s\n\
         Network TX: {} Bytes/s\n\
         TCP Connections: {}\n\
         ==========================\n",
        m.timestamp,
        m.hostname,
        m.cpu_percent,
        m.memory_percent,
        m.memory_mb,
        m.disk_percent,
        m.disk_free_gb,
        m.network_rx_bps,
        m.network_tx_bps,
        m.tcp_connections,
    )
}

/// Writes each sample to a terminal (or any writer).
pub struct ConsoleSink<W: Write = Stdout> {
    out: W,
}

impl ConsoleSink<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricsSink for ConsoleSink<W> {
    async fn report(&mut self, metrics: &HostMetrics) -> Result<(), ReportError> {
        self.out.write_all(format_metrics(metrics).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_metrics;

    #[test]
    fn test_format_metrics() {
        let text = format_metrics(&sample_metrics());
        assert!(text.starts_with("===== System Metrics =====\n"));
        assert!(text.contains("Hostname: web-01\n"));
        assert!(text.contains("CPU Usage: 12.50%\n"));
        assert!(text.contains("Disk Free: 120.25 GB\n"));
        assert!(text.contains("Network RX: 100000 Bytes/s\n"));
        assert!(text.contains("TCP Connections: 42\n"));
        assert!(text.ends_with("==========================\n"));
    }

    #[tokio::test]
    async fn test_report_writes_block() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.report(&sample_metrics()).await.unwrap();
        sink.report(&sample_metrics()).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.matches("===== System Metrics =====").count(), 2);
    }
}
