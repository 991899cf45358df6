//! Sampling loop
//!
//! Owns the previous CPU/network snapshots, wakes once per interval, turns
//! each sample pair into utilization figures and hands the finished event to
//! a [`MetricsSink`]. A `watch` channel carries the stop signal.

use std::time::{Duration, Instant};

use chrono::{Local, SecondsFormat};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::delta::{self, UtilizationResult};
use super::host::{resolve_hostname, HostProbe};
use super::network::SysinfoNetworkSource;
use crate::core::config::MonitorConfig;
use crate::platform::traits::{CpuSnapshot, NetworkCounterSource, NetworkSnapshot, TickSource};
use crate::platform::create_tick_source;
use crate::report::{HostMetrics, MetricsSink, ReportError, Reporter, MESSAGE_TEMPLATE};

/// Snapshots carried from one tick to the next.
#[derive(Debug, Clone, Copy)]
pub struct SamplerState {
    pub prev_cpu: CpuSnapshot,
    pub prev_net: NetworkSnapshot,
    pub prev_time: Instant,
}

impl SamplerState {
    pub fn new(cpu: CpuSnapshot, net: NetworkSnapshot, at: Instant) -> Self {
        Self {
            prev_cpu: cpu,
            prev_net: net,
            prev_time: at,
        }
    }

    /// Compute utilization against the stored pair, then keep `cpu`/`net` as
    /// the new previous values.
    pub fn advance(&mut self, cpu: CpuSnapshot, net: NetworkSnapshot, now: Instant) -> UtilizationResult {
        let elapsed = now.saturating_duration_since(self.prev_time).as_secs_f64();
        let result = delta::compute(&self.prev_cpu, &cpu, &self.prev_net, &net, elapsed);

        self.prev_cpu = cpu;
        self.prev_net = net;
        self.prev_time = now;
        result
    }
}

pub struct Sampler<T: TickSource, N: NetworkCounterSource> {
    ticks: T,
    network: N,
    probe: HostProbe,
    hostname: String,
    application: String,
    state: SamplerState,
}

impl<T: TickSource, N: NetworkCounterSource> Sampler<T, N> {
    /// Take the initial snapshots so the first tick already has a pair.
    pub fn new(ticks: T, mut network: N, probe: HostProbe, hostname: String, application: String) -> Self {
        let state = SamplerState::new(ticks.sample(), network.sample(), Instant::now());
        Self {
            ticks,
            network,
            probe,
            hostname,
            application,
            state,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    /// Sample everything once and build the event.
    pub fn tick(&mut self) -> HostMetrics {
        let cpu = self.ticks.sample();
        let net = self.network.sample();
        let usage = self.state.advance(cpu, net, Instant::now());

        let memory = self.probe.memory();
        let disk = self.probe.disk();
        let tcp_connections = self.probe.tcp_connections();

        debug!(
            "cpu {:.2}% rx {} B/s tx {} B/s",
            usage.cpu_percent, usage.net_rx_bytes_per_sec, usage.net_tx_bytes_per_sec
        );

        HostMetrics {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message_template: MESSAGE_TEMPLATE.to_string(),
            application: self.application.clone(),
            hostname: self.hostname.clone(),
            cpu_percent: usage.cpu_percent,
            memory_percent: memory.used_percent,
            memory_mb: memory.used_mb,
            disk_percent: disk.used_percent,
            disk_free_gb: disk.free_gb,
            network_rx_bps: usage.net_rx_bytes_per_sec,
            network_tx_bps: usage.net_tx_bytes_per_sec,
            tcp_connections,
        }
    }

    /// Run until `shutdown` turns `true` or its sender goes away.
    ///
    /// A stop request interrupts the wait; no sample is emitted for it.
    pub async fn run<S: MetricsSink>(&mut self, interval: Duration, sink: &mut S, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Sampling every {:?} with {} for host {}",
            interval,
            self.ticks.name(),
            self.hostname
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let metrics = self.tick();
            if let Err(e) = sink.report(&metrics).await {
                error!("Failed to report metrics: {}", e);
            }
        }

        info!("Sampling stopped");
    }
}

/// Wire the platform sources and the configured sink together and sample
/// until `shutdown` fires.
pub async fn run_agent(config: &MonitorConfig, shutdown: watch::Receiver<bool>) -> Result<(), ReportError> {
    let mut reporter = Reporter::from_config(config)?;
    let hostname = resolve_hostname(config.hostname_file.as_deref());

    let mut sampler = Sampler::new(
        create_tick_source(),
        SysinfoNetworkSource::new(config.excluded_interfaces.clone()),
        HostProbe::new(config.disk_path.clone()),
        hostname,
        config.application.clone(),
    );

    sampler.run(config.interval, &mut reporter, shutdown).await;
    Ok(())
}
