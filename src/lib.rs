//! hostmon - host resource sampler
//!
//! Periodically samples CPU time, network byte counters, memory, disk and
//! TCP connection counts, turns them into utilization figures and ships one
//! event per interval to Seq (or prints it in debug mode).
//!
//! ## Layout
//!
//! - **platform**: per-OS CPU tick sources behind [`platform::TickSource`]
//! - **monitor**: network counters, host probes, delta engine, sampling loop
//! - **report**: CLEF event type and the Seq / console sinks
//! - **core**: layered configuration
//! - **Windows service**: install/uninstall and the `hostmon-service` host

pub mod cli;
pub mod core;
pub mod monitor;
pub mod platform;
pub mod report;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

// Re-exports
pub use core::config::{ConfigError, ConfigOverrides, MonitorConfig};
pub use monitor::delta::UtilizationResult;
pub use monitor::{HostProbe, Sampler, SamplerState, SysinfoNetworkSource};
pub use platform::{
    create_tick_source, CpuSnapshot, NetworkCounterSource, NetworkSnapshot, PlatformError,
    PlatformResult, PlatformTickSource, TickSource,
};
pub use report::{HostMetrics, MetricsSink, ReportError, Reporter};
