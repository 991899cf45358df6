//! Host probes: memory, disk, TCP connections and hostname
//!
//! Plain polling wrappers around `sysinfo` and the OS socket tables. Every
//! probe degrades to zero values instead of failing.

use std::fs;
use std::path::{Path, PathBuf};

use sysinfo::{Disks, System};
use tracing::debug;

use crate::platform::traits::PlatformResult;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Physical memory usage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryUsage {
    pub used_percent: f64,
    pub used_mb: f64,
}

impl MemoryUsage {
    pub fn from_bytes(total: u64, used: u64) -> Self {
        if total == 0 {
            return Self::default();
        }
        Self {
            used_percent: (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0),
            used_mb: used as f64 / BYTES_PER_MB,
        }
    }
}

/// Usage of the filesystem holding a path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskUsage {
    pub used_percent: f64,
    pub free_gb: f64,
}

impl DiskUsage {
    pub fn from_bytes(total: u64, available: u64) -> Self {
        if total == 0 {
            return Self::default();
        }
        let used = total.saturating_sub(available);
        Self {
            used_percent: used as f64 / total as f64 * 100.0,
            free_gb: available as f64 / BYTES_PER_GB,
        }
    }
}

/// Pick the mounted filesystem containing `path` (longest mount point wins).
pub fn select_disk<'a, I>(mounts: I, path: &Path) -> Option<DiskUsage>
where
    I: IntoIterator<Item = (&'a Path, u64, u64)>,
{
    mounts
        .into_iter()
        .filter(|(mount, _, _)| path.starts_with(mount))
        .max_by_key(|(mount, _, _)| mount.as_os_str().len())
        .map(|(_, total, available)| DiskUsage::from_bytes(total, available))
}

/// Disk path probed when none is configured.
pub fn default_disk_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

/// Count `tcp*` rows in `netstat -an` output.
pub fn count_netstat_tcp(output: &str) -> usize {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|proto| proto.to_ascii_lowercase().starts_with("tcp"))
        .count()
}

#[cfg(target_os = "linux")]
fn tcp_connections() -> PlatformResult<usize> {
    crate::platform::linux::tcp_connection_count()
}

#[cfg(not(target_os = "linux"))]
fn tcp_connections() -> PlatformResult<usize> {
    use crate::platform::traits::PlatformError;
    use std::process::Command;

    #[cfg(windows)]
    let protocols: &[&str] = &["TCP", "TCPv6"];
    #[cfg(not(windows))]
    let protocols: &[&str] = &["tcp"];

    let mut count = 0;
    for proto in protocols {
        let output = Command::new("netstat")
            .args(["-an", "-p", proto])
            .output()?;
        if !output.status.success() {
            return Err(PlatformError::SystemError {
                code: output.status.code().unwrap_or(-1),
                message: format!("netstat -p {} failed", proto),
            });
        }
        count += count_netstat_tcp(&String::from_utf8_lossy(&output.stdout));
    }
    Ok(count)
}

/// Resolve the hostname reported with every sample.
///
/// A non-empty `hostname_file` wins (containers mount the host's
/// `/etc/hostname` there), then the OS hostname, then `"unknown"`.
pub fn resolve_hostname(hostname_file: Option<&Path>) -> String {
    if let Some(path) = hostname_file {
        if let Ok(content) = fs::read_to_string(path) {
            let name = content.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    System::host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reusable handles for the memory and disk probes.
pub struct HostProbe {
    sys: System,
    disks: Disks,
    disk_path: PathBuf,
}

impl HostProbe {
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self {
            sys: System::new(),
            disks: Disks::new_with_refreshed_list(),
            disk_path: disk_path.into(),
        }
    }

    pub fn memory(&mut self) -> MemoryUsage {
        self.sys.refresh_memory();
        MemoryUsage::from_bytes(self.sys.total_memory(), self.sys.used_memory())
    }

    pub fn disk(&mut self) -> DiskUsage {
        self.disks.refresh_list();
        let mounts = self
            .disks
            .list()
            .iter()
            .map(|d| (d.mount_point(), d.total_space(), d.available_space()));

        select_disk(mounts, &self.disk_path).unwrap_or_else(|| {
            debug!("no disk mounted at {}", self.disk_path.display());
            DiskUsage::default()
        })
    }

    pub fn tcp_connections(&self) -> usize {
        tcp_connections().unwrap_or_else(|e| {
            debug!("tcp connection count unavailable: {}", e);
            0
        })
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new(default_disk_path())
    }
}
