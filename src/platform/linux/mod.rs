//! Linux Platform Support
//!
//! CPU accounting from `/proc/stat` with the USER_HZ rate from `sysconf`,
//! and TCP socket counts from `/proc/net`.

pub mod cpu;
pub mod tcp;

pub use cpu::{parse_proc_stat, LinuxTickSource, StatTicks, SysconfClockTicks, PROC_STAT_PATH};
pub use tcp::tcp_connection_count;

/// Get the Linux kernel version from /proc/version
pub fn kernel_version() -> Option<String> {
    std::fs::read_to_string("/proc/version").ok().map(|s| {
        s.split_whitespace()
            .nth(2)
            .unwrap_or("unknown")
            .to_string()
    })
}
