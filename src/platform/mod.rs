//! Platform Abstraction Layer for hostmon
//!
//! This module isolates everything that differs between operating systems
//! behind the [`TickSource`] and [`ClockTicksProvider`] capabilities.
//!
//! # Architecture
//!
//! The platform layer uses conditional compilation to select the appropriate
//! implementation at build time:
//!
//! ```text
//! src/platform/
//! +-- mod.rs           <- This file (variant dispatch)
//! +-- traits.rs        <- Snapshot types and capability traits
//! +-- ticks.rs         <- Portable unit normalization
//! +-- service.rs       <- Service install/uninstall front-end
//! +-- linux/           <- /proc/stat and /proc/net (cfg(linux))
//! src/macos/           <- Mach host statistics (cfg(macos))
//! src/windows/         <- GetSystemTimes and SCM (cfg(windows))
//! ```
//!
//! # Platform Support
//!
//! | Source | Linux | macOS | Windows | Other |
//! |--------|-------|-------|---------|-------|
//! | CPU ticks | `/proc/stat` | `host_statistics` | `GetSystemTimes` | zero |
//! | Tick rate | `sysconf` | `kern.clockrate` | fixed 100ns | - |
//! | TCP count | `/proc/net/tcp{,6}` | `netstat` | `netstat` | zero |
//! | Service | - | - | SCM | - |

// Core trait definitions - always available
pub mod service;
pub mod ticks;
pub mod traits;

pub use traits::{
    ClockTicksProvider, CpuSnapshot, FixedClockTicks, NetworkCounterSource, NetworkSnapshot,
    PlatformError, PlatformResult, TickSource,
};

// ============================================================================
// Linux Platform Implementation
// ============================================================================

/// Linux-specific implementations.
#[cfg(target_os = "linux")]
pub mod linux;

/// Platform-specific tick source type alias for Linux.
#[cfg(target_os = "linux")]
pub type PlatformTickSource = linux::LinuxTickSource;

// ============================================================================
// macOS / Windows Platform Implementations
// ============================================================================

// These live in src/macos/ and src/windows/ next to the platform layer.

#[cfg(target_os = "macos")]
pub type PlatformTickSource = crate::macos::MacTickSource;

#[cfg(target_os = "windows")]
pub type PlatformTickSource = crate::windows::WindowsTickSource;

// ============================================================================
// Unsupported Platforms
// ============================================================================

/// Tick source for platforms without a CPU accounting backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTickSource;

impl TickSource for NullTickSource {
    fn sample(&self) -> CpuSnapshot {
        CpuSnapshot::ZERO
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type PlatformTickSource = NullTickSource;

/// Create the tick source for the current build target.
pub fn create_tick_source() -> PlatformTickSource {
    PlatformTickSource::default()
}

// ============================================================================
// Platform Detection Utilities
// ============================================================================

/// Returns the current platform name
pub fn platform_name() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }

    #[cfg(target_os = "macos")]
    {
        "macos"
    }

    #[cfg(target_os = "windows")]
    {
        "windows"
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "unsupported"
    }
}

/// Check if the current platform has a CPU accounting backend
pub fn is_platform_supported() -> bool {
    cfg!(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "windows"
    ))
}

/// Information about the current platform.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    /// Operating system name
    pub os_name: &'static str,
    /// Operating system or kernel version (if available)
    pub os_version: Option<String>,
    /// CPU architecture
    pub arch: &'static str,
}

/// Detect information about the current platform.
pub fn detect_platform() -> PlatformInfo {
    PlatformInfo {
        os_name: std::env::consts::OS,
        os_version: detect_os_version(),
        arch: std::env::consts::ARCH,
    }
}

fn detect_os_version() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        linux::kernel_version()
    }

    #[cfg(not(target_os = "linux"))]
    {
        sysinfo::System::os_version()
    }
}
