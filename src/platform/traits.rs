//! Platform Abstraction Traits for Cross-Platform Resource Sampling
//!
//! This module defines the snapshot types and the narrow capabilities each
//! platform (Linux, macOS, Windows) must provide so the delta engine can turn
//! raw counters into utilization figures without seeing any OS detail.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! |   Platform Traits |  <- This module (defines interfaces)
//! +-------------------+
//!          |
//!    +-----+-----+-----+
//!    |     |     |     |
//! +--v--+--v--+--v--+--v---+
//! | Lin | Mac | Win | Null |  <- Platform-specific tick sources
//! +-----+-----+-----+------+
//! ```
//!
//! Snapshots are cumulative counters measured from an arbitrary epoch (boot
//! or process start). Only the difference between two snapshots carries
//! meaning; never read a single snapshot as wall time.

use std::fmt;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while reading a platform counter source.
///
/// These never cross the [`TickSource`] boundary: every implementation maps
/// them to a zero snapshot and logs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The counter file or table could not be read
    IoError(String),
    /// The counter source was read but its content was malformed
    ParseError(String),
    /// A system call returned a failure code
    SystemError { code: i32, message: String },
    /// The platform has no counter source for this metric
    NotSupported(String),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::IoError(msg) => write!(f, "I/O error: {}", msg),
            PlatformError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            PlatformError::SystemError { code, message } => {
                write!(f, "System error ({}): {}", code, message)
            }
            PlatformError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<std::io::Error> for PlatformError {
    fn from(err: std::io::Error) -> Self {
        PlatformError::IoError(err.to_string())
    }
}

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

// ============================================================================
// Snapshot Types
// ============================================================================

/// Cumulative CPU time, normalized to nanoseconds.
///
/// A snapshot with `idle_time > total_time` cannot come from a sane counter
/// source; [`CpuSnapshot::new`] collapses it to the zero snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    /// Time spent idle, in nanoseconds
    pub idle_time: u64,
    /// Time spent in every accounted state, idle included, in nanoseconds
    pub total_time: u64,
}

impl CpuSnapshot {
    /// The "no data" snapshot returned when a source cannot be read.
    pub const ZERO: CpuSnapshot = CpuSnapshot {
        idle_time: 0,
        total_time: 0,
    };

    /// Build a snapshot, mapping invalid readings to [`CpuSnapshot::ZERO`].
    pub fn new(idle_time: u64, total_time: u64) -> Self {
        if idle_time > total_time {
            return Self::ZERO;
        }
        Self {
            idle_time,
            total_time,
        }
    }

    /// True when this snapshot carries no data (failed or unsupported read).
    pub fn is_empty(&self) -> bool {
        self.total_time == 0
    }

    /// True when the snapshot satisfies `idle_time <= total_time`.
    pub fn is_valid(&self) -> bool {
        self.idle_time <= self.total_time
    }
}

/// Cumulative bytes moved across all counted network interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkSnapshot {
    /// Bytes received
    pub rx_bytes: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
}

impl NetworkSnapshot {
    /// The snapshot returned when interfaces cannot be enumerated.
    pub const ZERO: NetworkSnapshot = NetworkSnapshot {
        rx_bytes: 0,
        tx_bytes: 0,
    };

    pub fn new(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self { rx_bytes, tx_bytes }
    }
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Source of raw CPU time snapshots for one platform.
///
/// Implementations must answer with bounded latency (a single system call or
/// a small file read) and must never fail: an unreadable source yields
/// [`CpuSnapshot::ZERO`].
pub trait TickSource {
    /// Take a snapshot of cumulative idle and total CPU time.
    fn sample(&self) -> CpuSnapshot;

    /// Short name of the strategy, for logging.
    fn name(&self) -> &'static str;
}

/// Source of aggregate network byte counters.
///
/// Takes `&mut self` because enumerating interfaces usually refreshes a
/// cached interface list.
pub trait NetworkCounterSource {
    /// Sum received/transmitted bytes across all non-excluded interfaces.
    fn sample(&mut self) -> NetworkSnapshot;
}

/// Provider of the platform's CPU accounting tick rate.
///
/// Returns the raw answer of the OS facility, `None` when the query itself
/// failed. Normalization (fallback, rejection of non-positive rates) lives in
/// [`crate::platform::ticks::normalize_tick_rate`].
pub trait ClockTicksProvider {
    fn ticks_per_second(&self) -> Option<i64>;
}

/// Fixed tick rate, for tests and for platforms without a rate facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClockTicks(pub i64);

impl ClockTicksProvider for FixedClockTicks {
    fn ticks_per_second(&self) -> Option<i64> {
        Some(self.0)
    }
}
