//! Linux CPU accounting from /proc/stat
//!
//! The first line of `/proc/stat` aggregates every core:
//!
//! ```text
//! cpu  user nice system idle iowait irq softirq steal [guest guest_nice]
//! ```
//!
//! Total ticks are the sum of all present fields. Idle ticks are the `idle`
//! field alone: `iowait` is counted as busy time, matching `top`-style
//! accounting rather than tools that fold iowait into idle.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::platform::ticks::{ticks_per_second, ticks_to_snapshot};
use crate::platform::traits::{
    ClockTicksProvider, CpuSnapshot, PlatformError, PlatformResult, TickSource,
};

/// Default location of the kernel CPU accounting table.
pub const PROC_STAT_PATH: &str = "/proc/stat";

/// Fields up to and including `steal` must be present.
const MIN_FIELDS: usize = 7;
/// `guest` and `guest_nice` are the last fields summed.
const MAX_FIELDS: usize = 10;
const IDLE_FIELD: usize = 3;

/// Raw tick counts from the aggregate `cpu` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatTicks {
    pub idle: u64,
    pub total: u64,
}

/// Parse the aggregate line of a `/proc/stat` dump.
///
/// Fields that fail to parse count as zero, as long as the line itself has
/// the expected shape.
pub fn parse_proc_stat(content: &str) -> PlatformResult<StatTicks> {
    let line = content
        .lines()
        .next()
        .ok_or_else(|| PlatformError::ParseError("empty /proc/stat".to_string()))?;

    let mut fields = line.split_whitespace();
    if fields.next() != Some("cpu") {
        return Err(PlatformError::ParseError(format!(
            "first line is not the aggregate cpu line: {:?}",
            line
        )));
    }

    let values: Vec<u64> = fields
        .take(MAX_FIELDS)
        .map(|f| f.parse::<u64>().unwrap_or(0))
        .collect();

    if values.len() < MIN_FIELDS {
        return Err(PlatformError::ParseError(format!(
            "expected at least {} cpu fields, found {}",
            MIN_FIELDS,
            values.len()
        )));
    }

    let total = values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));

    Ok(StatTicks {
        idle: values[IDLE_FIELD],
        total,
    })
}

/// `sysconf(_SC_CLK_TCK)`, the USER_HZ rate /proc/stat is expressed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysconfClockTicks;

impl ClockTicksProvider for SysconfClockTicks {
    fn ticks_per_second(&self) -> Option<i64> {
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if hz == -1 {
            None
        } else {
            Some(hz as i64)
        }
    }
}

/// Tick source backed by `/proc/stat`.
pub struct LinuxTickSource<C: ClockTicksProvider = SysconfClockTicks> {
    stat_path: PathBuf,
    clock: C,
}

impl LinuxTickSource<SysconfClockTicks> {
    pub fn new() -> Self {
        Self::with_clock(PROC_STAT_PATH, SysconfClockTicks)
    }
}

impl Default for LinuxTickSource<SysconfClockTicks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockTicksProvider> LinuxTickSource<C> {
    /// Read from an alternate stat file with a custom tick rate provider.
    pub fn with_clock(stat_path: impl AsRef<Path>, clock: C) -> Self {
        Self {
            stat_path: stat_path.as_ref().to_path_buf(),
            clock,
        }
    }

    fn read(&self) -> PlatformResult<CpuSnapshot> {
        let content = fs::read_to_string(&self.stat_path)?;
        let ticks = parse_proc_stat(&content)?;
        Ok(ticks_to_snapshot(
            ticks.idle,
            ticks.total,
            ticks_per_second(&self.clock),
        ))
    }
}

impl<C: ClockTicksProvider> TickSource for LinuxTickSource<C> {
    fn sample(&self) -> CpuSnapshot {
        match self.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("{} unreadable: {}", self.stat_path.display(), e);
                CpuSnapshot::ZERO
            }
        }
    }

    fn name(&self) -> &'static str {
        "proc-stat"
    }
}
