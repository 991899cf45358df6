//! Tick Normalization
//!
//! Portable arithmetic that turns each platform's native CPU counters into
//! nanosecond [`CpuSnapshot`]s. The OS-facing modules only fetch raw numbers
//! and hand them here, so every conversion rule is testable on any host with
//! synthetic tick rates.

use super::traits::{ClockTicksProvider, CpuSnapshot};

/// Tick rate assumed when the platform cannot report one.
pub const FALLBACK_TICKS_PER_SECOND: u64 = 100;

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Windows reports CPU times in 100ns intervals.
pub const NANOS_PER_FILETIME_UNIT: u64 = 100;

/// Apply the fallback rate to a missing or non-positive answer.
pub fn normalize_tick_rate(raw: Option<i64>) -> u64 {
    match raw {
        Some(hz) if hz > 0 => hz as u64,
        _ => FALLBACK_TICKS_PER_SECOND,
    }
}

/// Query a provider and normalize its answer.
pub fn ticks_per_second<C: ClockTicksProvider + ?Sized>(clock: &C) -> u64 {
    normalize_tick_rate(clock.ticks_per_second())
}

/// Whole nanoseconds per tick. Rates above 1 GHz round down to 1ns.
pub fn nanos_per_tick(ticks_per_second: u64) -> u64 {
    (NANOS_PER_SECOND / ticks_per_second.max(1)).max(1)
}

/// Build a snapshot from idle and total tick counts.
pub fn ticks_to_snapshot(idle_ticks: u64, total_ticks: u64, ticks_per_second: u64) -> CpuSnapshot {
    let per_tick = nanos_per_tick(ticks_per_second);
    CpuSnapshot::new(
        idle_ticks.saturating_mul(per_tick),
        total_ticks.saturating_mul(per_tick),
    )
}

/// Per-state tick counters in the order Mach reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateTicks {
    pub user: u64,
    pub system: u64,
    pub idle: u64,
    pub nice: u64,
}

impl StateTicks {
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.nice)
    }

    pub fn to_snapshot(&self, ticks_per_second: u64) -> CpuSnapshot {
        ticks_to_snapshot(self.idle, self.total(), ticks_per_second)
    }
}

/// Convert `GetSystemTimes` output (100ns units) to a snapshot.
///
/// Kernel time already contains idle time on Windows, so the busy kernel
/// share is `kernel - idle` and the total is `busy_kernel + user + idle`.
pub fn filetimes_to_snapshot(idle: u64, kernel: u64, user: u64) -> CpuSnapshot {
    let busy_kernel = kernel.saturating_sub(idle);
    let total = busy_kernel.saturating_add(user).saturating_add(idle);
    CpuSnapshot::new(
        idle.saturating_mul(NANOS_PER_FILETIME_UNIT),
        total.saturating_mul(NANOS_PER_FILETIME_UNIT),
    )
}

/// Use `primary` when it carries data, otherwise run the fallback strategy.
pub fn cascade<F>(primary: CpuSnapshot, fallback: F) -> CpuSnapshot
where
    F: FnOnce() -> CpuSnapshot,
{
    if primary.total_time > 0 {
        primary
    } else {
        fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::traits::FixedClockTicks;

    struct FailingClock;

    impl ClockTicksProvider for FailingClock {
        fn ticks_per_second(&self) -> Option<i64> {
            None
        }
    }

    #[test]
    fn test_tick_rate_fallback() {
        assert_eq!(ticks_per_second(&FailingClock), 100);
        assert_eq!(ticks_per_second(&FixedClockTicks(0)), 100);
        assert_eq!(ticks_per_second(&FixedClockTicks(-1)), 100);
        assert_eq!(ticks_per_second(&FixedClockTicks(250)), 250);
    }

    #[test]
    fn test_nanos_per_tick() {
        assert_eq!(nanos_per_tick(100), 10_000_000);
        assert_eq!(nanos_per_tick(1000), 1_000_000);
        assert_eq!(nanos_per_tick(0), NANOS_PER_SECOND);
        assert_eq!(nanos_per_tick(u64::MAX), 1);
    }

    #[test]
    fn test_ticks_to_snapshot_uses_rate() {
        let snap = ticks_to_snapshot(40, 100, 100);
        assert_eq!(snap.idle_time, 400_000_000);
        assert_eq!(snap.total_time, 1_000_000_000);

        let fast = ticks_to_snapshot(40, 100, 1000);
        assert_eq!(fast.total_time, 100_000_000);
    }

    #[test]
    fn test_state_ticks_total() {
        let ticks = StateTicks {
            user: 10,
            system: 5,
            idle: 80,
            nice: 5,
        };
        assert_eq!(ticks.total(), 100);
        let snap = ticks.to_snapshot(100);
        assert_eq!(snap.idle_time, 800_000_000);
        assert_eq!(snap.total_time, 1_000_000_000);
    }

    #[test]
    fn test_filetimes_subtract_idle_from_kernel() {
        // idle=100, kernel=150 (includes idle), user=50
        let snap = filetimes_to_snapshot(100, 150, 50);
        assert_eq!(snap.idle_time, 10_000);
        assert_eq!(snap.total_time, 20_000);
    }

    #[test]
    fn test_filetimes_kernel_below_idle_is_clamped() {
        let snap = filetimes_to_snapshot(200, 150, 50);
        assert_eq!(snap.idle_time, 20_000);
        assert_eq!(snap.total_time, 25_000);
    }

    #[test]
    fn test_cascade_prefers_primary() {
        let primary = CpuSnapshot::new(1, 2);
        let snap = cascade(primary, || panic!("fallback must not run"));
        assert_eq!(snap, primary);
    }

    #[test]
    fn test_cascade_falls_back_on_empty_primary() {
        let snap = cascade(CpuSnapshot::ZERO, || CpuSnapshot::new(3, 4));
        assert_eq!(snap, CpuSnapshot::new(3, 4));
    }
}
