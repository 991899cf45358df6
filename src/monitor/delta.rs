//! Utilization Delta Engine
//!
//! Turns a pair of cumulative snapshots into a CPU busy percentage and
//! network byte rates. Nothing here can fail: every degenerate input maps to
//! a zero or clamped output so the sampling loop keeps reporting.
//!
//! | Input | CPU | Network |
//! |-------|-----|---------|
//! | counter regressed | 0 | 0 |
//! | no-data snapshot on either side | 0 | - |
//! | `total_delta == 0` | 0 | - |
//! | `elapsed <= 0` / not finite | - | 0 |

use crate::platform::traits::{CpuSnapshot, NetworkSnapshot};

/// Derived utilization for one sampling interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UtilizationResult {
    /// CPU busy percentage in `[0, 100]`
    pub cpu_percent: f64,
    /// Received bytes per second
    pub net_rx_bytes_per_sec: u64,
    /// Transmitted bytes per second
    pub net_tx_bytes_per_sec: u64,
}

/// Busy percentage between two CPU snapshots.
///
/// A regressed counter (reset, wraparound, racing read) drops the sample
/// rather than attempting wraparound arithmetic.
pub fn cpu_percent(prev: &CpuSnapshot, curr: &CpuSnapshot) -> f64 {
    if prev.is_empty() || curr.is_empty() || !prev.is_valid() || !curr.is_valid() {
        return 0.0;
    }
    if curr.idle_time < prev.idle_time || curr.total_time < prev.total_time {
        return 0.0;
    }

    let idle_delta = curr.idle_time - prev.idle_time;
    let total_delta = curr.total_time - prev.total_time;
    if total_delta == 0 {
        return 0.0;
    }

    let busy = 100.0 - (idle_delta as f64 * 100.0) / total_delta as f64;
    busy.clamp(0.0, 100.0)
}

/// Receive and transmit rates in whole bytes per second.
///
/// Both counters must be monotonic for either rate to be reported.
pub fn network_rates(prev: &NetworkSnapshot, curr: &NetworkSnapshot, elapsed_seconds: f64) -> (u64, u64) {
    if !(elapsed_seconds.is_finite() && elapsed_seconds > 0.0) {
        return (0, 0);
    }
    if curr.rx_bytes < prev.rx_bytes || curr.tx_bytes < prev.tx_bytes {
        return (0, 0);
    }

    let rx_delta = curr.rx_bytes - prev.rx_bytes;
    let tx_delta = curr.tx_bytes - prev.tx_bytes;

    (
        (rx_delta as f64 / elapsed_seconds).floor() as u64,
        (tx_delta as f64 / elapsed_seconds).floor() as u64,
    )
}

/// Compute all utilization figures for one sample pair.
pub fn compute(
    prev_cpu: &CpuSnapshot,
    curr_cpu: &CpuSnapshot,
    prev_net: &NetworkSnapshot,
    curr_net: &NetworkSnapshot,
    elapsed_seconds: f64,
) -> UtilizationResult {
    let (rx, tx) = network_rates(prev_net, curr_net, elapsed_seconds);
    UtilizationResult {
        cpu_percent: cpu_percent(prev_cpu, curr_cpu),
        net_rx_bytes_per_sec: rx,
        net_tx_bytes_per_sec: tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ticks::filetimes_to_snapshot;

    fn cpu(idle: u64, total: u64) -> CpuSnapshot {
        CpuSnapshot {
            idle_time: idle,
            total_time: total,
        }
    }

    fn net(rx: u64, tx: u64) -> NetworkSnapshot {
        NetworkSnapshot::new(rx, tx)
    }

    #[test]
    fn test_half_busy() {
        assert_eq!(cpu_percent(&cpu(1000, 2000), &cpu(1500, 3000)), 50.0);
    }

    #[test]
    fn test_stuck_counters_are_zero() {
        assert_eq!(cpu_percent(&cpu(5000, 10000), &cpu(5000, 10000)), 0.0);
    }

    #[test]
    fn test_idle_regression_is_zero() {
        assert_eq!(cpu_percent(&cpu(100, 200), &cpu(90, 210)), 0.0);
    }

    #[test]
    fn test_total_regression_is_zero() {
        assert_eq!(cpu_percent(&cpu(100, 200), &cpu(150, 190)), 0.0);
    }

    #[test]
    fn test_all_idle_is_zero() {
        assert_eq!(cpu_percent(&cpu(100, 200), &cpu(400, 500)), 0.0);
    }

    #[test]
    fn test_no_idle_is_fully_busy() {
        assert_eq!(cpu_percent(&cpu(100, 200), &cpu(100, 700)), 100.0);
    }

    #[test]
    fn test_no_data_snapshot_is_zero() {
        assert_eq!(cpu_percent(&CpuSnapshot::ZERO, &cpu(100, 200)), 0.0);
        assert_eq!(cpu_percent(&cpu(100, 200), &CpuSnapshot::ZERO), 0.0);
    }

    #[test]
    fn test_invalid_snapshot_is_zero() {
        assert_eq!(cpu_percent(&cpu(100, 200), &cpu(900, 300)), 0.0);
    }

    #[test]
    fn test_idle_growing_faster_than_total_is_clamped() {
        // Both counters are individually consistent, but idle grew more than
        // total between the reads.
        assert_eq!(cpu_percent(&cpu(0, 1000), &cpu(900, 1500)), 0.0);
    }

    #[test]
    fn test_percent_stays_in_range() {
        let pairs = [
            (cpu(0, 1), cpu(0, 2)),
            (cpu(10, 100), cpu(11, 10_000)),
            (cpu(1, u64::MAX / 2), cpu(2, u64::MAX)),
            (cpu(7, 13), cpu(8, 14)),
        ];
        for (prev, curr) in pairs {
            let pct = cpu_percent(&prev, &curr);
            assert!((0.0..=100.0).contains(&pct), "{:?} -> {:?} = {}", prev, curr, pct);
        }
    }

    #[test]
    fn test_windows_units_difference_like_ticks() {
        let prev = filetimes_to_snapshot(100, 150, 50);
        let curr = filetimes_to_snapshot(150, 250, 100);
        // idle +50, busy kernel +50, user +50 -> total +150
        let pct = cpu_percent(&prev, &curr);
        assert!((pct - 100.0 * 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_network_rate() {
        assert_eq!(
            network_rates(&net(1_000_000, 0), &net(2_000_000, 0), 10.0),
            (100_000, 0)
        );
    }

    #[test]
    fn test_network_rate_floors() {
        assert_eq!(network_rates(&net(0, 0), &net(10, 7), 3.0), (3, 2));
    }

    #[test]
    fn test_network_rate_is_linear() {
        let (single, _) = network_rates(&net(0, 0), &net(12_345, 0), 4.0);
        let (double, _) = network_rates(&net(0, 0), &net(24_690, 0), 4.0);
        assert!(double == single * 2 || double == single * 2 + 1);
    }

    #[test]
    fn test_network_degenerate_interval() {
        assert_eq!(network_rates(&net(0, 0), &net(100, 100), 0.0), (0, 0));
        assert_eq!(network_rates(&net(0, 0), &net(100, 100), -1.0), (0, 0));
        assert_eq!(network_rates(&net(0, 0), &net(100, 100), f64::NAN), (0, 0));
    }

    #[test]
    fn test_network_regression_suppresses_both_rates() {
        assert_eq!(network_rates(&net(100, 100), &net(50, 500), 1.0), (0, 0));
        assert_eq!(network_rates(&net(100, 100), &net(500, 50), 1.0), (0, 0));
    }

    #[test]
    fn test_compute_cpu_ignores_elapsed() {
        let result = compute(&cpu(1000, 2000), &cpu(1500, 3000), &net(0, 0), &net(10, 10), 0.0);
        assert_eq!(result.cpu_percent, 50.0);
        assert_eq!(result.net_rx_bytes_per_sec, 0);
        assert_eq!(result.net_tx_bytes_per_sec, 0);
    }

    #[test]
    fn test_compute_combines_results() {
        let result = compute(
            &cpu(1000, 2000),
            &cpu(1500, 3000),
            &net(1_000_000, 500),
            &net(2_000_000, 1500),
            10.0,
        );
        assert_eq!(
            result,
            UtilizationResult {
                cpu_percent: 50.0,
                net_rx_bytes_per_sec: 100_000,
                net_tx_bytes_per_sec: 100,
            }
        );
    }
}
