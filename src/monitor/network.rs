//! Network Counter Source
//!
//! Aggregates cumulative byte counters from `sysinfo` across every interface
//! except the excluded (loopback) names.

use sysinfo::Networks;
use tracing::debug;

use crate::platform::traits::{NetworkCounterSource, NetworkSnapshot};

/// Platform-conventional loopback interface names.
pub fn default_excluded_interfaces() -> Vec<String> {
    vec![
        "lo".to_string(),
        "lo0".to_string(),
        "Loopback Pseudo-Interface 1".to_string(),
    ]
}

/// Sum `(name, rx, tx)` counters, skipping excluded names.
pub fn aggregate_interfaces<'a, I>(interfaces: I, excluded: &[String]) -> NetworkSnapshot
where
    I: IntoIterator<Item = (&'a str, u64, u64)>,
{
    interfaces
        .into_iter()
        .filter(|(name, _, _)| !excluded.iter().any(|ex| ex == name))
        .fold(NetworkSnapshot::ZERO, |acc, (_, rx, tx)| NetworkSnapshot {
            rx_bytes: acc.rx_bytes.saturating_add(rx),
            tx_bytes: acc.tx_bytes.saturating_add(tx),
        })
}

/// Counter source backed by the `sysinfo` interface list.
pub struct SysinfoNetworkSource {
    networks: Networks,
    excluded: Vec<String>,
}

impl SysinfoNetworkSource {
    pub fn new(excluded: Vec<String>) -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
            excluded,
        }
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }
}

impl Default for SysinfoNetworkSource {
    fn default() -> Self {
        Self::new(default_excluded_interfaces())
    }
}

impl NetworkCounterSource for SysinfoNetworkSource {
    fn sample(&mut self) -> NetworkSnapshot {
        // Interfaces come and go (VPNs, containers); re-enumerate each time.
        self.networks.refresh_list();

        let snapshot = aggregate_interfaces(
            self.networks
                .iter()
                .map(|(name, data)| (name.as_str(), data.total_received(), data.total_transmitted())),
            &self.excluded,
        );

        if snapshot == NetworkSnapshot::ZERO {
            debug!("no network counters available");
        }
        snapshot
    }
}
