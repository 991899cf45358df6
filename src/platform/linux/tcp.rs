//! TCP connection counting from the kernel socket tables.

use tracing::debug;

use crate::platform::traits::{PlatformError, PlatformResult};

/// Count IPv4 and IPv6 entries of `/proc/net/tcp{,6}`, every state included.
///
/// A missing IPv6 table (kernel built without IPv6) is not an error.
pub fn tcp_connection_count() -> PlatformResult<usize> {
    let v4 = procfs::net::tcp()
        .map_err(|e| PlatformError::IoError(format!("/proc/net/tcp: {}", e)))?
        .len();

    let v6 = match procfs::net::tcp6() {
        Ok(entries) => entries.len(),
        Err(e) => {
            debug!("/proc/net/tcp6 unavailable: {}", e);
            0
        }
    };

    Ok(v4 + v6)
}
