//! Windows CPU accounting through `GetSystemTimes`

use tracing::debug;
use windows::Win32::Foundation::FILETIME;
use windows::Win32::System::Threading::GetSystemTimes;

use crate::platform::ticks::filetimes_to_snapshot;
use crate::platform::traits::{CpuSnapshot, PlatformError, PlatformResult, TickSource};

/// Raw system times in 100ns units since 1601-01-01.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemTimes {
    pub idle: u64,
    /// Includes idle time
    pub kernel: u64,
    pub user: u64,
}

fn filetime_to_u64(ft: FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64
}

/// Query system-wide idle, kernel and user time.
pub fn system_times() -> PlatformResult<SystemTimes> {
    let mut idle = FILETIME::default();
    let mut kernel = FILETIME::default();
    let mut user = FILETIME::default();

    unsafe { GetSystemTimes(Some(&mut idle), Some(&mut kernel), Some(&mut user)) }.map_err(
        |e| PlatformError::SystemError {
            code: e.code().0,
            message: format!("GetSystemTimes failed: {}", e.message()),
        },
    )?;

    Ok(SystemTimes {
        idle: filetime_to_u64(idle),
        kernel: filetime_to_u64(kernel),
        user: filetime_to_u64(user),
    })
}

/// Tick source backed by `GetSystemTimes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsTickSource;

impl WindowsTickSource {
    pub fn new() -> Self {
        Self
    }
}

impl TickSource for WindowsTickSource {
    fn sample(&self) -> CpuSnapshot {
        match system_times() {
            Ok(t) => filetimes_to_snapshot(t.idle, t.kernel, t.user),
            Err(e) => {
                debug!("system times unavailable: {}", e);
                CpuSnapshot::ZERO
            }
        }
    }

    fn name(&self) -> &'static str {
        "get-system-times"
    }
}
