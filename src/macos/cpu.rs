//! macOS CPU accounting through Mach host calls
//!
//! Two strategies, tried in order:
//!
//! 1. `host_statistics(HOST_CPU_LOAD_INFO)`: per-state tick counters already
//!    aggregated across all cores.
//! 2. `host_processor_info(PROCESSOR_CPU_LOAD_INFO)`: per-processor counters,
//!    of which only processor 0 is read. On multi-core hosts this covers a
//!    single core, so the percentage tracks that core alone. It only runs
//!    when the aggregate call returned nothing.
//!
//! Ticks are converted with the `kern.clockrate` hz value.

use std::ffi::CString;
use std::mem;
use std::ptr;

use tracing::debug;

use crate::platform::ticks::{cascade, ticks_per_second, StateTicks};
use crate::platform::traits::{
    ClockTicksProvider, CpuSnapshot, PlatformError, PlatformResult, TickSource,
};

type MachPort = libc::c_uint;
type KernReturn = libc::c_int;
type Natural = libc::c_uint;
type Integer = libc::c_int;
type MsgTypeNumber = Natural;

const KERN_SUCCESS: KernReturn = 0;
const HOST_CPU_LOAD_INFO: libc::c_int = 3;
const PROCESSOR_CPU_LOAD_INFO: libc::c_int = 2;

const CPU_STATE_USER: usize = 0;
const CPU_STATE_SYSTEM: usize = 1;
const CPU_STATE_IDLE: usize = 2;
const CPU_STATE_NICE: usize = 3;
const CPU_STATE_MAX: usize = 4;

#[repr(C)]
#[derive(Default)]
struct HostCpuLoadInfo {
    cpu_ticks: [Natural; CPU_STATE_MAX],
}

#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct ClockInfo {
    hz: libc::c_int,
    tick: libc::c_int,
    tickadj: libc::c_int,
    stathz: libc::c_int,
    profhz: libc::c_int,
}

extern "C" {
    static mach_task_self_: MachPort;

    fn mach_host_self() -> MachPort;

    fn host_statistics(
        host: MachPort,
        flavor: libc::c_int,
        host_info_out: *mut Integer,
        host_info_out_cnt: *mut MsgTypeNumber,
    ) -> KernReturn;

    fn host_processor_info(
        host: MachPort,
        flavor: libc::c_int,
        out_processor_count: *mut Natural,
        out_processor_info: *mut *mut Integer,
        out_processor_info_cnt: *mut MsgTypeNumber,
    ) -> KernReturn;

    fn vm_deallocate(target_task: MachPort, address: libc::uintptr_t, size: libc::uintptr_t)
        -> KernReturn;
}

fn state_ticks(raw: &[Natural]) -> StateTicks {
    StateTicks {
        user: raw[CPU_STATE_USER] as u64,
        system: raw[CPU_STATE_SYSTEM] as u64,
        idle: raw[CPU_STATE_IDLE] as u64,
        nice: raw[CPU_STATE_NICE] as u64,
    }
}

/// Aggregate per-state ticks across all cores.
fn host_cpu_load() -> PlatformResult<StateTicks> {
    let mut info = HostCpuLoadInfo::default();
    let mut count = CPU_STATE_MAX as MsgTypeNumber;

    let ret = unsafe {
        host_statistics(
            mach_host_self(),
            HOST_CPU_LOAD_INFO,
            &mut info as *mut HostCpuLoadInfo as *mut Integer,
            &mut count,
        )
    };

    if ret != KERN_SUCCESS {
        return Err(PlatformError::SystemError {
            code: ret,
            message: "host_statistics(HOST_CPU_LOAD_INFO) failed".to_string(),
        });
    }

    Ok(state_ticks(&info.cpu_ticks))
}

/// Per-state ticks of processor 0 only.
fn first_processor_load() -> PlatformResult<StateTicks> {
    let mut processor_count: Natural = 0;
    let mut info: *mut Integer = ptr::null_mut();
    let mut info_count: MsgTypeNumber = 0;

    let ret = unsafe {
        host_processor_info(
            mach_host_self(),
            PROCESSOR_CPU_LOAD_INFO,
            &mut processor_count,
            &mut info,
            &mut info_count,
        )
    };

    if ret != KERN_SUCCESS {
        return Err(PlatformError::SystemError {
            code: ret,
            message: "host_processor_info(PROCESSOR_CPU_LOAD_INFO) failed".to_string(),
        });
    }

    let ticks = if processor_count > 0 && !info.is_null() && info_count as usize >= CPU_STATE_MAX
    {
        let raw = unsafe { std::slice::from_raw_parts(info as *const Natural, CPU_STATE_MAX) };
        Ok(state_ticks(raw))
    } else {
        Err(PlatformError::ParseError(
            "host_processor_info returned no processors".to_string(),
        ))
    };

    if !info.is_null() {
        let size = info_count as usize * mem::size_of::<Integer>();
        unsafe {
            vm_deallocate(mach_task_self_, info as libc::uintptr_t, size);
        }
    }

    ticks
}

/// `kern.clockrate` hz.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernClockRate;

impl ClockTicksProvider for KernClockRate {
    fn ticks_per_second(&self) -> Option<i64> {
        let name = CString::new("kern.clockrate").ok()?;
        let mut info = ClockInfo::default();
        let mut size = mem::size_of::<ClockInfo>();

        let ret = unsafe {
            libc::sysctlbyname(
                name.as_ptr(),
                &mut info as *mut ClockInfo as *mut libc::c_void,
                &mut size,
                ptr::null_mut(),
                0,
            )
        };

        if ret != 0 {
            return None;
        }
        Some(info.hz as i64)
    }
}

/// Tick source backed by Mach host statistics.
pub struct MacTickSource<C: ClockTicksProvider = KernClockRate> {
    clock: C,
}

impl MacTickSource<KernClockRate> {
    pub fn new() -> Self {
        Self::with_clock(KernClockRate)
    }
}

impl Default for MacTickSource<KernClockRate> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockTicksProvider> MacTickSource<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    fn aggregate(&self, hz: u64) -> CpuSnapshot {
        match host_cpu_load() {
            Ok(ticks) => ticks.to_snapshot(hz),
            Err(e) => {
                debug!("aggregate cpu load unavailable: {}", e);
                CpuSnapshot::ZERO
            }
        }
    }

    fn first_processor(&self, hz: u64) -> CpuSnapshot {
        match first_processor_load() {
            Ok(ticks) => ticks.to_snapshot(hz),
            Err(e) => {
                debug!("processor load unavailable: {}", e);
                CpuSnapshot::ZERO
            }
        }
    }
}

impl<C: ClockTicksProvider> TickSource for MacTickSource<C> {
    fn sample(&self) -> CpuSnapshot {
        let hz = ticks_per_second(&self.clock);
        cascade(self.aggregate(hz), || self.first_processor(hz))
    }

    fn name(&self) -> &'static str {
        "mach-host"
    }
}
