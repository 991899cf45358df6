//! Windows Platform Support
//!
//! CPU accounting through `GetSystemTimes` and service registration with the
//! service control manager.

pub mod cpu;
pub mod service;

pub use cpu::{system_times, SystemTimes, WindowsTickSource};
