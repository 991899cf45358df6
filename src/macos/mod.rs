//! macOS Platform Support
//!
//! CPU accounting through Mach host statistics with a `kern.clockrate`
//! tick rate.

pub mod cpu;

pub use cpu::{KernClockRate, MacTickSource};
