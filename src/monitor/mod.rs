//! Sampling and utilization math

pub mod delta;
pub mod host;
pub mod network;
pub mod sampler;

pub use delta::UtilizationResult;
pub use host::{HostProbe, resolve_hostname};
pub use network::SysinfoNetworkSource;
pub use sampler::{run_agent, Sampler, SamplerState};
