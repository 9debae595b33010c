//! Host integrations: NVML device queries and the power-off syscall.

pub mod nvml;
pub mod power;

pub use nvml::NvmlDeviceQuery;
pub use power::DryRun;
pub use power::PowerAction;
pub use power::SystemPowerOff;
