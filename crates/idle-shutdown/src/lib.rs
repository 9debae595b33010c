//! Powers a host off once its GPUs have been idle for long enough.
//!
//! Every poll interval the running processes of each GPU are read through a
//! [`device::DeviceQuery`]. The GPUs are idle when every process matches the
//! ignore list; a [`timer::IdleTimer`] tracks how long that has been the case
//! and the [`monitor::Monitor`] invokes the [`platform::PowerAction`] once the
//! idle window exceeds the timeout.

pub mod cmd;
pub mod config;
pub mod device;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod monitor;
pub mod platform;
pub mod timer;

pub use error::IdleError;
pub use error::IdleResult;
