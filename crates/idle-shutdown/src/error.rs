use error_stack::Report;
use thiserror::Error;

pub type IdleResult<T> = Result<T, Report<IdleError>>;

/// Errors that abort the monitor. None of them is retried.
#[derive(Debug, Error)]
pub enum IdleError {
    #[error("GPU device subsystem is unavailable")]
    Init,
    #[error("failed to query running processes on GPU {index}")]
    DeviceQuery { index: u32 },
    #[error("invalid ignore pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("power-off action failed")]
    Action,
    #[error("failed to install termination signal handler")]
    Signal,
}
