//! Host power-off actions.

use error_stack::Report;

use crate::error::IdleError;
use crate::error::IdleResult;

/// Powers the host down. A successful real power-off does not return.
pub trait PowerAction {
    fn power_off(&self) -> IdleResult<()>;
}

impl<A: PowerAction + ?Sized> PowerAction for Box<A> {
    fn power_off(&self) -> IdleResult<()> {
        (**self).power_off()
    }
}

/// Powers off through the `reboot(2)` syscall. Requires `CAP_SYS_BOOT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPowerOff;

impl PowerAction for SystemPowerOff {
    #[cfg(target_os = "linux")]
    fn power_off(&self) -> IdleResult<()> {
        // SAFETY: both calls take no pointers; sync flushes dirty pages before
        // the kernel stops the machine.
        let rc = unsafe {
            libc::sync();
            libc::reboot(libc::RB_POWER_OFF)
        };
        if rc == 0 {
            return Ok(());
        }

        Err(Report::new(std::io::Error::last_os_error())
            .change_context(IdleError::Action)
            .attach_printable("reboot(RB_POWER_OFF) was rejected by the kernel"))
    }

    #[cfg(not(target_os = "linux"))]
    fn power_off(&self) -> IdleResult<()> {
        Err(Report::new(IdleError::Action)
            .attach_printable("powering off is only supported on Linux"))
    }
}

/// Only logs; the host keeps running.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

impl PowerAction for DryRun {
    fn power_off(&self) -> IdleResult<()> {
        tracing::warn!("Dry run: the host would be powered off now");
        Ok(())
    }
}
