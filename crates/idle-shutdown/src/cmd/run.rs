use error_stack::ResultExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::MonitorConfig;
use crate::config::RunArgs;
use crate::error::IdleError;
use crate::error::IdleResult;
use crate::monitor::Monitor;
use crate::monitor::MonitorExit;
use crate::platform::DryRun;
use crate::platform::NvmlDeviceQuery;
use crate::platform::PowerAction;
use crate::platform::SystemPowerOff;

pub async fn run_monitor(args: RunArgs) -> IdleResult<()> {
    // Patterns are compiled before NVML is touched so a typo fails fast.
    let config = MonitorConfig::try_from(&args)?;
    let query = NvmlDeviceQuery::init()?;

    let action: Box<dyn PowerAction> = if args.dry_run {
        info!("Dry run enabled, the host will not be powered off");
        Box::new(DryRun)
    } else {
        Box::new(SystemPowerOff)
    };

    let mut monitor = Monitor::new(config, query, action)?;

    let cancellation_token = CancellationToken::new();
    let signal_handler = spawn_signal_handler(cancellation_token.clone())?;

    let exit = monitor.run(cancellation_token).await;
    signal_handler.abort();

    match exit? {
        MonitorExit::PoweredOff => info!("Power-off action completed"),
        MonitorExit::Cancelled => info!("Monitor stopped before the idle timeout"),
    }
    Ok(())
}

/// Cancel `cancellation_token` on SIGTERM or SIGINT.
fn spawn_signal_handler(cancellation_token: CancellationToken) -> IdleResult<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).change_context(IdleError::Signal)?;
        let mut sigint = signal(SignalKind::interrupt()).change_context(IdleError::Signal)?;

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
            }
            cancellation_token.cancel();
        }))
    }
    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    cancellation_token.cancel();
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
            }
        }))
    }
}
