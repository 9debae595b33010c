use std::time::Duration;

use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::MonitorConfig;
use crate::device::DeviceQuery;
use crate::error::IdleResult;
use crate::evaluator::IdleEvaluator;
use crate::matcher::IgnoreList;
use crate::platform::PowerAction;
use crate::timer::IdleTimer;

/// Why [`Monitor::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// The idle timeout was exceeded and the power-off action completed.
    PoweredOff,
    /// The cancellation token fired before the timeout was reached.
    Cancelled,
}

/// Polls the devices on a fixed interval and powers the host off once the
/// GPUs have stayed idle for longer than the timeout.
pub struct Monitor<Q, A> {
    query: Q,
    action: A,
    evaluator: IdleEvaluator<IgnoreList>,
    timer: IdleTimer,
    interval: Duration,
    device_count: u32,
}

impl<Q: DeviceQuery, A: PowerAction> Monitor<Q, A> {
    /// Reads the device count once; it is assumed stable for the process
    /// lifetime.
    pub fn new(config: MonitorConfig, query: Q, action: A) -> IdleResult<Self> {
        let device_count = query.device_count()?;

        Ok(Self {
            query,
            action,
            evaluator: IdleEvaluator::new(config.ignore),
            timer: IdleTimer::new(config.timeout),
            interval: config.interval,
            device_count,
        })
    }

    pub fn device_count(&self) -> u32 {
        self.device_count
    }

    pub fn timer(&self) -> &IdleTimer {
        &self.timer
    }

    #[tracing::instrument(skip_all, fields(devices = self.device_count))]
    pub async fn run(&mut self, cancellation_token: CancellationToken) -> IdleResult<MonitorExit> {
        info!(
            "Checking {} GPU(s) every {}, powering off after {} idle (ignoring {:?})",
            self.device_count,
            humantime::format_duration(self.interval),
            humantime::format_duration(self.timer.timeout()),
            self.evaluator.matcher().patterns()
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    info!("Monitor shutdown requested");
                    return Ok(MonitorExit::Cancelled);
                }
                _ = ticker.tick() => {
                    if self.tick(Instant::now())? {
                        info!("GPU idle timeout exceeded, shutting down");
                        self.action.power_off()?;
                        return Ok(MonitorExit::PoweredOff);
                    }
                }
            }
        }
    }

    /// Run one poll at `now` and report whether the power-off is due.
    pub fn tick(&mut self, now: Instant) -> IdleResult<bool> {
        let verdict = self.evaluator.poll(&self.query, self.device_count)?;

        if let Some(transition) = self.timer.update(verdict, now) {
            info!("GPU is {transition}");
        }

        Ok(self.timer.shutdown_due(now))
    }
}
