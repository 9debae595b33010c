use std::time::Duration;

use derive_more::Display;
use tokio::time::Instant;

use crate::evaluator::Verdict;

/// Edge reported by [`IdleTimer::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Transition {
    #[display("now idle")]
    BecameIdle,
    #[display("now busy")]
    BecameBusy,
}

/// Tracks the current idle window and whether it has outlasted the timeout.
///
/// The timer starts busy. The first idle verdict opens a window at that
/// instant; later idle verdicts leave the start untouched, and any busy verdict
/// closes it. The timer never latches: acting on [`IdleTimer::shutdown_due`]
/// exactly once is up to the caller.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    idle_since: Option<Instant>,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            idle_since: None,
        }
    }

    pub fn update(&mut self, verdict: Verdict, now: Instant) -> Option<Transition> {
        match (verdict, self.idle_since) {
            (Verdict::Idle, None) => {
                self.idle_since = Some(now);
                Some(Transition::BecameIdle)
            }
            (Verdict::Busy, Some(_)) => {
                self.idle_since = None;
                Some(Transition::BecameBusy)
            }
            _ => None,
        }
    }

    pub fn shutdown_due(&self, now: Instant) -> bool {
        self.idle_for(now)
            .is_some_and(|elapsed| elapsed > self.timeout)
    }

    pub fn state(&self) -> Verdict {
        if self.idle_since.is_some() {
            Verdict::Idle
        } else {
            Verdict::Busy
        }
    }

    pub fn idle_since(&self) -> Option<Instant> {
        self.idle_since
    }

    /// Length of the current idle window, if any.
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.idle_since
            .map(|since| now.saturating_duration_since(since))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
