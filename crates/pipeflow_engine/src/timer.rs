//! Cancellable periodic timers.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, instrument};

/// Period of the countdown clock.
pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Period of the leak check.
pub const LEAK_CHECK_PERIOD: Duration = Duration::from_secs(2);

/// A periodic callback source that can be started and cancelled.
///
/// The first tick fires one full period after [`PeriodicTimer::start`].
/// While cancelled, [`PeriodicTimer::tick`] never resolves, so the timer can
/// sit in a `select!` unconditionally.
#[derive(Debug)]
pub struct PeriodicTimer {
    name: &'static str,
    period: Duration,
    interval: Option<Interval>,
}

impl PeriodicTimer {
    /// Creates a stopped timer.
    #[instrument]
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            interval: None,
        }
    }

    /// Starts (or restarts) the timer from now.
    #[instrument(skip(self), fields(timer = self.name))]
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
        debug!(period_ms = self.period.as_millis() as u64, "Timer started");
    }

    /// Stops the timer; pending ticks are discarded.
    #[instrument(skip(self), fields(timer = self.name))]
    pub fn cancel(&mut self) {
        if self.interval.take().is_some() {
            debug!("Timer cancelled");
        }
    }

    /// Whether the timer is running.
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Timer name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the next tick. Cancel-safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
