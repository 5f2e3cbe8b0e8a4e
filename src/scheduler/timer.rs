//! Resettable recurring timer behind the auto-check toggle.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCheck {
    Enabled,
    Disabled,
}

impl std::fmt::Display for AutoCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoCheck::Enabled => write!(f, "ON"),
            AutoCheck::Disabled => write!(f, "OFF"),
        }
    }
}

/// Recurring timer that can be stopped and restarted with a new period.
///
/// The first tick after (re)starting fires one full period later, never
/// immediately.
pub struct AutoCheckTimer {
    interval: Option<Interval>,
    period: Duration,
}

fn interval_for(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl AutoCheckTimer {
    /// Start enabled with `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            interval: Some(interval_for(period)),
            period,
        }
    }

    pub fn state(&self) -> AutoCheck {
        if self.interval.is_some() {
            AutoCheck::Enabled
        } else {
            AutoCheck::Disabled
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Restart with `period`, counting from now.
    pub fn enable(&mut self, period: Duration) {
        self.period = period;
        self.interval = Some(interval_for(period));
    }

    pub fn disable(&mut self) {
        self.interval = None;
    }

    /// Restart with `period` if enabled; no-op while disabled.
    pub fn reset(&mut self, period: Duration) {
        if self.interval.is_some() {
            self.enable(period);
        }
    }

    /// Flip the state. `period` is used when this enables the timer.
    pub fn toggle(&mut self, period: Duration) -> AutoCheck {
        match self.state() {
            AutoCheck::Enabled => self.disable(),
            AutoCheck::Disabled => self.enable(period),
        }
        self.state()
    }

    /// Wait for the next tick. Pending forever while disabled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
