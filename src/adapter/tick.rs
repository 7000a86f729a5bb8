//! Scheduled work for time-driven sessions.
//!
//! The host owns the clock and calls `advance(elapsed)` on the adapter; the
//! adapter converts elapsed time into a number of fixed-interval ticks. A
//! disarmed loop swallows elapsed time, so nothing runs while a session is
//! paused or over.
//!
//! ```
//! use std::time::Duration;
//! use arcade_hub::adapter::TickLoop;
//!
//! let mut ticks = TickLoop::new(Duration::from_millis(100));
//! assert_eq!(ticks.advance(Duration::from_millis(250)), 0); // not armed
//!
//! ticks.arm();
//! assert_eq!(ticks.advance(Duration::from_millis(250)), 2);
//! assert_eq!(ticks.advance(Duration::from_millis(50)), 1); // 50ms carried over
//!
//! ticks.disarm();
//! assert_eq!(ticks.advance(Duration::from_secs(10)), 0);
//! ```

use std::time::Duration;

/// Fixed-interval tick accumulator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickLoop {
    interval: Duration,
    armed: bool,
    pending: Duration,
}

impl TickLoop {
    /// Create a disarmed loop with the given interval.
    ///
    /// A zero interval is raised to one millisecond.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            armed: false,
            pending: Duration::ZERO,
        }
    }

    /// Tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval (difficulty applied in `init`).
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Is the loop currently scheduled?
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Schedule ticks. Arming an armed loop does nothing.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Suspend ticks, keeping the partial interval already accumulated.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Suspend ticks and drop any partial interval.
    pub fn teardown(&mut self) {
        self.armed = false;
        self.pending = Duration::ZERO;
    }

    /// Feed elapsed time and return how many ticks are due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.armed {
            return 0;
        }

        self.pending = self.pending.saturating_add(elapsed);
        let pending = self.pending.as_nanos();
        let interval = self.interval.as_nanos();
        // remainder < interval, which itself fits in a Duration
        self.pending = Duration::from_nanos(u64::try_from(pending % interval).unwrap_or(0));
        u32::try_from(pending / interval).unwrap_or(u32::MAX)
    }
}

/// One-shot countdown, used for Memory's reveal delay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Option<Duration>,
}

impl Countdown {
    /// Start (or restart) the countdown.
    pub fn start(&mut self, delay: Duration) {
        self.remaining = Some(delay);
    }

    /// Cancel without firing.
    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    /// Is a countdown running?
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Time left, if running.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Feed elapsed time. Returns `true` exactly once, when the countdown expires.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        match self.remaining {
            Some(left) if elapsed >= left => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - elapsed);
                false
            }
            None => false,
        }
    }
}
