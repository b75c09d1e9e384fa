// src/sync/polling.rs
//! Adaptive poll interval for watching a parte.
//!
//! Polling speeds up right after a change, slows down while nothing
//! happens and backs off harder while the server is failing.

use crate::constants::{
    POLL_BASE_INTERVAL_MS, POLL_FAST_CYCLES, POLL_FAST_INTERVAL_MS, POLL_IDLE_GROWTH,
    POLL_MAX_INTERVAL_MS,
};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct PollSchedule {
    base: Duration,
    fast: Duration,
    fast_cycles: u32,
    max: Duration,
    current: Duration,
    fast_remaining: u32,
    failures: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(POLL_BASE_INTERVAL_MS),
            Duration::from_millis(POLL_FAST_INTERVAL_MS),
            POLL_FAST_CYCLES,
            Duration::from_millis(POLL_MAX_INTERVAL_MS),
        )
    }
}

impl PollSchedule {
    pub fn new(base: Duration, fast: Duration, fast_cycles: u32, max: Duration) -> Self {
        let max = max.max(base);
        Self {
            base,
            fast: fast.min(base),
            fast_cycles,
            max,
            current: base,
            fast_remaining: 0,
            failures: 0,
        }
    }

    /// Delay before the next poll.
    pub fn next_delay(&self) -> Duration {
        if self.fast_remaining > 0 {
            self.fast
        } else {
            self.current
        }
    }

    /// [`next_delay`](Self::next_delay) spread by up to 10% either way, so
    /// several watchers started together don't poll in lockstep.
    pub fn next_delay_jittered(&self) -> Duration {
        let factor = rand::rng().random_range(0.9..=1.1);
        self.next_delay().mul_f64(factor)
    }

    /// Consecutive failed polls.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_change(&mut self) {
        self.current = self.base;
        self.fast_remaining = self.fast_cycles;
        self.failures = 0;
    }

    pub fn record_unchanged(&mut self) {
        if self.failures > 0 {
            self.failures = 0;
            self.current = self.base;
            return;
        }
        if self.fast_remaining > 0 {
            self.fast_remaining -= 1;
            return;
        }
        self.current = self.current.mul_f64(POLL_IDLE_GROWTH).min(self.max);
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        self.fast_remaining = 0;
        self.current = self.current.saturating_mul(2).min(self.max);
    }
}
