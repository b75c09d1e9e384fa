// src/server/rate_limit.rs
//! Per-client token buckets.
//!
//! Buckets that sat idle long enough to refill completely are swept out
//! every [`RATE_LIMIT_SWEEP_EVERY`] checks, so spoofed client keys do not
//! accumulate.

use crate::constants::RATE_LIMIT_SWEEP_EVERY;
use crate::error::AppError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter keyed by client. Burst equals the per-minute limit.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    capacity: f64,
    refill_per_sec: f64,
    checks: AtomicU64,
}

impl RateLimiter {
    /// `per_minute == 0` disables limiting.
    pub fn per_minute(per_minute: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            capacity: f64::from(per_minute),
            refill_per_sec: f64::from(per_minute) / 60.0,
            checks: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0.0
    }

    /// Takes one token for `key`, or reports how long until one is available.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), AppError> {
        if !self.is_enabled() {
            return Ok(());
        }

        if self.checks.fetch_add(1, Ordering::Relaxed) % RATE_LIMIT_SWEEP_EVERY
            == RATE_LIMIT_SWEEP_EVERY - 1
        {
            self.sweep_idle(now);
        }

        let mut bucket = self.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - bucket.tokens) / self.refill_per_sec;
            Err(AppError::RateLimited {
                retry_after_secs: wait.ceil().max(1.0) as u64,
            })
        }
    }

    /// Time for an empty bucket to fill up again.
    fn refill_time(&self) -> Duration {
        Duration::from_secs_f64(self.capacity / self.refill_per_sec)
    }

    /// Drops buckets that would be full by `now`; a fresh bucket behaves the same.
    fn sweep_idle(&self, now: Instant) {
        let idle = self.refill_time();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < idle);
        let dropped = before.saturating_sub(self.buckets.len());
        if dropped > 0 {
            log::debug!("Rate limiter dropped {} idle clients", dropped);
        }
    }

    /// Clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}
