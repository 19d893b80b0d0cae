//! A single timestamped, TTL-bearing cache cell.

use std::time::{Duration, Instant};

use super::value::CacheValue;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    stored_at: Instant,
    ttl: Duration,
    pub value: CacheValue,
}

impl CacheEntry {
    /// `ttl` of `Duration::ZERO` means the entry never expires, matching the
    /// reference implementation's convention of a non-positive ttl.
    pub fn new(value: CacheValue, ttl: Duration) -> Self {
        Self {
            stored_at: Instant::now(),
            ttl,
            value,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        now > self.stored_at + self.ttl
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Rewrites the ttl in place without touching `stored_at`, matching
    /// `UpdateTTL`'s semantics in the reference implementation.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }
}
