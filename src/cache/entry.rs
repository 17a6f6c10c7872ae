// src/cache/entry.rs
use tokio::time::{Duration, Instant};

/// A single cached value with its expiry metadata.
///
/// Entries are never mutated; a recomputation installs a new entry.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub ttl: Duration,
    pub refresh_threshold: Duration,
    /// Write sequence drawn when the computation producing this value started.
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration, refresh_threshold: Duration, sequence: u64) -> Self {
        Self::starting_at(value, Instant::now(), ttl, refresh_threshold, sequence)
    }

    pub fn starting_at(
        value: V,
        created_at: Instant,
        ttl: Duration,
        refresh_threshold: Duration,
        sequence: u64,
    ) -> Self {
        Self {
            value,
            created_at,
            expires_at: created_at + ttl,
            ttl,
            refresh_threshold,
            sequence,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// True once the remaining lifetime has shrunk into the refresh window.
    pub fn should_refresh(&self, now: Instant) -> bool {
        self.remaining(now) <= self.refresh_threshold
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}
