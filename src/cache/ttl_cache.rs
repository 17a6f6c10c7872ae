// src/cache/ttl_cache.rs
use super::entry::CacheEntry;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

/// Called with every value that actually lands in the store.
type InstallListener<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Per-key time-to-live cache with stale-while-revalidate reads.
///
/// Cloning is cheap and every clone shares the same store, which is what
/// lets `wrap` hand a copy of itself to a detached refresh task.
pub struct TtlCache<V> {
    entries: Arc<DashMap<String, Arc<CacheEntry<V>>>>,
    refreshing: Arc<DashMap<String, ()>>,
    sequence: Arc<AtomicU64>,
    on_install: Option<InstallListener<V>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            refreshing: self.refreshing.clone(),
            sequence: self.sequence.clone(),
            on_install: self.on_install.clone(),
        }
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            refreshing: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
            on_install: None,
        }
    }

    /// A cache that reports each installed value to `listener`.
    ///
    /// Superseded writes are dropped before the listener sees them, so
    /// anything mirrored from it agrees with what `get` returns.
    pub fn with_listener<L>(listener: L) -> Self
    where
        L: Fn(&str, &V) + Send + Sync + 'static,
    {
        Self {
            on_install: Some(Arc::new(listener)),
            ..Self::new()
        }
    }

    /// Returns the cached value if it has not expired. Never computes.
    pub fn get(&self, key: &str) -> Option<V> {
        self.live_entry(key, Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Installs `value` unconditionally, restarting its expiry clock.
    pub fn set(&self, key: &str, value: V, ttl: Duration, refresh_threshold: Duration) {
        let sequence = self.next_sequence();
        self.install(key, value, ttl, refresh_threshold, sequence);
    }

    /// Stale-while-revalidate read.
    ///
    /// A live entry is returned immediately; if it sits inside its refresh
    /// window, `factory` runs on a detached task and its result replaces the
    /// entry later. Refresh errors are logged and dropped. A missing or
    /// expired entry makes the caller wait for `factory` inline, and an
    /// error on that path is returned without touching the cache.
    pub async fn wrap<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Duration,
        refresh_threshold: Duration,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let now = Instant::now();

        if let Some(entry) = self.live_entry(key, now) {
            if entry.should_refresh(now) {
                self.spawn_refresh(key, factory, ttl, refresh_threshold);
            } else {
                debug!(key, remaining = ?entry.remaining(now), "Cache hit");
            }
            return Ok(entry.value.clone());
        }

        debug!(key, "Cache miss, computing inline");
        let sequence = self.next_sequence();
        let value = factory().await?;
        self.install(key, value.clone(), ttl, refresh_threshold, sequence);
        Ok(value)
    }

    /// Whether a background refresh for `key` is currently running.
    pub fn is_refreshing(&self, key: &str) -> bool {
        self.refreshing.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_entry(&self, key: &str, now: Instant) -> Option<Arc<CacheEntry<V>>> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .filter(|entry| !entry.is_expired(now))
    }

    fn spawn_refresh<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Duration,
        refresh_threshold: Duration,
    ) where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        if self.refreshing.insert(key.to_string(), ()).is_some() {
            debug!(key, "Refresh already in flight");
            return;
        }

        debug!(key, "Entry inside refresh window, refreshing in background");
        let cache = self.clone();
        let key = key.to_string();
        let sequence = self.next_sequence();

        tokio::spawn(async move {
            let _guard = RefreshGuard {
                refreshing: cache.refreshing.clone(),
                key: key.clone(),
            };

            match factory().await {
                Ok(value) => {
                    cache.install(&key, value, ttl, refresh_threshold, sequence);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Background refresh failed, keeping cached value");
                }
            }
        });
    }

    /// Replaces the entry unless a computation that started later already
    /// landed. Returns whether the value was installed.
    fn install(
        &self,
        key: &str,
        value: V,
        ttl: Duration,
        refresh_threshold: Duration,
        sequence: u64,
    ) -> bool {
        let entry = Arc::new(CacheEntry::new(value, ttl, refresh_threshold, sequence));

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().sequence > sequence {
                    debug!(key, sequence, "Discarding superseded cache write");
                    return false;
                }
                self.notify(key, &entry.value);
                occupied.insert(entry);
            }
            Entry::Vacant(vacant) => {
                self.notify(key, &entry.value);
                vacant.insert(entry);
            }
        }
        true
    }

    // Runs under the shard lock so listeners observe installs in store order.
    fn notify(&self, key: &str, value: &V) {
        if let Some(listener) = &self.on_install {
            listener(key, value);
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Clears the in-flight marker even if the refresh future panics.
struct RefreshGuard {
    refreshing: Arc<DashMap<String, ()>>,
    key: String,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.refreshing.remove(&self.key);
    }
}
