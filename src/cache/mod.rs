// src/cache/mod.rs
mod entry;
mod ttl_cache;

pub use entry::CacheEntry;
pub use ttl_cache::TtlCache;
