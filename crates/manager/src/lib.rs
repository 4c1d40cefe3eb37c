//! Cache management for content records.
//!
//! A [`CacheManager`] fronts one record kind in the persistent store and
//! keeps it within a [`RetentionPolicy`]: at most `max_items` records, none
//! older than `ttl`, evicting least recently cached first. Every operation
//! runs as a background task on a bounded [`TaskPool`] and hands back a
//! [`TaskHandle`], so callers stay off the hot path but can still await
//! results and observe write [`Outcome`]s.

mod manager;
mod policy;
mod pool;

pub use crate::manager::{CacheManager, Outcome};
pub use crate::policy::{
    CacheStats, DEFAULT_ITEM_SIZE_ESTIMATE, DEFAULT_MAX_ITEMS, DEFAULT_TTL, RetentionPolicy,
};
pub use crate::pool::{DEFAULT_WORKERS, TaskHandle, TaskPool};
