//! Retention policy and cache statistics.

use std::time::Duration;

/// Default cap on cached records per kind.
pub const DEFAULT_MAX_ITEMS: u64 = 100;
/// Default time-to-live for a cached record: seven days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Default per-record size estimate used for [`CacheStats::estimated_bytes`].
pub const DEFAULT_ITEM_SIZE_ESTIMATE: u64 = 50 * 1024;

/// How long and how many records a cache keeps.
///
/// Records older than `ttl` are expired; once the count exceeds `max_items`
/// the least recently cached records are evicted until it no longer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_items: u64,
    pub ttl: Duration,
    /// Rough bytes-per-record figure for reporting. Record payloads vary,
    /// so stats derived from this are estimates, never measurements.
    pub item_size_estimate: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            ttl: DEFAULT_TTL,
            item_size_estimate: DEFAULT_ITEM_SIZE_ESTIMATE,
        }
    }
}

/// A point-in-time snapshot of one cache's occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Records currently stored.
    pub items: u64,
    /// `items` multiplied by the policy's size estimate.
    pub estimated_bytes: u64,
    /// The policy cap the item count is measured against.
    pub max_items: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.max_items, 100);
        assert_eq!(policy.ttl, Duration::from_secs(604_800));
        assert_eq!(policy.item_size_estimate, 51_200);
    }
}
