//! The cache manager: retention-policy enforcement over one record kind.

use crate::policy::{CacheStats, RetentionPolicy};
use crate::pool::{TaskHandle, TaskPool};
use std::marker::PhantomData;
use std::sync::Arc;
use time::UtcDateTime;
use tipstash_store::error::Result;
use tipstash_store::{CacheRecord, Repository};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// What became of a cache write.
///
/// Write failures are reported here instead of being logged and forgotten,
/// so callers can tell "stored" apart from "the store is broken".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The batch was written; `written` counts the records that made it in
    /// (invalid records are dropped from the batch first).
    Stored { written: usize },
    /// Every record in the batch was invalid; nothing was written.
    Rejected,
    /// The store refused the write. The records are not cached.
    Failed,
}

/// Manages one kind's cache: writes records through to the store and keeps
/// the table within its [`RetentionPolicy`].
///
/// All operations run as background tasks on the shared [`TaskPool`] and
/// return a [`TaskHandle`]; callers await the handle when they need the
/// result and drop it when they do not.
///
/// Mutating sequences (write-then-sweep, count-then-evict) hold an internal
/// lock for their whole duration, so two concurrent sweeps can never both
/// read a stale count and over-delete.
#[derive(Debug)]
pub struct CacheManager<R: CacheRecord> {
    repo: Repository,
    pool: TaskPool,
    policy: RetentionPolicy,
    write_lock: Arc<Mutex<()>>,
    _kind: PhantomData<fn() -> R>,
}

// Derived Clone would demand R: Clone, which the manager never needs.
impl<R: CacheRecord> Clone for CacheManager<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            pool: self.pool.clone(),
            policy: self.policy,
            write_lock: Arc::clone(&self.write_lock),
            _kind: PhantomData,
        }
    }
}

impl<R: CacheRecord> CacheManager<R> {
    /// Create a manager for one record kind.
    ///
    /// Managers for different kinds may (and normally do) share the same
    /// repository and task pool; each gets its own policy and write lock.
    pub fn new(repo: Repository, pool: TaskPool, policy: RetentionPolicy) -> Self {
        Self {
            repo,
            pool,
            policy,
            write_lock: Arc::new(Mutex::new(())),
            _kind: PhantomData,
        }
    }

    /// The policy this manager enforces.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Cache a single record.
    pub fn cache_item(&self, record: R) -> TaskHandle<Outcome> {
        self.cache_batch(vec![record])
    }

    /// Cache a batch of records in one store transaction.
    ///
    /// Records with a blank id are dropped from the batch before writing;
    /// every surviving record has its recency marker stamped with a single
    /// shared "now". A retention sweep runs immediately after the write, so
    /// the table never stays over its cap for longer than one task.
    pub fn cache_batch(&self, records: Vec<R>) -> TaskHandle<Outcome> {
        let manager = self.clone();
        self.pool.spawn(async move { manager.write_batch(records).await })
    }

    /// Look up a cached record by id.
    ///
    /// A store error reads as a cache miss: the caller falls back to the
    /// backend either way, and the error is logged here.
    pub fn get(&self, id: impl Into<String>) -> TaskHandle<Option<R>> {
        let manager = self.clone();
        let id = id.into();
        self.pool.spawn(async move {
            match R::fetch(&manager.repo, &id).await {
                Ok(record) => record,
                Err(error) => {
                    warn!(kind = R::KIND.table(), %id, %error, "cache read failed");
                    None
                },
            }
        })
    }

    /// Refresh a record's recency marker, protecting it from LRU eviction.
    ///
    /// Resolves to `false` when the id is not cached (or the store errored).
    pub fn touch(&self, id: impl Into<String>) -> TaskHandle<bool> {
        let manager = self.clone();
        let id = id.into();
        self.pool.spawn(async move {
            match manager.repo.touch(R::KIND, &id, UtcDateTime::now()).await {
                Ok(touched) => touched,
                Err(error) => {
                    warn!(kind = R::KIND.table(), %id, %error, "cache touch failed");
                    false
                },
            }
        })
    }

    /// Run a retention sweep now: expire everything past its TTL, then evict
    /// the least recently cached records down to the policy cap.
    ///
    /// Resolves to the number of records removed.
    pub fn cleanup(&self) -> TaskHandle<u64> {
        let manager = self.clone();
        self.pool.spawn(async move {
            let _guard = manager.write_lock.lock().await;
            match manager.enforce_locked(UtcDateTime::now()).await {
                Ok(removed) => removed,
                Err(error) => {
                    warn!(kind = R::KIND.table(), %error, "retention sweep failed");
                    0
                },
            }
        })
    }

    /// Drop every cached record of this kind.
    pub fn clear(&self) -> TaskHandle<u64> {
        let manager = self.clone();
        self.pool.spawn(async move {
            let _guard = manager.write_lock.lock().await;
            match manager.repo.delete_all(R::KIND).await {
                Ok(removed) => {
                    debug!(kind = R::KIND.table(), removed, "cache cleared");
                    removed
                },
                Err(error) => {
                    warn!(kind = R::KIND.table(), %error, "cache clear failed");
                    0
                },
            }
        })
    }

    /// Snapshot the cache's occupancy.
    ///
    /// On a store error the snapshot degenerates to zero items (the cap is
    /// still reported) rather than failing.
    pub fn stats(&self) -> TaskHandle<CacheStats> {
        let manager = self.clone();
        self.pool.spawn(async move {
            let items = match manager.repo.count(R::KIND).await {
                Ok(items) => items,
                Err(error) => {
                    warn!(kind = R::KIND.table(), %error, "cache stats query failed");
                    0
                },
            };
            CacheStats {
                items,
                estimated_bytes: items * manager.policy.item_size_estimate,
                max_items: manager.policy.max_items,
            }
        })
    }

    async fn write_batch(&self, mut records: Vec<R>) -> Outcome {
        if records.is_empty() {
            return Outcome::Stored { written: 0 };
        }
        records.retain(|record| {
            let valid = !record.id().trim().is_empty();
            if !valid {
                warn!(kind = R::KIND.table(), "dropping record with blank id");
            }
            valid
        });
        if records.is_empty() {
            return Outcome::Rejected;
        }
        let now = UtcDateTime::now();
        for record in &mut records {
            record.stamp(now);
        }

        let _guard = self.write_lock.lock().await;
        if let Err(error) = R::upsert_all(&self.repo, &records).await {
            warn!(kind = R::KIND.table(), %error, "cache write failed");
            return Outcome::Failed;
        }
        // The sweep is best-effort: the records are in regardless.
        if let Err(error) = self.enforce_locked(now).await {
            warn!(kind = R::KIND.table(), %error, "retention sweep after write failed");
        }
        Outcome::Stored { written: records.len() }
    }

    /// TTL expiry then cap eviction. Caller must hold the write lock so the
    /// count and the delete see the same table.
    async fn enforce_locked(&self, now: UtcDateTime) -> Result<u64> {
        let mut removed = self.repo.delete_older_than(R::KIND, now - self.policy.ttl).await?;
        let count = self.repo.count(R::KIND).await?;
        if count > self.policy.max_items {
            removed += self.repo.delete_oldest(R::KIND, count - self.policy.max_items).await?;
        }
        if removed > 0 {
            debug!(kind = R::KIND.table(), removed, "retention sweep removed records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tipstash_store::{Database, RecordKind, TipRecord};

    fn tip(id: &str) -> TipRecord {
        TipRecord {
            id: id.to_string(),
            title: format!("tip {id}"),
            excerpt: None,
            category_id: None,
            category_name: None,
            view_count: 0,
            like_count: 0,
            image_url: None,
            created_at: UtcDateTime::now(),
            is_favorite: false,
            is_liked: false,
            recommendation_score: 0,
            cached_at: UtcDateTime::now(),
        }
    }

    fn stale_tip(id: &str, age: Duration) -> TipRecord {
        let mut record = tip(id);
        record.cached_at = UtcDateTime::now() - age;
        record
    }

    async fn manager(policy: RetentionPolicy) -> (CacheManager<TipRecord>, Repository) {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        (CacheManager::new(repo.clone(), TaskPool::default(), policy), repo)
    }

    #[tokio::test]
    async fn test_cache_and_get() {
        let (manager, _) = manager(RetentionPolicy::default()).await;
        let outcome = manager.cache_item(tip("tip-1")).join().await.unwrap();
        assert_eq!(outcome, Outcome::Stored { written: 1 });
        let found = manager.get("tip-1").join().await.unwrap();
        assert_eq!(found.unwrap().id, "tip-1");
        assert!(manager.get("tip-2").join().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_ids_are_dropped_from_batch() {
        let (manager, repo) = manager(RetentionPolicy::default()).await;
        let outcome = manager
            .cache_batch(vec![tip("tip-1"), tip(""), tip("  "), tip("tip-2")])
            .join()
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Stored { written: 2 });
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_all_blank_batch_is_rejected() {
        let (manager, repo) = manager(RetentionPolicy::default()).await;
        let outcome = manager.cache_batch(vec![tip(""), tip("")]).join().await.unwrap();
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let (manager, _) = manager(RetentionPolicy::default()).await;
        let outcome = manager.cache_batch(vec![]).join().await.unwrap();
        assert_eq!(outcome, Outcome::Stored { written: 0 });
    }

    #[tokio::test]
    async fn test_write_stamps_recency() {
        let (manager, repo) = manager(RetentionPolicy::default()).await;
        let stale = stale_tip("tip-1", Duration::from_secs(3600));
        manager.cache_item(stale).join().await.unwrap();
        let stored = repo.get_tip("tip-1").await.unwrap().unwrap();
        assert!(UtcDateTime::now() - stored.cached_at < time::Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_ttl_expiry_on_cleanup() {
        let policy = RetentionPolicy {
            ttl: Duration::from_secs(7 * 24 * 60 * 60),
            ..RetentionPolicy::default()
        };
        let (manager, repo) = manager(policy).await;
        // Bypass the manager so the stale timestamps survive.
        repo.upsert_tips(&[
            stale_tip("fresh", Duration::from_secs(60)),
            stale_tip("expired-1", Duration::from_secs(8 * 24 * 60 * 60)),
            stale_tip("expired-2", Duration::from_secs(30 * 24 * 60 * 60)),
        ])
        .await
        .unwrap();
        let removed = manager.cleanup().join().await.unwrap();
        assert_eq!(removed, 2);
        assert!(repo.get_tip("fresh").await.unwrap().is_some());
        assert!(repo.get_tip("expired-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cap_eviction_drops_least_recent() {
        let policy = RetentionPolicy {
            max_items: 3,
            ..RetentionPolicy::default()
        };
        let (manager, repo) = manager(policy).await;
        let tips: Vec<_> = (0..5)
            .map(|i| stale_tip(&format!("tip-{i}"), Duration::from_secs(1000 - i * 100)))
            .collect();
        repo.upsert_tips(&tips).await.unwrap();
        let removed = manager.cleanup().join().await.unwrap();
        assert_eq!(removed, 2);
        // tip-0 and tip-1 carried the oldest markers.
        assert!(repo.get_tip("tip-0").await.unwrap().is_none());
        assert!(repo.get_tip("tip-1").await.unwrap().is_none());
        assert!(repo.get_tip("tip-2").await.unwrap().is_some());
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_write_sweeps_immediately() {
        let policy = RetentionPolicy {
            max_items: 2,
            ..RetentionPolicy::default()
        };
        let (manager, repo) = manager(policy).await;
        repo.upsert_tips(&[
            stale_tip("old-1", Duration::from_secs(300)),
            stale_tip("old-2", Duration::from_secs(200)),
        ])
        .await
        .unwrap();
        manager.cache_item(tip("new")).join().await.unwrap();
        // The write pushed the table over the cap; the oldest record went.
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 2);
        assert!(repo.get_tip("old-1").await.unwrap().is_none());
        assert!(repo.get_tip("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touch_protects_from_eviction() {
        let policy = RetentionPolicy {
            max_items: 2,
            ..RetentionPolicy::default()
        };
        let (manager, repo) = manager(policy).await;
        repo.upsert_tips(&[
            stale_tip("a", Duration::from_secs(300)),
            stale_tip("b", Duration::from_secs(200)),
            stale_tip("c", Duration::from_secs(100)),
        ])
        .await
        .unwrap();
        assert!(manager.touch("a").join().await.unwrap());
        manager.cleanup().join().await.unwrap();
        // "a" was the oldest but got touched; "b" is evicted instead.
        assert!(repo.get_tip("a").await.unwrap().is_some());
        assert!(repo.get_tip("b").await.unwrap().is_none());
        assert!(repo.get_tip("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touch_unknown_id() {
        let (manager, _) = manager(RetentionPolicy::default()).await;
        assert!(!manager.touch("ghost").join().await.unwrap());
    }

    #[tokio::test]
    async fn test_clear() {
        let (manager, repo) = manager(RetentionPolicy::default()).await;
        manager.cache_batch(vec![tip("tip-1"), tip("tip-2")]).join().await.unwrap();
        assert_eq!(manager.clear().join().await.unwrap(), 2);
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats_estimate() {
        let policy = RetentionPolicy {
            item_size_estimate: 1024,
            ..RetentionPolicy::default()
        };
        let (manager, _) = manager(policy).await;
        manager.cache_batch(vec![tip("tip-1"), tip("tip-2"), tip("tip-3")]).join().await.unwrap();
        let stats = manager.stats().join().await.unwrap();
        assert_eq!(stats, CacheStats {
            items: 3,
            estimated_bytes: 3 * 1024,
            max_items: 100,
        });
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_do_not_over_delete() {
        let policy = RetentionPolicy {
            max_items: 4,
            ..RetentionPolicy::default()
        };
        let (manager, repo) = manager(policy).await;
        let tips: Vec<_> = (0..10)
            .map(|i| stale_tip(&format!("tip-{i}"), Duration::from_secs(1000 - i * 10)))
            .collect();
        repo.upsert_tips(&tips).await.unwrap();
        let first = manager.cleanup();
        let second = manager.cleanup();
        let removed = first.join().await.unwrap() + second.join().await.unwrap();
        assert_eq!(removed, 6);
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 4);
    }
}
