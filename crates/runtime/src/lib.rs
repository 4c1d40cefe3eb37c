//! Cache subsystem lifecycle.
//!
//! A [`CacheRuntime`] owns every cache component for the life of the app:
//! the SQLite record store, one [`CacheManager`] per record kind (sharing a
//! bounded task pool), and the media byte cache. It is constructed from a
//! [`Config`], handed around by reference, and torn down explicitly with
//! [`shutdown`](CacheRuntime::shutdown) - there is no global instance.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use tipstash_config::{Config, RetentionPolicyConfig};
use tipstash_manager::{CacheManager, RetentionPolicy, TaskPool};
use tipstash_media::MediaCache;
use tipstash_store::{
    CategoryRecord, Database, NotificationRecord, Repository, TipRecord, VideoRecord,
};
use tracing::{info, instrument};

/// The assembled cache subsystem.
pub struct CacheRuntime {
    db: Database,
    repo: Repository,
    pool: TaskPool,
    tips: CacheManager<TipRecord>,
    categories: CacheManager<CategoryRecord>,
    videos: CacheManager<VideoRecord>,
    notifications: CacheManager<NotificationRecord>,
    media: Arc<MediaCache>,
}

impl CacheRuntime {
    /// Start the cache subsystem: connect (and migrate) the store, open the
    /// media cache, and wire a manager per record kind onto a shared pool.
    #[instrument("starting cache runtime", skip(config))]
    pub async fn start(config: &Config) -> Result<Self> {
        let store_path = config.store_path().or_raise(|| ErrorKind::Config)?;
        let media_dir = config.media_dir().or_raise(|| ErrorKind::Config)?;

        let db = Database::connect(&store_path).await.or_raise(|| ErrorKind::Store)?;
        let repo = Repository::from(&db);
        let pool = TaskPool::new(config.pool.workers);
        let media = Arc::new(
            MediaCache::open(media_dir, config.media.max_bytes)
                .await
                .or_raise(|| ErrorKind::Media)?,
        );

        let retention = &config.retention;
        let runtime = Self {
            tips: Self::manager(&repo, &pool, retention.tips),
            categories: Self::manager(&repo, &pool, retention.categories),
            videos: Self::manager(&repo, &pool, retention.videos),
            notifications: Self::manager(&repo, &pool, retention.notifications),
            db,
            repo,
            pool,
            media,
        };
        info!(store = %store_path.display(), "cache runtime started");
        Ok(runtime)
    }

    fn manager<R: tipstash_store::CacheRecord>(
        repo: &Repository,
        pool: &TaskPool,
        config: RetentionPolicyConfig,
    ) -> CacheManager<R> {
        CacheManager::new(repo.clone(), pool.clone(), RetentionPolicy {
            max_items: config.max_items,
            ttl: Duration::from_secs(config.ttl_secs),
            item_size_estimate: config.item_size_estimate,
        })
    }

    pub fn tips(&self) -> &CacheManager<TipRecord> {
        &self.tips
    }

    pub fn categories(&self) -> &CacheManager<CategoryRecord> {
        &self.categories
    }

    pub fn videos(&self) -> &CacheManager<VideoRecord> {
        &self.videos
    }

    pub fn notifications(&self) -> &CacheManager<NotificationRecord> {
        &self.notifications
    }

    pub fn media(&self) -> &MediaCache {
        &self.media
    }

    /// Direct access to the repository for queries the managers do not
    /// cover (category listings, notification history, read flags).
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// The task pool shared by the managers, for scheduling app-side work
    /// alongside cache tasks.
    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// Run a retention sweep on every record kind, resolving to the total
    /// number of records removed.
    pub async fn cleanup_all(&self) -> u64 {
        let sweeps = [
            self.tips.cleanup(),
            self.categories.cleanup(),
            self.videos.cleanup(),
            self.notifications.cleanup(),
        ];
        let mut removed = 0;
        for sweep in sweeps {
            removed += sweep.join().await.unwrap_or(0);
        }
        removed
    }

    /// Wipe every cache: all record kinds and all media spans.
    pub async fn clear_all(&self) -> Result<()> {
        let clears = [
            self.tips.clear(),
            self.categories.clear(),
            self.videos.clear(),
            self.notifications.clear(),
        ];
        for clear in clears {
            _ = clear.join().await;
        }
        self.media.clear().await.or_raise(|| ErrorKind::Media)
    }

    /// Shut the subsystem down: release the media cache and close the store.
    ///
    /// Tasks already submitted to the pool run to completion on the runtime;
    /// the store waits for its connections before closing.
    pub async fn shutdown(self) {
        self.media.release().await;
        self.db.close().await;
        info!("cache runtime shut down");
    }
}
