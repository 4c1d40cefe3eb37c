//! Repository of cached content records.
//!
//! One repository serves all record kinds. The retention primitives (count,
//! TTL deletion, LRU deletion, touch) are generic over [`RecordKind`] because
//! every table shares the same shape for them; the upserts and reads are
//! typed per kind.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::kind::RecordKind;
use crate::models::{CategoryRow, NotificationRow, TipRow, VideoRow};
use crate::{CategoryRecord, NotificationRecord, TipRecord, VideoRecord};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Repository for cached content records.
///
/// Cheap to clone; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Retention primitives (generic over kind)
    // =========================================================================

    /// Count the records of a kind.
    pub async fn count(&self, kind: RecordKind) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", kind.table()))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    /// Delete every record of a kind. Returns the number of rows removed.
    pub async fn delete_all(&self, kind: RecordKind) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {}", kind.table()))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    /// Delete every record of a kind whose recency marker is strictly older
    /// than `cutoff`. This is the TTL half of the retention policy.
    pub async fn delete_older_than(&self, kind: RecordKind, cutoff: UtcDateTime) -> Result<u64> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE {} < ?",
            kind.table(),
            kind.recency_column()
        ))
        .bind(cutoff.unix_timestamp())
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    /// Delete the `n` records of a kind with the oldest recency markers.
    ///
    /// Ties on the recency column break on ascending id so that eviction is
    /// deterministic per run.
    pub async fn delete_oldest(&self, kind: RecordKind, n: u64) -> Result<u64> {
        if n == 0 {
            return Ok(0);
        }
        let limit = i64::try_from(n).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let table = kind.table();
        let recency = kind.recency_column();
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE id IN \
             (SELECT id FROM {table} ORDER BY {recency} ASC, id ASC LIMIT ?)"
        ))
        .bind(limit)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    /// Move a record's recency marker to `now` without changing its payload.
    ///
    /// Returns `false` (not an error) if no record with that id exists.
    pub async fn touch(&self, kind: RecordKind, id: &str, now: UtcDateTime) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET {} = ? WHERE id = ?",
            kind.table(),
            kind.recency_column()
        ))
        .bind(now.unix_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Tips
    // =========================================================================

    /// Insert-or-replace a batch of tips in one transaction.
    pub async fn upsert_tips(&self, tips: &[TipRecord]) -> Result<()> {
        if tips.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for tip in tips {
            let row = TipRow::from(tip);
            sqlx::query(
                "INSERT OR REPLACE INTO tips \
                 (id, title, excerpt, category_id, category_name, view_count, like_count, \
                  image_url, created_at, is_favorite, is_liked, recommendation_score, cached_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(row.title)
            .bind(row.excerpt)
            .bind(row.category_id)
            .bind(row.category_name)
            .bind(row.view_count)
            .bind(row.like_count)
            .bind(row.image_url)
            .bind(row.created_at)
            .bind(row.is_favorite)
            .bind(row.is_liked)
            .bind(row.recommendation_score)
            .bind(row.cached_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Get a tip by id.
    pub async fn get_tip(&self, id: &str) -> Result<Option<TipRecord>> {
        let row: Option<TipRow> = sqlx::query_as("SELECT * FROM tips WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(TipRecord::try_from).transpose()
    }

    /// List the tips of a category, newest content first.
    pub async fn tips_by_category(&self, category_id: &str, limit: u32) -> Result<Vec<TipRecord>> {
        let rows: Vec<TipRow> =
            sqlx::query_as("SELECT * FROM tips WHERE category_id = ? ORDER BY created_at DESC LIMIT ?")
                .bind(category_id)
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(TipRecord::try_from).collect()
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Insert-or-replace a batch of categories in one transaction.
    pub async fn upsert_categories(&self, categories: &[CategoryRecord]) -> Result<()> {
        if categories.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for category in categories {
            let row = CategoryRow::from(category);
            sqlx::query(
                "INSERT OR REPLACE INTO categories \
                 (id, name, description, icon, color, tip_count, order_index, cached_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(row.name)
            .bind(row.description)
            .bind(row.icon)
            .bind(row.color)
            .bind(row.tip_count)
            .bind(row.order_index)
            .bind(row.cached_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Get a category by id.
    pub async fn get_category(&self, id: &str) -> Result<Option<CategoryRecord>> {
        let row: Option<CategoryRow> = sqlx::query_as("SELECT * FROM categories WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CategoryRecord::try_from).transpose()
    }

    /// List all cached categories in display order.
    pub async fn categories(&self) -> Result<Vec<CategoryRecord>> {
        let rows: Vec<CategoryRow> = sqlx::query_as("SELECT * FROM categories ORDER BY order_index ASC, id ASC")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(CategoryRecord::try_from).collect()
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Insert-or-replace a batch of videos in one transaction.
    pub async fn upsert_videos(&self, videos: &[VideoRecord]) -> Result<()> {
        if videos.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for video in videos {
            let row = VideoRow::try_from(video)?;
            sqlx::query(
                "INSERT OR REPLACE INTO videos \
                 (id, title, caption, video_url, thumbnail_url, uploader_id, uploader_name, \
                  uploader_avatar, view_count, like_count, comment_count, share_count, \
                  upload_date, duration, is_liked, cached_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(row.title)
            .bind(row.caption)
            .bind(row.video_url)
            .bind(row.thumbnail_url)
            .bind(row.uploader_id)
            .bind(row.uploader_name)
            .bind(row.uploader_avatar)
            .bind(row.view_count)
            .bind(row.like_count)
            .bind(row.comment_count)
            .bind(row.share_count)
            .bind(row.upload_date)
            .bind(row.duration)
            .bind(row.is_liked)
            .bind(row.cached_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Get a video by id.
    pub async fn get_video(&self, id: &str) -> Result<Option<VideoRecord>> {
        let row: Option<VideoRow> = sqlx::query_as("SELECT * FROM videos WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(VideoRecord::try_from).transpose()
    }

    /// List the most recently uploaded videos.
    pub async fn recent_videos(&self, limit: u32) -> Result<Vec<VideoRecord>> {
        let rows: Vec<VideoRow> = sqlx::query_as("SELECT * FROM videos ORDER BY upload_date DESC LIMIT ?")
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(VideoRecord::try_from).collect()
    }

    // =========================================================================
    // Notification history
    // =========================================================================

    /// Insert-or-replace a batch of notifications in one transaction.
    pub async fn upsert_notifications(&self, notifications: &[NotificationRecord]) -> Result<()> {
        if notifications.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for notification in notifications {
            let row = NotificationRow::try_from(notification)?;
            sqlx::query(
                "INSERT OR REPLACE INTO notification_history \
                 (id, notification_id, user_id, title, body, image_url, large_icon_url, type, \
                  category, priority, deep_link, target_id, target_type, is_read, is_deleted, \
                  is_synced, received_at, read_at, created_at, updated_at, extra_data) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(row.id)
            .bind(row.notification_id)
            .bind(row.user_id)
            .bind(row.title)
            .bind(row.body)
            .bind(row.image_url)
            .bind(row.large_icon_url)
            .bind(row.kind)
            .bind(row.category)
            .bind(row.priority)
            .bind(row.deep_link)
            .bind(row.target_id)
            .bind(row.target_type)
            .bind(row.is_read)
            .bind(row.is_deleted)
            .bind(row.is_synced)
            .bind(row.received_at)
            .bind(row.read_at)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(row.extra_data)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Get a notification by id (including soft-deleted ones).
    pub async fn get_notification(&self, id: &str) -> Result<Option<NotificationRecord>> {
        let row: Option<NotificationRow> =
            sqlx::query_as("SELECT * FROM notification_history WHERE id = ? LIMIT 1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        row.map(NotificationRecord::try_from).transpose()
    }

    /// List a user's notifications, newest first, hiding soft-deleted ones.
    pub async fn notifications_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRecord>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            "SELECT * FROM notification_history \
             WHERE user_id = ? AND is_deleted = 0 \
             ORDER BY received_at DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(NotificationRecord::try_from).collect()
    }

    /// Count a user's unread, non-deleted notifications.
    pub async fn unread_count(&self, user_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_history \
             WHERE user_id = ? AND is_read = 0 AND is_deleted = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    /// Mark one notification as read. Returns `false` if the id is unknown.
    pub async fn mark_read(&self, id: &str, now: UtcDateTime) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notification_history SET is_read = 1, read_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(now.unix_timestamp())
        .bind(now.unix_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a user's unread notifications as read. Returns how many
    /// rows changed.
    pub async fn mark_all_read(&self, user_id: &str, now: UtcDateTime) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notification_history SET is_read = 1, read_at = ?, updated_at = ? \
             WHERE user_id = ? AND is_read = 0 AND is_deleted = 0",
        )
        .bind(now.unix_timestamp())
        .bind(now.unix_timestamp())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    /// Soft-delete one notification. Returns `false` if the id is unknown.
    pub async fn soft_delete(&self, id: &str, now: UtcDateTime) -> Result<bool> {
        let result = sqlx::query("UPDATE notification_history SET is_deleted = 1, updated_at = ? WHERE id = ?")
            .bind(now.unix_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tip(id: &str, cached_at: i64) -> TipRecord {
        TipRecord {
            id: id.to_string(),
            title: format!("tip {id}"),
            excerpt: None,
            category_id: Some("cat-1".to_string()),
            category_name: Some("General".to_string()),
            view_count: 0,
            like_count: 0,
            image_url: None,
            created_at: UtcDateTime::from_unix_timestamp(cached_at).unwrap(),
            is_favorite: false,
            is_liked: false,
            recommendation_score: 0,
            cached_at: UtcDateTime::from_unix_timestamp(cached_at).unwrap(),
        }
    }

    fn notification(id: &str, user_id: &str, received_at: i64) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            notification_id: None,
            user_id: user_id.to_string(),
            title: "title".to_string(),
            body: "body".to_string(),
            image_url: None,
            large_icon_url: None,
            kind: "CONTENT".to_string(),
            category: None,
            priority: 0,
            deep_link: None,
            target_id: None,
            target_type: None,
            is_read: false,
            is_deleted: false,
            is_synced: false,
            received_at: UtcDateTime::from_unix_timestamp(received_at).unwrap(),
            read_at: None,
            created_at: UtcDateTime::from_unix_timestamp(received_at).unwrap(),
            updated_at: UtcDateTime::from_unix_timestamp(received_at).unwrap(),
            extra_data: None,
        }
    }

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    const T0: i64 = 1_700_000_000;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let repo = repo().await;
        repo.upsert_tips(&[tip("tip-1", T0)]).await.unwrap();
        let stored = repo.get_tip("tip-1").await.unwrap().unwrap();
        assert_eq!(stored.title, "tip tip-1");
        assert!(repo.get_tip("tip-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let repo = repo().await;
        repo.upsert_tips(&[tip("tip-1", T0)]).await.unwrap();
        let mut updated = tip("tip-1", T0 + 60);
        updated.title = "replaced".to_string();
        repo.upsert_tips(&[updated]).await.unwrap();
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 1);
        let stored = repo.get_tip("tip-1").await.unwrap().unwrap();
        assert_eq!(stored.title, "replaced");
        assert_eq!(stored.cached_at.unix_timestamp(), T0 + 60);
    }

    #[tokio::test]
    async fn test_delete_older_than() {
        let repo = repo().await;
        let tips: Vec<_> = (0..10).map(|i| tip(&format!("tip-{i:02}"), T0 + i)).collect();
        repo.upsert_tips(&tips).await.unwrap();
        let removed = repo
            .delete_older_than(RecordKind::Tip, UtcDateTime::from_unix_timestamp(T0 + 5).unwrap())
            .await
            .unwrap();
        assert_eq!(removed, 5);
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 5);
        // Cutoff is exclusive: the record stamped exactly at the cutoff stays.
        assert!(repo.get_tip("tip-05").await.unwrap().is_some());
        assert!(repo.get_tip("tip-04").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_oldest_orders_by_recency() {
        let repo = repo().await;
        let tips: Vec<_> = (0..5).map(|i| tip(&format!("tip-{i}"), T0 + i)).collect();
        repo.upsert_tips(&tips).await.unwrap();
        let removed = repo.delete_oldest(RecordKind::Tip, 2).await.unwrap();
        assert_eq!(removed, 2);
        assert!(repo.get_tip("tip-0").await.unwrap().is_none());
        assert!(repo.get_tip("tip-1").await.unwrap().is_none());
        assert!(repo.get_tip("tip-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_oldest_breaks_ties_by_id() {
        let repo = repo().await;
        // All five share the same recency marker.
        let tips: Vec<_> = ["e", "c", "a", "d", "b"].iter().map(|id| tip(id, T0)).collect();
        repo.upsert_tips(&tips).await.unwrap();
        repo.delete_oldest(RecordKind::Tip, 3).await.unwrap();
        // Ascending id wins the tie: a, b, c evicted.
        assert!(repo.get_tip("a").await.unwrap().is_none());
        assert!(repo.get_tip("b").await.unwrap().is_none());
        assert!(repo.get_tip("c").await.unwrap().is_none());
        assert!(repo.get_tip("d").await.unwrap().is_some());
        assert!(repo.get_tip("e").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_oldest_zero_is_noop() {
        let repo = repo().await;
        repo.upsert_tips(&[tip("tip-1", T0)]).await.unwrap();
        assert_eq!(repo.delete_oldest(RecordKind::Tip, 0).await.unwrap(), 0);
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_moves_recency() {
        let repo = repo().await;
        repo.upsert_tips(&[tip("tip-1", T0), tip("tip-2", T0 + 1)]).await.unwrap();
        let touched = repo
            .touch(RecordKind::Tip, "tip-1", UtcDateTime::from_unix_timestamp(T0 + 100).unwrap())
            .await
            .unwrap();
        assert!(touched);
        // tip-2 is now the oldest.
        repo.delete_oldest(RecordKind::Tip, 1).await.unwrap();
        assert!(repo.get_tip("tip-1").await.unwrap().is_some());
        assert!(repo.get_tip("tip-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_missing_id_is_noop() {
        let repo = repo().await;
        let touched = repo.touch(RecordKind::Tip, "ghost", UtcDateTime::now()).await.unwrap();
        assert!(!touched);
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_store() {
        let repo = repo().await;
        assert_eq!(repo.delete_all(RecordKind::Category).await.unwrap(), 0);
        assert_eq!(repo.count(RecordKind::Category).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_tips_by_category() {
        let repo = repo().await;
        let mut other = tip("tip-other", T0);
        other.category_id = Some("cat-2".to_string());
        repo.upsert_tips(&[tip("tip-1", T0), tip("tip-2", T0 + 1), other]).await.unwrap();
        let tips = repo.tips_by_category("cat-1", 10).await.unwrap();
        assert_eq!(tips.len(), 2);
        // Newest content first.
        assert_eq!(tips[0].id, "tip-2");
    }

    #[tokio::test]
    async fn test_kinds_are_isolated() {
        let repo = repo().await;
        repo.upsert_tips(&[tip("shared-id", T0)]).await.unwrap();
        repo.upsert_notifications(&[notification("shared-id", "user-1", T0)]).await.unwrap();
        repo.delete_all(RecordKind::Tip).await.unwrap();
        assert_eq!(repo.count(RecordKind::Tip).await.unwrap(), 0);
        assert_eq!(repo.count(RecordKind::Notification).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notification_read_flow() {
        let repo = repo().await;
        repo.upsert_notifications(&[
            notification("n-1", "user-1", T0),
            notification("n-2", "user-1", T0 + 1),
            notification("n-3", "user-2", T0 + 2),
        ])
        .await
        .unwrap();
        assert_eq!(repo.unread_count("user-1").await.unwrap(), 2);

        let now = UtcDateTime::from_unix_timestamp(T0 + 100).unwrap();
        assert!(repo.mark_read("n-1", now).await.unwrap());
        assert_eq!(repo.unread_count("user-1").await.unwrap(), 1);
        let read = repo.get_notification("n-1").await.unwrap().unwrap();
        assert!(read.is_read);
        assert_eq!(read.read_at.unwrap().unix_timestamp(), T0 + 100);
        // Marking read bumps the recency marker.
        assert_eq!(read.updated_at.unix_timestamp(), T0 + 100);

        assert_eq!(repo.mark_all_read("user-1", now).await.unwrap(), 1);
        assert_eq!(repo.unread_count("user-1").await.unwrap(), 0);
        assert_eq!(repo.unread_count("user-2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let repo = repo().await;
        repo.upsert_notifications(&[notification("n-1", "user-1", T0), notification("n-2", "user-1", T0 + 1)])
            .await
            .unwrap();
        assert!(repo.soft_delete("n-1", UtcDateTime::from_unix_timestamp(T0 + 50).unwrap()).await.unwrap());
        let listed = repo.notifications_for_user("user-1", 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "n-2");
        // Still physically present until retention removes it.
        assert_eq!(repo.count(RecordKind::Notification).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_notification_schema_matches_persisted_layout() {
        let repo = repo().await;
        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('notification_history') ORDER BY cid")
                .fetch_all(&repo.pool)
                .await
                .unwrap();
        assert_eq!(columns, vec![
            "id",
            "notification_id",
            "user_id",
            "title",
            "body",
            "image_url",
            "large_icon_url",
            "type",
            "category",
            "priority",
            "deep_link",
            "target_id",
            "target_type",
            "is_read",
            "is_deleted",
            "is_synced",
            "received_at",
            "read_at",
            "created_at",
            "updated_at",
            "extra_data",
        ]);
        let indexes: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM pragma_index_list('notification_history') WHERE origin = 'c' ORDER BY name",
        )
        .fetch_all(&repo.pool)
        .await
        .unwrap();
        assert_eq!(indexes, vec![
            "idx_notification_history_is_read",
            "idx_notification_history_received_at",
            "idx_notification_history_type",
            "idx_notification_history_user_id",
            "idx_notification_history_user_read_received",
            "idx_notification_history_user_received",
        ]);
    }
}
