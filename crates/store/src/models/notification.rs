use crate::error::{Error, ErrorKind, Result};
use crate::kind::RecordKind;
use crate::models::timestamp;
use crate::record::CacheRecord;
use crate::repo::Repository;
use exn::ResultExt;
use std::future::Future;
use time::UtcDateTime;

/// A received notification, kept as local history.
///
/// The persisted layout of this record is frozen (see the
/// `notification_history` migration); it predates the generic record kinds
/// and has no `cached_at` column, so `updated_at` doubles as the recency
/// marker for retention.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: String,
    /// Id assigned by the delivery service, if any.
    pub notification_id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub large_icon_url: Option<String>,
    /// Notification type discriminator (stored in the `type` column).
    pub kind: String,
    pub category: Option<String>,
    pub priority: i32,
    pub deep_link: Option<String>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub is_read: bool,
    /// Soft-deletion flag; soft-deleted rows are hidden from user queries
    /// but still subject to retention like everything else.
    pub is_deleted: bool,
    pub is_synced: bool,
    pub received_at: UtcDateTime,
    pub read_at: Option<UtcDateTime>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
    /// Free-form payload attached by the sender.
    pub extra_data: Option<serde_json::Value>,
}

impl CacheRecord for NotificationRecord {
    const KIND: RecordKind = RecordKind::Notification;

    fn id(&self) -> &str {
        &self.id
    }

    fn cached_at(&self) -> UtcDateTime {
        self.updated_at
    }

    fn stamp(&mut self, cached_at: UtcDateTime) {
        self.updated_at = cached_at;
    }

    fn upsert_all(repo: &Repository, records: &[Self]) -> impl Future<Output = Result<()>> + Send {
        repo.upsert_notifications(records)
    }

    fn fetch(repo: &Repository, id: &str) -> impl Future<Output = Result<Option<Self>>> + Send {
        repo.get_notification(id)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct NotificationRow {
    pub(crate) id: String,
    pub(crate) notification_id: Option<String>,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) image_url: Option<String>,
    pub(crate) large_icon_url: Option<String>,
    #[sqlx(rename = "type")]
    pub(crate) kind: String,
    pub(crate) category: Option<String>,
    pub(crate) priority: i64,
    pub(crate) deep_link: Option<String>,
    pub(crate) target_id: Option<String>,
    pub(crate) target_type: Option<String>,
    pub(crate) is_read: i64,
    pub(crate) is_deleted: i64,
    pub(crate) is_synced: i64,
    pub(crate) received_at: i64,
    pub(crate) read_at: Option<i64>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
    pub(crate) extra_data: Option<String>,
}

impl TryFrom<&NotificationRecord> for NotificationRow {
    type Error = Error;
    fn try_from(notification: &NotificationRecord) -> Result<Self> {
        Ok(Self {
            id: notification.id.clone(),
            notification_id: notification.notification_id.clone(),
            user_id: notification.user_id.clone(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            image_url: notification.image_url.clone(),
            large_icon_url: notification.large_icon_url.clone(),
            kind: notification.kind.clone(),
            category: notification.category.clone(),
            priority: i64::from(notification.priority),
            deep_link: notification.deep_link.clone(),
            target_id: notification.target_id.clone(),
            target_type: notification.target_type.clone(),
            is_read: i64::from(notification.is_read),
            is_deleted: i64::from(notification.is_deleted),
            is_synced: i64::from(notification.is_synced),
            received_at: notification.received_at.unix_timestamp(),
            read_at: notification.read_at.map(|at| at.unix_timestamp()),
            created_at: notification.created_at.unix_timestamp(),
            updated_at: notification.updated_at.unix_timestamp(),
            extra_data: notification
                .extra_data
                .as_ref()
                .map(|data| serde_json::to_string(data).or_raise(|| ErrorKind::InvalidData("extra data")))
                .transpose()?,
        })
    }
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = Error;
    fn try_from(row: NotificationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            notification_id: row.notification_id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            image_url: row.image_url,
            large_icon_url: row.large_icon_url,
            kind: row.kind,
            category: row.category,
            priority: i32::try_from(row.priority).or_raise(|| ErrorKind::InvalidData("priority"))?,
            deep_link: row.deep_link,
            target_id: row.target_id,
            target_type: row.target_type,
            is_read: row.is_read != 0,
            is_deleted: row.is_deleted != 0,
            is_synced: row.is_synced != 0,
            received_at: timestamp(row.received_at, "received at")?,
            read_at: row.read_at.map(|at| timestamp(at, "read at")).transpose()?,
            created_at: timestamp(row.created_at, "created at")?,
            updated_at: timestamp(row.updated_at, "updated at")?,
            extra_data: row
                .extra_data
                .as_deref()
                .map(|data| serde_json::from_str(data).or_raise(|| ErrorKind::InvalidData("extra data")))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification() -> NotificationRecord {
        NotificationRecord {
            id: "notif-1".to_string(),
            notification_id: Some("fcm-88f2".to_string()),
            user_id: "user-77".to_string(),
            title: "New tip available".to_string(),
            body: "Check out today's hydration tip".to_string(),
            image_url: None,
            large_icon_url: None,
            kind: "CONTENT".to_string(),
            category: Some("cat-nutrition".to_string()),
            priority: 1,
            deep_link: Some("app://tips/tip-0042".to_string()),
            target_id: Some("tip-0042".to_string()),
            target_type: Some("tip".to_string()),
            is_read: false,
            is_deleted: false,
            is_synced: true,
            received_at: UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            read_at: None,
            created_at: UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            updated_at: UtcDateTime::from_unix_timestamp(1_700_000_100).unwrap(),
            extra_data: Some(json!({"campaign": "daily", "slot": 3})),
        }
    }

    #[test]
    fn test_roundtrip_with_extra_data() {
        let model = notification();
        let row = NotificationRow::try_from(&model).unwrap();
        assert!(row.extra_data.as_deref().unwrap().contains("campaign"));
        let back = NotificationRecord::try_from(row).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_recency_is_updated_at() {
        let mut model = notification();
        let later = UtcDateTime::from_unix_timestamp(1_700_000_500).unwrap();
        model.stamp(later);
        assert_eq!(model.cached_at(), later);
        assert_eq!(model.updated_at, later);
    }

    #[test]
    fn test_malformed_extra_data_is_invalid() {
        let mut row = NotificationRow::try_from(&notification()).unwrap();
        row.extra_data = Some("{not json".to_string());
        let err = NotificationRecord::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("extra data")));
    }
}
