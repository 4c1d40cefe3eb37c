use crate::error::{Error, ErrorKind, Result};
use crate::kind::RecordKind;
use crate::models::timestamp;
use crate::record::CacheRecord;
use crate::repo::Repository;
use exn::ResultExt;
use std::future::Future;
use time::UtcDateTime;

/// A content tip cached for offline/fast access.
///
/// Everything between `id` and `cached_at` is domain payload: the cache
/// policy never looks at it, it only flows through to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipRecord {
    pub id: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub view_count: u32,
    pub like_count: u32,
    pub image_url: Option<String>,
    pub created_at: UtcDateTime,
    pub is_favorite: bool,
    pub is_liked: bool,
    pub recommendation_score: i32,
    /// Timestamp of the last cache write or touch. Never decreases.
    pub cached_at: UtcDateTime,
}

impl CacheRecord for TipRecord {
    const KIND: RecordKind = RecordKind::Tip;

    fn id(&self) -> &str {
        &self.id
    }

    fn cached_at(&self) -> UtcDateTime {
        self.cached_at
    }

    fn stamp(&mut self, cached_at: UtcDateTime) {
        self.cached_at = cached_at;
    }

    fn upsert_all(repo: &Repository, records: &[Self]) -> impl Future<Output = Result<()>> + Send {
        repo.upsert_tips(records)
    }

    fn fetch(repo: &Repository, id: &str) -> impl Future<Output = Result<Option<Self>>> + Send {
        repo.get_tip(id)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct TipRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) excerpt: Option<String>,
    pub(crate) category_id: Option<String>,
    pub(crate) category_name: Option<String>,
    pub(crate) view_count: i64,
    pub(crate) like_count: i64,
    pub(crate) image_url: Option<String>,
    pub(crate) created_at: i64,
    pub(crate) is_favorite: i64,
    pub(crate) is_liked: i64,
    pub(crate) recommendation_score: i64,
    pub(crate) cached_at: i64,
}

impl From<&TipRecord> for TipRow {
    fn from(tip: &TipRecord) -> Self {
        Self {
            id: tip.id.clone(),
            title: tip.title.clone(),
            excerpt: tip.excerpt.clone(),
            category_id: tip.category_id.clone(),
            category_name: tip.category_name.clone(),
            view_count: i64::from(tip.view_count),
            like_count: i64::from(tip.like_count),
            image_url: tip.image_url.clone(),
            created_at: tip.created_at.unix_timestamp(),
            is_favorite: i64::from(tip.is_favorite),
            is_liked: i64::from(tip.is_liked),
            recommendation_score: i64::from(tip.recommendation_score),
            cached_at: tip.cached_at.unix_timestamp(),
        }
    }
}

impl TryFrom<TipRow> for TipRecord {
    type Error = Error;
    fn try_from(row: TipRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            excerpt: row.excerpt,
            category_id: row.category_id,
            category_name: row.category_name,
            view_count: u32::try_from(row.view_count).or_raise(|| ErrorKind::InvalidData("view count"))?,
            like_count: u32::try_from(row.like_count).or_raise(|| ErrorKind::InvalidData("like count"))?,
            image_url: row.image_url,
            created_at: timestamp(row.created_at, "created at")?,
            is_favorite: row.is_favorite != 0,
            is_liked: row.is_liked != 0,
            recommendation_score: i32::try_from(row.recommendation_score)
                .or_raise(|| ErrorKind::InvalidData("recommendation score"))?,
            cached_at: timestamp(row.cached_at, "cached at")?,
        })
    }
}
