use crate::error::{Error, ErrorKind, Result};
use crate::kind::RecordKind;
use crate::models::timestamp;
use crate::record::CacheRecord;
use crate::repo::Repository;
use exn::ResultExt;
use std::future::Future;
use time::UtcDateTime;

/// Streamed media metadata. The media bytes themselves live in the media
/// byte cache; this record only carries what the feed and player UI need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub caption: Option<String>,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub uploader_id: Option<String>,
    pub uploader_name: Option<String>,
    pub uploader_avatar: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub upload_date: UtcDateTime,
    /// Duration in seconds.
    pub duration: u64,
    pub is_liked: bool,
    pub cached_at: UtcDateTime,
}

impl CacheRecord for VideoRecord {
    const KIND: RecordKind = RecordKind::Video;

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
        repo.upsert_videos(records)
    }

    fn fetch(repo: &Repository, id: &str) -> impl Future<Output = Result<Option<Self>>> + Send {
        repo.get_video(id)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct VideoRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) caption: Option<String>,
    pub(crate) video_url: String,
    pub(crate) thumbnail_url: Option<String>,
    pub(crate) uploader_id: Option<String>,
    pub(crate) uploader_name: Option<String>,
    pub(crate) uploader_avatar: Option<String>,
    pub(crate) view_count: i64,
    pub(crate) like_count: i64,
    pub(crate) comment_count: i64,
    pub(crate) share_count: i64,
    pub(crate) upload_date: i64,
    pub(crate) duration: i64,
    pub(crate) is_liked: i64,
    pub(crate) cached_at: i64,
}

impl TryFrom<&VideoRecord> for VideoRow {
    type Error = Error;
    fn try_from(video: &VideoRecord) -> Result<Self> {
        Ok(Self {
            id: video.id.clone(),
            title: video.title.clone(),
            caption: video.caption.clone(),
            video_url: video.video_url.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            uploader_id: video.uploader_id.clone(),
            uploader_name: video.uploader_name.clone(),
            uploader_avatar: video.uploader_avatar.clone(),
            view_count: i64::try_from(video.view_count).or_raise(|| ErrorKind::InvalidData("view count"))?,
            like_count: i64::try_from(video.like_count).or_raise(|| ErrorKind::InvalidData("like count"))?,
            comment_count: i64::try_from(video.comment_count)
                .or_raise(|| ErrorKind::InvalidData("comment count"))?,
            share_count: i64::try_from(video.share_count).or_raise(|| ErrorKind::InvalidData("share count"))?,
            upload_date: video.upload_date.unix_timestamp(),
            duration: i64::try_from(video.duration).or_raise(|| ErrorKind::InvalidData("duration"))?,
            is_liked: i64::from(video.is_liked),
            cached_at: video.cached_at.unix_timestamp(),
        })
    }
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = Error;
    fn try_from(row: VideoRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            title: row.title,
            caption: row.caption,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            uploader_id: row.uploader_id,
            uploader_name: row.uploader_name,
            uploader_avatar: row.uploader_avatar,
            view_count: u64::try_from(row.view_count).or_raise(|| ErrorKind::InvalidData("view count"))?,
            like_count: u64::try_from(row.like_count).or_raise(|| ErrorKind::InvalidData("like count"))?,
            comment_count: u64::try_from(row.comment_count)
                .or_raise(|| ErrorKind::InvalidData("comment count"))?,
            share_count: u64::try_from(row.share_count).or_raise(|| ErrorKind::InvalidData("share count"))?,
            upload_date: timestamp(row.upload_date, "upload date")?,
            duration: u64::try_from(row.duration).or_raise(|| ErrorKind::InvalidData("duration"))?,
            is_liked: row.is_liked != 0,
            cached_at: timestamp(row.cached_at, "cached at")?,
        })
    }
}
