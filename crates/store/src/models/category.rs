use crate::error::{Error, ErrorKind, Result};
use crate::kind::RecordKind;
use crate::models::timestamp;
use crate::record::CacheRecord;
use crate::repo::Repository;
use exn::ResultExt;
use std::future::Future;
use time::UtcDateTime;

/// A content category cached so the taxonomy is browsable offline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub tip_count: u32,
    pub order_index: u32,
    pub cached_at: UtcDateTime,
}

impl CacheRecord for CategoryRecord {
    const KIND: RecordKind = RecordKind::Category;

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
        repo.upsert_categories(records)
    }

    fn fetch(repo: &Repository, id: &str) -> impl Future<Output = Result<Option<Self>>> + Send {
        repo.get_category(id)
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) icon: Option<String>,
    pub(crate) color: Option<String>,
    pub(crate) tip_count: i64,
    pub(crate) order_index: i64,
    pub(crate) cached_at: i64,
}

impl From<&CategoryRecord> for CategoryRow {
    fn from(category: &CategoryRecord) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            description: category.description.clone(),
            icon: category.icon.clone(),
            color: category.color.clone(),
            tip_count: i64::from(category.tip_count),
            order_index: i64::from(category.order_index),
            cached_at: category.cached_at.unix_timestamp(),
        }
    }
}

impl TryFrom<CategoryRow> for CategoryRecord {
    type Error = Error;
    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            icon: row.icon,
            color: row.color,
            tip_count: u32::try_from(row.tip_count).or_raise(|| ErrorKind::InvalidData("tip count"))?,
            order_index: u32::try_from(row.order_index).or_raise(|| ErrorKind::InvalidData("order index"))?,
            cached_at: timestamp(row.cached_at, "cached at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let model = CategoryRecord {
            id: "cat-nutrition".to_string(),
            name: "Nutrition".to_string(),
            description: None,
            icon: Some("apple".to_string()),
            color: Some("#7bc043".to_string()),
            tip_count: 12,
            order_index: 3,
            cached_at: UtcDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        };
        let row = CategoryRow::from(&model);
        let back = CategoryRecord::try_from(row).unwrap();
        assert_eq!(back, model);
    }
}
