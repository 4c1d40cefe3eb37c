//! SQLite cache database for content records.
//!
//! This crate provides the on-device persistent store backing the content
//! cache. The store is not the source of truth - the remote backend is. If
//! the database is deleted (or destroyed by a schema migration gap), every
//! record in it can be re-fetched, so the store is deliberately expendable.
//!
//! # Architecture
//! One table per [`RecordKind`]:
//! - **Tips**: text content records, the primary cached payload.
//! - **Categories**: the content taxonomy shown while offline.
//! - **Videos**: streamed media metadata (the bytes themselves live in the
//!   media byte cache, not here).
//! - **Notification history**: received notifications; its table layout is
//!   fixed and versioned (see `migrations/0002_notification_history.sql`).
//!
//! Every table carries a recency column that the retention policy orders by.
//! The eviction algorithm itself lives in the cache manager crate; this crate
//! only provides the primitives (`count`, `delete_older_than`,
//! `delete_oldest`, `touch`).

mod db;
pub mod error;
mod kind;
mod models;
mod record;
mod repo;

pub use crate::db::{Database, MigrationFallback};
pub use crate::kind::RecordKind;
pub use crate::models::{CategoryRecord, NotificationRecord, TipRecord, VideoRecord};
pub use crate::record::CacheRecord;
pub use crate::repo::Repository;
