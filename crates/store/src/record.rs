//! The seam between the generic retention machinery and the typed tables.

use crate::error::Result;
use crate::kind::RecordKind;
use crate::repo::Repository;
use std::future::Future;
use time::UtcDateTime;

/// A record type that can be cached in the persistent store.
///
/// Implemented by each record model so that one cache-manager implementation
/// can serve every kind without knowing the payload shape. The store methods
/// are expressed as explicit `impl Future + Send` so the futures can cross
/// into spawned background tasks.
pub trait CacheRecord: Sized + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Stable identifier, unique within the kind and shared with the backend.
    ///
    /// A blank id marks the record invalid; the cache manager drops such
    /// records silently instead of writing them.
    fn id(&self) -> &str;

    /// Recency marker: timestamp of the last cache write or touch.
    fn cached_at(&self) -> UtcDateTime;

    /// Stamp the recency marker. Called on every cache write; must never
    /// move the marker backwards in normal operation.
    fn stamp(&mut self, cached_at: UtcDateTime);

    /// Insert-or-replace the whole batch in one transaction.
    fn upsert_all(repo: &Repository, records: &[Self]) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a single record by id.
    fn fetch(repo: &Repository, id: &str) -> impl Future<Output = Result<Option<Self>>> + Send;
}
