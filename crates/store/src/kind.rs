//! Record kinds and their table mapping.

/// The cached record kinds.
///
/// Each kind gets its own table and its own retention policy (max count,
/// TTL), but all of them share the same eviction algorithm shape: order by
/// the recency column, delete the oldest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Tip,
    Category,
    Video,
    Notification,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [Self::Tip, Self::Category, Self::Video, Self::Notification];

    /// Name of the table backing this kind.
    pub fn table(self) -> &'static str {
        match self {
            Self::Tip => "tips",
            Self::Category => "categories",
            Self::Video => "videos",
            Self::Notification => "notification_history",
        }
    }

    /// Column carrying the last-cached/last-touched timestamp that TTL expiry
    /// and LRU eviction order by.
    ///
    /// The notification history table has a fixed persisted layout with no
    /// `cached_at` column, so `updated_at` serves as its recency marker.
    pub fn recency_column(self) -> &'static str {
        match self {
            Self::Notification => "updated_at",
            _ => "cached_at",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_distinct() {
        for (i, a) in RecordKind::ALL.iter().enumerate() {
            for b in &RecordKind::ALL[i + 1..] {
                assert_ne!(a.table(), b.table());
            }
        }
    }
}
