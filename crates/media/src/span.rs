//! Span bookkeeping for the media byte cache.
//!
//! A span is one contiguous byte range of one media URL, stored as a single
//! file on disk. The [`SpanIndex`] mirrors what is on disk so that LRU
//! accounting never has to touch the filesystem.

use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Derive the on-disk directory key for a media URL.
///
/// Keys are content-free (a truncated hash), so URLs with query strings or
/// unicode never produce hostile path segments.
pub fn url_key(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex()[..16].to_string()
}

/// One cached byte range of one media URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of this range within the remote media.
    pub offset: u64,
    /// Length of the range in bytes.
    pub len: u64,
    /// When this span was last written or read.
    pub last_access: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
struct SpanEntry {
    len: u64,
    last_access: OffsetDateTime,
}

/// In-memory mirror of the spans on disk, keyed by URL key then offset.
///
/// `BTreeMap` keeps iteration order stable, which makes LRU tie-breaking
/// (equal access times) deterministic: lowest key, then lowest offset.
#[derive(Debug, Default)]
pub(crate) struct SpanIndex {
    spans: BTreeMap<String, BTreeMap<u64, SpanEntry>>,
    total_bytes: u64,
}

impl SpanIndex {
    /// Record a span. Returns the length of the span it replaced at the same
    /// offset, if any.
    pub(crate) fn insert(&mut self, key: &str, offset: u64, len: u64, at: OffsetDateTime) -> Option<u64> {
        let replaced = self
            .spans
            .entry(key.to_string())
            .or_default()
            .insert(offset, SpanEntry { len, last_access: at });
        if let Some(old) = replaced {
            self.total_bytes -= old.len;
        }
        self.total_bytes += len;
        replaced.map(|old| old.len)
    }

    /// Forget a span. Returns its length, or `None` if it was not indexed.
    pub(crate) fn remove(&mut self, key: &str, offset: u64) -> Option<u64> {
        let ranges = self.spans.get_mut(key)?;
        let removed = ranges.remove(&offset)?;
        if ranges.is_empty() {
            self.spans.remove(key);
        }
        self.total_bytes -= removed.len;
        Some(removed.len)
    }

    /// Bump a span's access time. Returns `false` if the span is not indexed.
    pub(crate) fn touch(&mut self, key: &str, offset: u64, at: OffsetDateTime) -> bool {
        match self.spans.get_mut(key).and_then(|ranges| ranges.get_mut(&offset)) {
            Some(entry) => {
                entry.last_access = at;
                true
            },
            None => false,
        }
    }

    pub(crate) fn get(&self, key: &str, offset: u64) -> Option<Span> {
        let entry = self.spans.get(key)?.get(&offset)?;
        Some(Span {
            offset,
            len: entry.len,
            last_access: entry.last_access,
        })
    }

    /// The least recently accessed span, as `(key, span)`.
    pub(crate) fn lru(&self) -> Option<(&str, Span)> {
        let mut oldest: Option<(&str, Span)> = None;
        for (key, ranges) in &self.spans {
            for (&offset, entry) in ranges {
                let candidate = Span {
                    offset,
                    len: entry.len,
                    last_access: entry.last_access,
                };
                // Iteration is already ordered by (key, offset), so strictly
                // older wins and equal times keep the first seen.
                match &oldest {
                    Some((_, current)) if candidate.last_access >= current.last_access => {},
                    _ => oldest = Some((key, candidate)),
                }
            }
        }
        oldest
    }

    /// Total cached bytes for one URL key.
    pub(crate) fn key_bytes(&self, key: &str) -> u64 {
        self.spans
            .get(key)
            .map(|ranges| ranges.values().map(|entry| entry.len).sum())
            .unwrap_or(0)
    }

    /// Total cached bytes across every key.
    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Number of spans indexed.
    pub(crate) fn span_count(&self) -> usize {
        self.spans.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds).unwrap()
    }

    #[test]
    fn test_url_key_is_stable_and_path_safe() {
        let key = url_key("https://cdn.example.com/vid.mp4?token=a/b&x=ü");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, url_key("https://cdn.example.com/vid.mp4?token=a/b&x=ü"));
        assert_ne!(key, url_key("https://cdn.example.com/vid.mp4"));
    }

    #[test]
    fn test_insert_and_replace_accounting() {
        let mut index = SpanIndex::default();
        assert_eq!(index.insert("k1", 0, 100, at(1)), None);
        assert_eq!(index.insert("k1", 200, 50, at(2)), None);
        assert_eq!(index.total_bytes(), 150);
        // Replacing the span at offset 0 swaps its bytes, not adds them.
        assert_eq!(index.insert("k1", 0, 80, at(3)), Some(100));
        assert_eq!(index.total_bytes(), 130);
        assert_eq!(index.span_count(), 2);
    }

    #[test]
    fn test_remove_accounting() {
        let mut index = SpanIndex::default();
        index.insert("k1", 0, 100, at(1));
        index.insert("k2", 0, 40, at(1));
        assert_eq!(index.remove("k1", 0), Some(100));
        assert_eq!(index.remove("k1", 0), None);
        assert_eq!(index.total_bytes(), 40);
        assert_eq!(index.key_bytes("k1"), 0);
        assert_eq!(index.key_bytes("k2"), 40);
    }

    #[test]
    fn test_lru_order_and_tie_break() {
        let mut index = SpanIndex::default();
        index.insert("b", 0, 10, at(5));
        index.insert("a", 0, 10, at(5));
        index.insert("c", 0, 10, at(9));
        // Equal access times: lowest key wins the tie.
        let (key, span) = index.lru().unwrap();
        assert_eq!((key, span.offset), ("a", 0));
        index.remove("a", 0);
        let (key, _) = index.lru().unwrap();
        assert_eq!(key, "b");
    }

    #[test]
    fn test_touch_changes_lru() {
        let mut index = SpanIndex::default();
        index.insert("a", 0, 10, at(1));
        index.insert("a", 100, 10, at(2));
        assert!(index.touch("a", 0, at(10)));
        let (_, span) = index.lru().unwrap();
        assert_eq!(span.offset, 100);
        assert!(!index.touch("a", 500, at(11)));
    }
}
