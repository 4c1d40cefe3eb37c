//! Byte-range LRU cache for streamed media.

use crate::error::{ErrorKind, Result};
use crate::span::{Span, SpanIndex, url_key};
use exn::OptionExt;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Default cache budget: 500 MiB of media bytes.
pub const DEFAULT_MAX_BYTES: u64 = 500 * 1024 * 1024;

const SPAN_EXTENSION: &str = "span";

/// A point-in-time snapshot of the media cache's occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStats {
    /// Spans currently cached.
    pub spans: usize,
    /// Bytes currently cached across all spans.
    pub total_bytes: u64,
    /// The budget `total_bytes` is kept under.
    pub max_bytes: u64,
}

/// Disk cache of media byte ranges ("spans"), evicting least recently used
/// spans once the total exceeds its byte budget.
///
/// Layout on disk: one directory per media URL (named by [`url_key`]), one
/// file per span, named `<offset>-<len>.span`. The index of what exists is
/// kept in memory and rebuilt by scanning the directory on open, so the
/// cache survives restarts; file mtimes seed the recency order after a scan.
///
/// All mutation goes through one internal lock. [`release`](Self::release)
/// takes the index away; operations after release fail with
/// [`ErrorKind::Released`] instead of touching files some other instance may
/// now own.
#[derive(Debug)]
pub struct MediaCache {
    root: PathBuf,
    max_bytes: u64,
    index: Mutex<Option<SpanIndex>>,
}

impl MediaCache {
    /// Open (or create) a media cache rooted at `root` with the given byte
    /// budget, rebuilding the span index from whatever is already on disk.
    pub async fn open(root: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(ErrorKind::Io)?;
        let index = Self::scan(&root).await?;
        debug!(
            root = %root.display(),
            spans = index.span_count(),
            bytes = index.total_bytes(),
            "media cache opened"
        );
        Ok(Self {
            root,
            max_bytes,
            index: Mutex::new(Some(index)),
        })
    }

    /// The root directory spans are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache one byte range of a media URL.
    ///
    /// A span already cached at the same offset is replaced. If the write
    /// pushes the cache over its budget, least recently used spans are
    /// evicted first (never the span being written). A single span larger
    /// than the whole budget is refused outright.
    pub async fn write_span(&self, url: &str, offset: u64, data: &[u8]) -> Result<()> {
        let len = data.len() as u64;
        if len > self.max_bytes {
            exn::bail!(ErrorKind::SpanTooLarge(len));
        }
        let key = url_key(url);
        let mut guard = self.index.lock().await;
        let index = guard.as_mut().ok_or_raise(|| ErrorKind::Released)?;

        if let Some(existing) = index.get(&key, offset) {
            Self::remove_span_file(&self.root, &key, &existing).await?;
            index.remove(&key, offset);
        }
        while index.total_bytes() + len > self.max_bytes {
            let Some((victim_key, victim)) = index.lru().map(|(k, span)| (k.to_string(), span)) else {
                break;
            };
            Self::remove_span_file(&self.root, &victim_key, &victim).await?;
            index.remove(&victim_key, victim.offset);
            debug!(key = %victim_key, offset = victim.offset, len = victim.len, "evicted media span");
        }

        let dir = self.root.join(&key);
        fs::create_dir_all(&dir).await.map_err(ErrorKind::Io)?;
        fs::write(Self::span_path(&self.root, &key, offset, len), data)
            .await
            .map_err(ErrorKind::Io)?;
        index.insert(&key, offset, len, OffsetDateTime::now_utc());
        Ok(())
    }

    /// Read a cached byte range, bumping its recency.
    ///
    /// Resolves to `None` when the range is not cached. A span the index
    /// knows about but whose file has gone missing is dropped from the index
    /// and reads as a miss.
    pub async fn read_span(&self, url: &str, offset: u64) -> Result<Option<Vec<u8>>> {
        let key = url_key(url);
        let mut guard = self.index.lock().await;
        let index = guard.as_mut().ok_or_raise(|| ErrorKind::Released)?;
        let Some(span) = index.get(&key, offset) else {
            return Ok(None);
        };
        match fs::read(Self::span_path(&self.root, &key, offset, span.len)).await {
            Ok(data) => {
                index.touch(&key, offset, OffsetDateTime::now_utc());
                Ok(Some(data))
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(%key, offset, "indexed media span missing on disk");
                index.remove(&key, offset);
                Ok(None)
            },
            Err(err) => Err(exn::Exn::from(ErrorKind::Io(err))),
        }
    }

    /// Whether any bytes of this URL are cached. Reads as `false` once the
    /// cache is released.
    pub async fn is_cached(&self, url: &str) -> bool {
        let key = url_key(url);
        let guard = self.index.lock().await;
        guard.as_ref().map(|index| index.key_bytes(&key) > 0).unwrap_or(false)
    }

    /// Total cached bytes for one URL.
    pub async fn cached_bytes(&self, url: &str) -> Result<u64> {
        let key = url_key(url);
        let guard = self.index.lock().await;
        let index = guard.as_ref().ok_or_raise(|| ErrorKind::Released)?;
        Ok(index.key_bytes(&key))
    }

    /// Snapshot the cache's occupancy.
    pub async fn stats(&self) -> Result<MediaStats> {
        let guard = self.index.lock().await;
        let index = guard.as_ref().ok_or_raise(|| ErrorKind::Released)?;
        Ok(MediaStats {
            spans: index.span_count(),
            total_bytes: index.total_bytes(),
            max_bytes: self.max_bytes,
        })
    }

    /// Delete every cached span and start over with an empty index.
    pub async fn clear(&self) -> Result<()> {
        let mut guard = self.index.lock().await;
        guard.take().ok_or_raise(|| ErrorKind::Released)?;
        fs::remove_dir_all(&self.root).await.map_err(ErrorKind::Io)?;
        fs::create_dir_all(&self.root).await.map_err(ErrorKind::Io)?;
        *guard = Some(SpanIndex::default());
        Ok(())
    }

    /// Release the cache, leaving the files on disk for the next instance.
    ///
    /// Every subsequent operation fails with [`ErrorKind::Released`].
    pub async fn release(&self) {
        let mut guard = self.index.lock().await;
        if guard.take().is_some() {
            debug!(root = %self.root.display(), "media cache released");
        }
    }

    fn span_path(root: &Path, key: &str, offset: u64, len: u64) -> PathBuf {
        root.join(key).join(format!("{offset}-{len}.{SPAN_EXTENSION}"))
    }

    async fn remove_span_file(root: &Path, key: &str, span: &Span) -> Result<()> {
        match fs::remove_file(Self::span_path(root, key, span.offset, span.len)).await {
            Ok(()) => Ok(()),
            // Already gone is the outcome we wanted.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(exn::Exn::from(ErrorKind::Io(err))),
        }
    }

    /// Rebuild the span index from the directory tree. Files that are not
    /// span files are left alone and simply not indexed.
    async fn scan(root: &Path) -> Result<SpanIndex> {
        let mut index = SpanIndex::default();
        let mut dirs = fs::read_dir(root).await.map_err(ErrorKind::Io)?;
        while let Some(dir) = dirs.next_entry().await.map_err(ErrorKind::Io)? {
            if !dir.file_type().await.map_err(ErrorKind::Io)?.is_dir() {
                continue;
            }
            let Some(key) = dir.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let mut files = fs::read_dir(dir.path()).await.map_err(ErrorKind::Io)?;
            while let Some(file) = files.next_entry().await.map_err(ErrorKind::Io)? {
                let path = file.path();
                let Some(offset) = Self::parse_span_file_name(&path) else {
                    warn!(path = %path.display(), "ignoring unrecognized file in media cache");
                    continue;
                };
                let metadata = file.metadata().await.map_err(ErrorKind::Io)?;
                // mtime is approximate recency, good enough to seed LRU order.
                let last_access = metadata.modified().map_err(ErrorKind::Io)?.into();
                index.insert(&key, offset, metadata.len(), last_access);
            }
        }
        Ok(index)
    }

    /// Parse `<offset>-<len>.span`, returning the offset. The length in the
    /// name is only validated; the file's actual size is authoritative.
    fn parse_span_file_name(path: &Path) -> Option<u64> {
        if path.extension()?.to_str()? != SPAN_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let (offset, len) = stem.split_once('-')?;
        len.parse::<u64>().ok()?;
        offset.parse().ok()
    }
}
