//! Byte-range disk cache for streamed media.
//!
//! Streamed video is fetched in byte ranges, and the player re-requests the
//! same ranges constantly (seeks, replays, feed scroll-back). This crate
//! caches those ranges on disk as "spans" so playback stops re-downloading
//! bytes it already has, keeping the total under a configurable budget by
//! evicting the least recently used spans.
//!
//! The media cache is fully independent of the record store: clearing one
//! never touches the other.

mod cache;
pub mod error;
mod span;

pub use crate::cache::{DEFAULT_MAX_BYTES, MediaCache, MediaStats};
pub use crate::span::{Span, url_key};
