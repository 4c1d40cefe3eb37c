//! Configuration for the cache subsystem.
//!
//! Configuration is assembled from three layers, later ones winning:
//! built-in defaults, an optional TOML file, then environment variables
//! prefixed with `TIPSTASH_` (nested keys separated by `__`, e.g.
//! `TIPSTASH_RETENTION__TIPS__MAX_ITEMS=250`).
//!
//! Paths the app does not configure explicitly resolve under the platform's
//! standard application directories.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::OptionExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "TIPSTASH_";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "records.db";
const MEDIA_DIR: &str = "media";

/// Top-level configuration for the cache subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub media: MediaConfig,
    pub pool: PoolConfig,
    pub retention: RetentionConfig,
}

/// Persistent record store settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file. Defaults to the platform data
    /// directory when unset.
    pub path: Option<PathBuf>,
}

/// Media byte cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory media spans are cached under. Defaults to `media/` inside
    /// the platform data directory when unset.
    pub dir: Option<PathBuf>,
    /// Byte budget for cached media.
    pub max_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Background task pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum cache tasks in flight at once.
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Retention policy for one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicyConfig {
    /// Cap on cached records of this kind.
    pub max_items: u64,
    /// Records older than this many seconds are expired.
    pub ttl_secs: u64,
    /// Rough bytes-per-record figure used for cache statistics.
    pub item_size_estimate: u64,
}

impl Default for RetentionPolicyConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            ttl_secs: 7 * 24 * 60 * 60,
            item_size_estimate: 50 * 1024,
        }
    }
}

/// Per-kind retention policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub tips: RetentionPolicyConfig,
    pub categories: RetentionPolicyConfig,
    pub videos: RetentionPolicyConfig,
    pub notifications: RetentionPolicyConfig,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Reads the TOML file in the platform config directory if one exists,
    /// then applies `TIPSTASH_*` environment overrides.
    pub fn load() -> Result<Self> {
        let file = Self::default_config_file();
        Self::load_from(file.as_deref())
    }

    /// Load configuration, reading the given TOML file (if it exists) instead
    /// of the default one. Environment overrides still apply.
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)
            .extract()
            .map_err(|err| exn::Exn::from(ErrorKind::Invalid(err)))?;
        debug!(?file, "configuration loaded");
        Ok(config)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            // Toml::file tolerates a missing file; only a present-but-broken
            // file is an error.
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
    }

    /// Where the config file lives by default, if the platform exposes a
    /// config directory at all.
    pub fn default_config_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tipstash").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolved path of the SQLite store file.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join(STORE_FILE)),
        }
    }

    /// Resolved directory of the media byte cache.
    pub fn media_dir(&self) -> Result<PathBuf> {
        match &self.media.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join(MEDIA_DIR)),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "tipstash")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_raise(|| ErrorKind::NoProjectDirs)
}
