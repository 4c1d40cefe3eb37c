//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::migrate::MigrateError;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::{instrument, warn};

use crate::error::{ErrorKind, Result};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
// We want to make use of that async-goodness, so... 5-ish?
const MAX_CONNECTIONS: u32 = 5;

/// What to do when the on-disk migration history cannot be reconciled with
/// the migrations embedded in this build (a recorded version the code does
/// not know about, or a checksum that no longer matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationFallback {
    /// Delete the store and rebuild it empty at the current version.
    ///
    /// Cached records are re-derivable from the backend, so schema
    /// correctness is prioritized over retention of stale data. This is the
    /// designed recovery path, not a failure mode.
    RecreateOnMigrationGap,
    /// Surface the gap as a migration error instead.
    Fail,
}

/// Database connection pool for the cache store.
///
/// This is the main entry point for interacting with the store. It manages
/// the SQLite connection pool and provides access to the repository.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn open(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // This is IMPORTANT to apply the query-based PRAGMAs to EVERY
            // connection (set by max connections) instead of only the
            // first connection returned by the pool.
            .after_connect(|conn, meta| Box::pin(async move {
                Self::apply_pragmas(conn, meta).await
            }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self { pool })
    }

    /// Connect to the store at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations,
    /// falling back to [`MigrationFallback::RecreateOnMigrationGap`].
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with(path, MigrationFallback::RecreateOnMigrationGap).await
    }

    /// Connect to the store with an explicit migration-gap policy.
    pub async fn connect_with(path: impl AsRef<Path>, fallback: MigrationFallback) -> Result<Self> {
        let path = path.as_ref();
        let options = Self::base_options().filename(path).create_if_missing(true);
        let db = Self::open(options.clone(), None).await?;
        match db.migrate().await {
            Ok(()) => Ok(db),
            Err(err)
                if fallback == MigrationFallback::RecreateOnMigrationGap
                    && Self::is_migration_gap(&err) =>
            {
                warn!(path = %path.display(), %err, "no migration path, recreating store");
                db.pool.close().await;
                Self::remove_store_files(path)?;
                let db = Self::open(options, None).await?;
                db.migrate().await.or_raise(|| ErrorKind::Migration)?;
                Ok(db)
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Migration),
        }
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // In-memory database must either use the same cache `.shared_cache(true)`,
        // or be limited to one connection. Otherwise parallel connections will
        // see different databases that contain different data.
        let db = Self::open(options, Some(1)).await?;
        // A fresh in-memory database has no migration history, so a gap is
        // impossible and there is no fallback to apply.
        db.migrate().await.or_raise(|| ErrorKind::Migration)?;
        Ok(db)
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Enable WAL mode for better concurrent read performance
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            // PRAGMA synchronous = NORMAL (balance between safety and speed)
            .synchronous(SqliteSynchronous::Normal)
            // PRAGMA busy_timeout = 1500ms
            // A burst of background cache writes could result in SQLITE_BUSY
            // on too small timeouts with only one writer in WAL-mode, even if
            // most of the waiting is I/O-bound.
            .busy_timeout(std::time::Duration::from_millis(1500))
            // PRAGMA auto_vacuum = OFF (default, but explicit)
            // Make more efficient use of already used space, instead of
            // trying to optimize for size.
            .auto_vacuum(sqlx::sqlite::SqliteAutoVacuum::None)
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA locking_mode = NORMAL;
                PRAGMA wal_autocheckpoint = 800;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
                PRAGMA mmap_size = 33554432;
                PRAGMA analysis_limit = 1000;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument("performing database migrations", skip(self))]
    async fn migrate(&self) -> std::result::Result<(), MigrateError> {
        MIGRATOR.run(&self.pool).await
    }

    /// A "gap" is a migration history this build cannot reconcile: the
    /// database was written by a build with migrations this one doesn't have
    /// (`VersionMissing`), or a known migration's content changed
    /// (`VersionMismatch`). Everything else (I/O, locking) is a plain error.
    fn is_migration_gap(err: &MigrateError) -> bool {
        matches!(err, MigrateError::VersionMissing(_) | MigrateError::VersionMismatch(_))
    }

    /// Delete the database file along with its WAL sidecars.
    fn remove_store_files(path: &Path) -> Result<()> {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.as_os_str().to_os_string();
            file.push(suffix);
            match std::fs::remove_file(Path::new(&file)) {
                Ok(()) => {},
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
                Err(err) => return Err(exn::Exn::from(ErrorKind::Io(err))),
            }
        }
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This is useful for running custom queries or transactions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance should not
    /// be used.
    pub async fn close(&self) {
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
