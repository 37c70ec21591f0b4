//! Persistent TTL cache backed by SQLite.
//!
//! Fronts every expensive fetch of the crawler (page counts, listings, item
//! details). Each entry stores a JSON payload and an absolute expiry in
//! milliseconds since epoch:
//! - `get` only returns entries whose expiry has not passed
//! - `purge` deletes every expired entry in one statement
//! - writes are single-statement upserts, so readers never see a torn entry
//!
//! Cache failures never reach the caller of `get`/`set`: a broken write is
//! logged and the key simply stays a miss.

pub mod maintenance;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

use crate::error::CrawlResult;
use crate::utils::now_millis;

pub use maintenance::{extend_cache_lifetime, index_cache_keys, purge_caches};

/// SQL schema for a cache database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    key TEXT NOT NULL PRIMARY KEY,
    value TEXT NOT NULL,
    expires_on INTEGER NOT NULL
);

-- Expiry scans for purge and key filters
CREATE INDEX IF NOT EXISTS idx_cache_expires_on ON cache(expires_on);
"#;

/// Named statements of the cache repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement {
    Upsert,
    Get,
    Remove,
    RemoveIfExpired,
    Purge,
    Count,
    AllKeys,
    ValidKeys,
    ExpiredKeys,
    Extend,
}

impl Statement {
    const fn sql(self) -> &'static str {
        match self {
            Self::Upsert => {
                "INSERT INTO cache (key, value, expires_on) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     expires_on = excluded.expires_on"
            }
            Self::Get => "SELECT value, expires_on FROM cache WHERE key = ?",
            Self::Remove => "DELETE FROM cache WHERE key = ?",
            Self::RemoveIfExpired => "DELETE FROM cache WHERE key = ? AND expires_on < ?",
            Self::Purge => "DELETE FROM cache WHERE expires_on < ?",
            Self::Count => "SELECT COUNT(*) FROM cache",
            Self::AllKeys => "SELECT key FROM cache ORDER BY key",
            Self::ValidKeys => "SELECT key FROM cache WHERE expires_on >= ? ORDER BY key",
            Self::ExpiredKeys => "SELECT key FROM cache WHERE expires_on < ? ORDER BY key",
            Self::Extend => "UPDATE cache SET expires_on = ? WHERE expires_on >= ?",
        }
    }
}

/// Options for opening a cache
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// SQLite file holding the entries
    pub path: PathBuf,
    /// Lifetime of an entry after `set`.
    ///
    /// Zero makes every `get` miss while `keys` still lists the entries,
    /// which is what inventory tooling opens caches with.
    pub ttl: Duration,
    /// Delete expired or corrupt entries as soon as a `get` notices them
    pub clean_expired: bool,
}

impl CacheOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            clean_expired: true,
        }
    }

    #[must_use]
    pub fn clean_expired(mut self, clean: bool) -> Self {
        self.clean_expired = clean;
        self
    }
}

/// Which keys `Cache::keys` enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KeyFilter {
    #[default]
    All,
    Valid,
    Expired,
}

/// Result of a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeStats {
    /// Entries present before the purge
    pub existing: u64,
    /// Entries deleted because they had expired
    pub removed: u64,
}

/// Key/value store with per-entry expiry
#[derive(Clone)]
pub struct Cache {
    pool: SqlitePool,
    path: PathBuf,
    ttl_ms: i64,
    clean_expired: bool,
}

impl Cache {
    /// Open existing cache or create a new one at `options.path`
    pub async fn open(options: CacheOptions) -> CrawlResult<Self> {
        if let Some(parent) = options.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let connect = SqliteConnectOptions::new()
            .filename(&options.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(connect)
            .await?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
        debug!("cache opened: {}", options.path.display());

        Ok(Self {
            pool,
            path: options.path,
            ttl_ms: i64::try_from(options.ttl.as_millis()).unwrap_or(i64::MAX),
            clean_expired: options.clean_expired,
        })
    }

    /// Store `value` under `key`, replacing value and expiry of an existing entry
    ///
    /// Never fails: serialization or storage errors are logged and leave the
    /// key as a miss.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                error!("cache.set({key}) serialization failed: {e}");
                self.remove(key).await;
                return;
            }
        };
        let expires_on = now_millis().saturating_add(self.ttl_ms);

        match sqlx::query(Statement::Upsert.sql())
            .bind(key)
            .bind(&json)
            .bind(expires_on)
            .execute(&self.pool)
            .await
        {
            Ok(_) => debug!("cache.set({key})"),
            Err(e) => error!("cache.set({key}) failed: {e}"),
        }
    }

    /// Value stored under `key` if it has not expired
    ///
    /// Expired, missing and malformed entries are all reported as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let row: Option<(String, i64)> = match sqlx::query_as(Statement::Get.sql())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                error!("cache.get({key}) failed: {e}");
                return None;
            }
        };

        let Some((value, expires_on)) = row else {
            debug!("cache.get({key}) N/A");
            return None;
        };

        let now = now_millis();
        if self.ttl_ms == 0 || expires_on < now {
            debug!("cache.get({key}) expired");
            if self.clean_expired {
                self.remove_if_expired(key, now).await;
            }
            return None;
        }

        match serde_json::from_str(&value) {
            Ok(data) => {
                debug!("cache.get({key}) HIT");
                Some(data)
            }
            Err(e) => {
                warn!("cache.get({key}) corrupted payload: {e}");
                if self.clean_expired {
                    self.remove(key).await;
                }
                None
            }
        }
    }

    /// Cache-aside lookup: return the cached value or run `fetch` and store its result
    ///
    /// Errors from `fetch` are returned untouched and nothing is cached.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> CrawlResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CrawlResult<T>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(hit);
        }

        let value = fetch().await?;
        self.set(key, &value).await;
        Ok(value)
    }

    /// Delete `key`; a missing key is not an error
    pub async fn remove(&self, key: &str) {
        match sqlx::query(Statement::Remove.sql())
            .bind(key)
            .execute(&self.pool)
            .await
        {
            Ok(_) => debug!("cache.remove({key})"),
            Err(e) => error!("cache.remove({key}) failed: {e}"),
        }
    }

    /// Delete `key` only if it is still expired, so a concurrent `set` wins
    async fn remove_if_expired(&self, key: &str, now: i64) {
        if let Err(e) = sqlx::query(Statement::RemoveIfExpired.sql())
            .bind(key)
            .bind(now)
            .execute(&self.pool)
            .await
        {
            error!("cache.remove({key}) failed: {e}");
        }
    }

    /// Delete every entry whose expiry is in the past
    pub async fn purge(&self) -> CrawlResult<PurgeStats> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let (existing,): (i64,) = sqlx::query_as(Statement::Count.sql())
            .fetch_one(&mut *tx)
            .await?;
        let removed = sqlx::query(Statement::Purge.sql())
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        let stats = PurgeStats {
            existing: u64::try_from(existing).unwrap_or_default(),
            removed,
        };
        debug!("cache.purge() removed {}/{}", stats.removed, stats.existing);
        Ok(stats)
    }

    /// Keys matching `filter` as of now
    pub async fn keys(&self, filter: KeyFilter) -> CrawlResult<Vec<String>> {
        let rows: Vec<(String,)> = match filter {
            KeyFilter::All => {
                sqlx::query_as(Statement::AllKeys.sql())
                    .fetch_all(&self.pool)
                    .await?
            }
            KeyFilter::Valid => {
                sqlx::query_as(Statement::ValidKeys.sql())
                    .bind(now_millis())
                    .fetch_all(&self.pool)
                    .await?
            }
            KeyFilter::Expired => {
                sqlx::query_as(Statement::ExpiredKeys.sql())
                    .bind(now_millis())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// Give every still-valid entry a fresh `ttl` without refetching it
    ///
    /// Expired entries are deleted instead when `clean_expired` is set.
    /// Returns the number of entries whose lifetime was extended.
    pub async fn extend_lifetime(&self) -> CrawlResult<u64> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        let extended = sqlx::query(Statement::Extend.sql())
            .bind(now.saturating_add(self.ttl_ms))
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if self.clean_expired {
            sqlx::query(Statement::Purge.sql())
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("cache.extend_lifetime() extended {extended} entries");
        Ok(extended)
    }

    /// Total number of stored entries, valid or not
    pub async fn len(&self) -> CrawlResult<u64> {
        let (count,): (i64,) = sqlx::query_as(Statement::Count.sql())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub async fn is_empty(&self) -> CrawlResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Location of the backing database
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.ttl_ms).unwrap_or_default())
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) async fn write_raw(&self, key: &str, value: &str, expires_on: i64) {
        sqlx::query(Statement::Upsert.sql())
            .bind(key)
            .bind(value)
            .bind(expires_on)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}
