//! Relational store of item detail records.
//!
//! One row per item in `items`, keyed uniquely by page URL, with one-to-many
//! child tables for metadata, screenshots and download links (plus their
//! languages and metadata). Children are cascade-deleted with their parent.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::CrawlResult;
use crate::schema::{DownloadLink, ItemDetail, RemoteFile};
use crate::utils::now_millis;

/// SQL schema for the item database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    page_url TEXT NOT NULL UNIQUE,
    name TEXT,
    year INTEGER,
    platform TEXT,
    score REAL,
    votes INTEGER,
    description TEXT,
    play_online_link TEXT,
    how_to TEXT
);

CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);

CREATE TABLE IF NOT EXISTS item_meta (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES items(id) ON UPDATE CASCADE ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS item_screenshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES items(id) ON UPDATE CASCADE ON DELETE CASCADE,
    platform TEXT NOT NULL,
    url TEXT NOT NULL,
    local TEXT
);

CREATE TABLE IF NOT EXISTS download_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES items(id) ON UPDATE CASCADE ON DELETE CASCADE,
    url TEXT NOT NULL,
    local TEXT,
    year INTEGER,
    platform TEXT,
    info TEXT
);

CREATE TABLE IF NOT EXISTS link_languages (
    link_id INTEGER NOT NULL REFERENCES download_links(id) ON UPDATE CASCADE ON DELETE CASCADE,
    lang TEXT NOT NULL,
    UNIQUE(link_id, lang) ON CONFLICT IGNORE
);

CREATE TABLE IF NOT EXISTS link_meta (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link_id INTEGER NOT NULL REFERENCES download_links(id) ON UPDATE CASCADE ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_item_meta_item ON item_meta(item_id);
CREATE INDEX IF NOT EXISTS idx_item_screenshots_item ON item_screenshots(item_id);
CREATE INDEX IF NOT EXISTS idx_download_links_item ON download_links(item_id);
CREATE INDEX IF NOT EXISTS idx_link_languages_link ON link_languages(link_id);
CREATE INDEX IF NOT EXISTS idx_link_meta_link ON link_meta(link_id);
"#;

/// Named statements of the item repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement {
    UpsertItem,
    SelectItem,
    SelectIdByUrl,
    DeleteItem,
    DeleteMeta,
    DeleteScreenshots,
    DeleteLinks,
    InsertMeta,
    SelectMeta,
    InsertScreenshot,
    SelectScreenshots,
    InsertLink,
    SelectLinks,
    InsertLinkLanguage,
    SelectLinkLanguages,
    InsertLinkMeta,
    SelectLinkMeta,
}

impl Statement {
    const fn sql(self) -> &'static str {
        match self {
            Self::UpsertItem => {
                "INSERT INTO items (created, updated, page_url, name, year, platform, score,
                                    votes, description, play_online_link, how_to)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(page_url) DO UPDATE SET
                     updated = excluded.updated,
                     name = excluded.name,
                     year = excluded.year,
                     platform = excluded.platform,
                     score = excluded.score,
                     votes = excluded.votes,
                     description = excluded.description,
                     play_online_link = excluded.play_online_link,
                     how_to = excluded.how_to
                 RETURNING id"
            }
            Self::SelectItem => "SELECT * FROM items WHERE id = ?",
            Self::SelectIdByUrl => "SELECT id FROM items WHERE page_url = ?",
            Self::DeleteItem => "DELETE FROM items WHERE id = ?",
            Self::DeleteMeta => "DELETE FROM item_meta WHERE item_id = ?",
            Self::DeleteScreenshots => "DELETE FROM item_screenshots WHERE item_id = ?",
            Self::DeleteLinks => "DELETE FROM download_links WHERE item_id = ?",
            Self::InsertMeta => "INSERT INTO item_meta (item_id, key, value) VALUES (?, ?, ?)",
            Self::SelectMeta => "SELECT key, value FROM item_meta WHERE item_id = ? ORDER BY id",
            Self::InsertScreenshot => {
                "INSERT INTO item_screenshots (item_id, platform, url, local) VALUES (?, ?, ?, ?)"
            }
            Self::SelectScreenshots => {
                "SELECT platform, url, local FROM item_screenshots WHERE item_id = ? ORDER BY id"
            }
            Self::InsertLink => {
                "INSERT INTO download_links (item_id, url, local, year, platform, info)
                 VALUES (?, ?, ?, ?, ?, ?)
                 RETURNING id"
            }
            Self::SelectLinks => {
                "SELECT id, url, local, year, platform, info FROM download_links
                 WHERE item_id = ? ORDER BY id"
            }
            Self::InsertLinkLanguage => "INSERT INTO link_languages (link_id, lang) VALUES (?, ?)",
            Self::SelectLinkLanguages => {
                "SELECT lang FROM link_languages WHERE link_id = ? ORDER BY rowid"
            }
            Self::InsertLinkMeta => "INSERT INTO link_meta (link_id, key, value) VALUES (?, ?, ?)",
            Self::SelectLinkMeta => "SELECT key, value FROM link_meta WHERE link_id = ? ORDER BY id",
        }
    }
}

/// Sortable columns of `search`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    Name,
    Year,
    Score,
    Platform,
}

impl OrderColumn {
    const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Year => "year",
            Self::Score => "score",
            Self::Platform => "platform",
        }
    }
}

/// Criteria of `search`; unset fields do not filter
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Substring of the name
    pub name: Option<String>,
    /// Substring of the platform
    pub platform: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order_by: Vec<OrderColumn>,
    pub sort_desc: bool,
}

/// One row of a search result
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub id: i64,
    pub page_url: String,
    pub name: Option<String>,
    pub year: Option<i32>,
    pub platform: Option<String>,
    pub score: Option<f64>,
}

/// Repository of item records
#[derive(Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Open existing database or create a new one at `path`
    pub async fn open(path: &Path) -> CrawlResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::raw_sql(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Store `detail`, replacing any record with the same page URL
    ///
    /// Returns the item id, which stays stable across repeated upserts.
    pub async fn upsert(&self, detail: &ItemDetail) -> CrawlResult<i64> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(Statement::UpsertItem.sql())
            .bind(now_millis())
            .bind(detail.updated)
            .bind(&detail.page_url)
            .bind(&detail.name)
            .bind(detail.year)
            .bind(&detail.platform)
            .bind(detail.score)
            .bind(detail.votes)
            .bind(&detail.description)
            .bind(&detail.play_online_link)
            .bind(&detail.how_to)
            .fetch_one(&mut *tx)
            .await?;

        for statement in [
            Statement::DeleteMeta,
            Statement::DeleteScreenshots,
            Statement::DeleteLinks,
        ] {
            sqlx::query(statement.sql())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        insert_children(&mut tx, id, detail).await?;
        tx.commit().await?;

        debug!("Stored item {id}: {}", detail.page_url);
        Ok(id)
    }

    /// Full record of item `id`
    pub async fn get(&self, id: i64) -> CrawlResult<Option<ItemDetail>> {
        let Some(row) = sqlx::query(Statement::SelectItem.sql())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut detail = ItemDetail {
            page_url: row.try_get("page_url")?,
            updated: row.try_get("updated")?,
            name: row.try_get("name")?,
            year: row.try_get("year")?,
            platform: row.try_get("platform")?,
            score: row.try_get("score")?,
            votes: row.try_get("votes")?,
            description: row.try_get("description")?,
            play_online_link: row.try_get("play_online_link")?,
            how_to: row.try_get("how_to")?,
            ..ItemDetail::default()
        };

        let meta: Vec<(String, String)> = sqlx::query_as(Statement::SelectMeta.sql())
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        detail.meta = meta.into_iter().collect();

        let screenshots: Vec<(String, String, Option<String>)> =
            sqlx::query_as(Statement::SelectScreenshots.sql())
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        for (platform, remote, local) in screenshots {
            detail
                .screenshots
                .entry(platform)
                .or_default()
                .push(RemoteFile { remote, local });
        }

        let links = sqlx::query(Statement::SelectLinks.sql())
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        for row in links {
            detail.download_links.push(self.load_link(&row).await?);
        }

        Ok(Some(detail))
    }

    async fn load_link(&self, row: &SqliteRow) -> CrawlResult<DownloadLink> {
        let link_id: i64 = row.try_get("id")?;

        let languages: Vec<(String,)> = sqlx::query_as(Statement::SelectLinkLanguages.sql())
            .bind(link_id)
            .fetch_all(&self.pool)
            .await?;
        let meta: Vec<(String, String)> = sqlx::query_as(Statement::SelectLinkMeta.sql())
            .bind(link_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(DownloadLink {
            url: RemoteFile {
                remote: row.try_get("url")?,
                local: row.try_get("local")?,
            },
            year: row.try_get("year")?,
            platform: row.try_get("platform")?,
            info: row.try_get("info")?,
            languages: languages.into_iter().map(|(lang,)| lang).collect(),
            meta: meta.into_iter().collect::<BTreeMap<_, _>>(),
        })
    }

    pub async fn find_id_by_url(&self, page_url: &str) -> CrawlResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(Statement::SelectIdByUrl.sql())
            .bind(page_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Delete item `id` and all its children; local files are untouched
    pub async fn remove(&self, id: i64) -> CrawlResult<bool> {
        let removed = sqlx::query(Statement::DeleteItem.sql())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    /// Items matching `filter`, values bound as parameters
    pub async fn search(&self, filter: &ItemFilter) -> CrawlResult<Vec<ItemSummary>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, page_url, name, year, platform, score FROM items WHERE 1 = 1");

        if let Some(name) = filter.name.as_deref() {
            query.push(" AND name LIKE ").push_bind(format!("%{name}%"));
        }
        if let Some(platform) = filter.platform.as_deref() {
            query
                .push(" AND platform LIKE ")
                .push_bind(format!("%{platform}%"));
        }
        if let Some(year) = filter.year {
            query.push(" AND year = ").push_bind(year);
        }

        if !filter.order_by.is_empty() {
            let direction = if filter.sort_desc { "DESC" } else { "ASC" };
            let columns: Vec<String> = filter
                .order_by
                .iter()
                .map(|c| format!("{} {direction}", c.column()))
                .collect();
            query.push(" ORDER BY ").push(columns.join(", "));
        } else {
            query.push(" ORDER BY id");
        }

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
            if let Some(offset) = filter.offset {
                query.push(" OFFSET ").push_bind(i64::from(offset));
            }
        } else if let Some(offset) = filter.offset {
            query.push(" LIMIT -1 OFFSET ").push_bind(i64::from(offset));
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> CrawlResult<ItemSummary> {
                Ok(ItemSummary {
                    id: row.try_get("id")?,
                    page_url: row.try_get("page_url")?,
                    name: row.try_get("name")?,
                    year: row.try_get("year")?,
                    platform: row.try_get("platform")?,
                    score: row.try_get("score")?,
                })
            })
            .collect()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn insert_children(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    detail: &ItemDetail,
) -> CrawlResult<()> {
    for (key, value) in &detail.meta {
        sqlx::query(Statement::InsertMeta.sql())
            .bind(id)
            .bind(key)
            .bind(value)
            .execute(&mut **tx)
            .await?;
    }

    for (platform, files) in &detail.screenshots {
        for file in files {
            sqlx::query(Statement::InsertScreenshot.sql())
                .bind(id)
                .bind(platform)
                .bind(&file.remote)
                .bind(&file.local)
                .execute(&mut **tx)
                .await?;
        }
    }

    for link in &detail.download_links {
        let (link_id,): (i64,) = sqlx::query_as(Statement::InsertLink.sql())
            .bind(id)
            .bind(&link.url.remote)
            .bind(&link.url.local)
            .bind(link.year)
            .bind(&link.platform)
            .bind(&link.info)
            .fetch_one(&mut **tx)
            .await?;

        for lang in &link.languages {
            sqlx::query(Statement::InsertLinkLanguage.sql())
                .bind(link_id)
                .bind(lang)
                .execute(&mut **tx)
                .await?;
        }
        for (key, value) in &link.meta {
            sqlx::query(Statement::InsertLinkMeta.sql())
                .bind(link_id)
                .bind(key)
                .bind(value)
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(())
}
