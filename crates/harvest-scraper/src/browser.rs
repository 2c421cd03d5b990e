//! Session cookies from the local Firefox profile.
//!
//! Firefox keeps `cookies.sqlite` locked (and usually in WAL mode) while it
//! runs, so the database and its `-wal` file are copied into a scratch
//! directory before being opened.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use harvest_store::{CookieRecord, CookieSource};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

use crate::error::ScraperError;

const COOKIE_DB: &str = "cookies.sqlite";

const COOKIE_QUERY: &str = "SELECT name, value, host, path FROM moz_cookies \
     WHERE host = ?1 OR host LIKE ?2 ORDER BY host, name";

#[derive(Debug, Clone)]
pub struct FirefoxCookieSource {
    domain: String,
    profiles_root: Option<PathBuf>,
}

impl FirefoxCookieSource {
    /// Reads cookies for `domain` and its subdomains from the default
    /// profile directory of the current platform.
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            profiles_root: None,
        }
    }

    /// Overrides where Firefox profiles are searched for.
    #[must_use]
    pub fn with_profiles_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.profiles_root = Some(root.into());
        self
    }

    fn profiles_root(&self) -> Result<PathBuf, ScraperError> {
        if let Some(root) = &self.profiles_root {
            return Ok(root.clone());
        }
        default_profiles_root().ok_or_else(|| {
            ScraperError::BrowserProfile("cannot determine Firefox profile directory".to_owned())
        })
    }

    async fn read(&self) -> Result<Vec<CookieRecord>, ScraperError> {
        let root = self.profiles_root()?;
        let db = newest_cookie_db(&root)?;
        tracing::debug!(path = %db.display(), "reading Firefox cookie database");

        let scratch = tempfile::tempdir()?;
        let copy = scratch.path().join(COOKIE_DB);
        tokio::fs::copy(&db, &copy).await?;
        let wal = db.with_file_name(format!("{COOKIE_DB}-wal"));
        if wal.exists() {
            tokio::fs::copy(&wal, scratch.path().join(format!("{COOKIE_DB}-wal"))).await?;
        }

        let options = SqliteConnectOptions::new().filename(&copy);
        let mut conn = SqliteConnection::connect_with(&options).await?;
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(COOKIE_QUERY)
            .bind(&self.domain)
            .bind(format!("%.{}", self.domain))
            .fetch_all(&mut conn)
            .await?;
        conn.close().await?;

        Ok(rows
            .into_iter()
            .map(|(name, value, domain, path)| CookieRecord {
                name,
                value,
                domain,
                path,
            })
            .collect())
    }
}

#[async_trait]
impl CookieSource for FirefoxCookieSource {
    async fn read_cookies(
        &self,
    ) -> Result<Vec<CookieRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let cookies = self.read().await?;
        tracing::info!(domain = %self.domain, cookies = cookies.len(), "read Firefox cookies");
        Ok(cookies)
    }
}

fn default_profiles_root() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("Firefox").join("Profiles"))
    } else if cfg!(target_os = "windows") {
        dirs::data_dir().map(|d| d.join("Mozilla").join("Firefox").join("Profiles"))
    } else {
        dirs::home_dir().map(|d| d.join(".mozilla").join("firefox"))
    }
}

/// The most recently modified `<profile>/cookies.sqlite` under `root`.
fn newest_cookie_db(root: &Path) -> Result<PathBuf, ScraperError> {
    let entries = std::fs::read_dir(root).map_err(|e| {
        ScraperError::BrowserProfile(format!("cannot read {}: {e}", root.display()))
    })?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let candidate = entry.path().join(COOKIE_DB);
        let Ok(modified) = candidate.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(seen, _)| modified > *seen) {
            newest = Some((modified, candidate));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| {
        ScraperError::BrowserProfile(format!("no {COOKIE_DB} found under {}", root.display()))
    })
}
