//! Named cookie sets and their durable store.
//!
//! The credential file is a JSON object mapping set name to an ordered list
//! of `{name, value, domain, path}` cookie records. Live validation and
//! browser import are delegated to the [`CredentialProbe`] and
//! [`CookieSource`] capabilities so the store itself stays I/O-local.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::json_file;
use crate::StoreError;

/// Set name reserved for material imported from the local browser.
pub const BROWSER_SET_NAME: &str = "firefox";

/// Session cookie carrying the CSRF token the backend expects echoed back.
const CSRF_COOKIE: &str = "JSESSIONID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

pub type CredentialSet = Vec<CookieRecord>;

/// A credential set materialised into the form the HTTP backend sends.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub set_name: String,
    cookies: Vec<CookieRecord>,
}

impl Credential {
    #[must_use]
    pub fn new(set_name: impl Into<String>, cookies: Vec<CookieRecord>) -> Self {
        Self {
            set_name: set_name.into(),
            cookies,
        }
    }

    /// `Cookie` header value: `name=value` pairs joined by `; `.
    #[must_use]
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The CSRF token (session cookie value with surrounding quotes removed).
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.cookies
            .iter()
            .find(|c| c.name == CSRF_COOKIE)
            .map(|c| c.value.trim_matches('"').to_string())
    }

    #[must_use]
    pub fn cookie_count(&self) -> usize {
        self.cookies.len()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("set_name", &self.set_name)
            .field("cookies", &format!("[{} redacted]", self.cookies.len()))
            .finish()
    }
}

/// Result of one live authentication probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    /// The backend redirected to its login page.
    Expired,
    /// Any other status or a transport failure.
    Invalid(String),
}

impl ProbeOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, ProbeOutcome::Valid)
    }
}

#[async_trait]
pub trait CredentialProbe: Send + Sync {
    async fn probe(&self, credential: &Credential) -> ProbeOutcome;
}

/// A provider of raw session cookies, e.g. a browser cookie jar.
#[async_trait]
pub trait CookieSource: Send + Sync {
    async fn read_cookies(
        &self,
    ) -> Result<Vec<CookieRecord>, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    sets: BTreeMap<String, CredentialSet>,
}

impl CredentialStore {
    /// Opens the store and loads the credential file at `path`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sets = Self::read(&path);
        Self { path, sets }
    }

    /// Reloads the credential file from disk and returns the sets.
    ///
    /// A missing or malformed file yields an empty mapping.
    pub fn load(&mut self) -> &BTreeMap<String, CredentialSet> {
        self.sets = Self::read(&self.path);
        &self.sets
    }

    fn read(path: &Path) -> BTreeMap<String, CredentialSet> {
        json_file::load_or_default(path, "credentials")
    }

    /// Writes every set atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be staged or renamed; the
    /// previous file is left intact.
    pub fn save(&self) -> Result<(), StoreError> {
        json_file::write_atomic(&self.path, &self.sets)?;
        tracing::info!(path = %self.path.display(), sets = self.sets.len(), "saved credentials");
        Ok(())
    }

    /// Inserts or replaces one named set and persists immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the save fails; the in-memory set is kept.
    pub fn add(&mut self, name: &str, set: CredentialSet) -> Result<(), StoreError> {
        self.sets.insert(name.to_string(), set);
        self.save()?;
        tracing::info!(set = name, "credential set added or updated");
        Ok(())
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CredentialSet> {
        self.sets.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Materialises a named set, or `None` if it is unknown or empty.
    #[must_use]
    pub fn build_usable_credential(&self, name: &str) -> Option<Credential> {
        match self.sets.get(name) {
            Some(set) if !set.is_empty() => Some(Credential::new(name, set.clone())),
            Some(_) => {
                tracing::warn!(set = name, "credential set is empty");
                None
            }
            None => {
                tracing::warn!(set = name, "credential set not found");
                None
            }
        }
    }

    /// Probes the backend with the named set. Only a `Valid` outcome counts.
    pub async fn validate(&self, name: &str, probe: &dyn CredentialProbe) -> bool {
        let Some(credential) = self.build_usable_credential(name) else {
            return false;
        };
        match probe.probe(&credential).await {
            ProbeOutcome::Valid => {
                tracing::info!(set = name, "credentials are valid");
                true
            }
            ProbeOutcome::Expired => {
                tracing::warn!(
                    set = name,
                    "credentials are invalid or expired (redirected to login)"
                );
                false
            }
            ProbeOutcome::Invalid(reason) => {
                tracing::warn!(set = name, reason = %reason, "credentials could not be validated");
                false
            }
        }
    }

    /// Imports session cookies from `source` under [`BROWSER_SET_NAME`].
    ///
    /// Returns `false` if the source fails, yields no cookies, or the save
    /// fails. Never errors.
    pub async fn import_from_browser(&mut self, source: &dyn CookieSource) -> bool {
        let cookies = match source.read_cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::error!(error = %e, "failed to read browser cookies");
                return false;
            }
        };

        if cookies.is_empty() {
            tracing::warn!("no session cookies found in browser cookie jar");
            return false;
        }

        let count = cookies.len();
        if let Err(e) = self.add(BROWSER_SET_NAME, cookies) {
            tracing::error!(error = %e, "failed to save imported browser cookies");
            return false;
        }
        tracing::info!(cookies = count, "imported session cookies from browser");
        true
    }
}
