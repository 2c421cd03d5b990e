//! Incremental store of fetched profiles and posts.
//!
//! Two independent JSON files back the store: profiles keyed by public id
//! (`{data, last_scraped}`) and post collections keyed by public id. Profile
//! membership is the dedup gate: an id in the profile map was fully fetched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json_file;
use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub data: Value,
    /// Capture time as an RFC 3339 timestamp.
    #[serde(default)]
    pub last_scraped: String,
}

#[derive(Debug)]
pub struct ResultStore {
    profile_path: PathBuf,
    post_path: PathBuf,
    profiles: BTreeMap<String, ProfileEntry>,
    posts: BTreeMap<String, Value>,
}

impl ResultStore {
    /// Opens the store, loading whatever is already on disk at both paths.
    ///
    /// Missing or corrupt files start as empty maps.
    #[must_use]
    pub fn open(profile_path: impl Into<PathBuf>, post_path: impl Into<PathBuf>) -> Self {
        let profile_path = profile_path.into();
        let post_path = post_path.into();
        let profiles = Self::load_existing(&profile_path, "profiles");
        let posts = Self::load_existing(&post_path, "posts");
        Self {
            profile_path,
            post_path,
            profiles,
            posts,
        }
    }

    /// Tolerant JSON-or-empty load of one store file.
    #[must_use]
    pub fn load_existing<T: DeserializeOwned>(path: &Path, what: &str) -> BTreeMap<String, T> {
        json_file::load_or_default(path, what)
    }

    #[must_use]
    pub fn contains(&self, public_id: &str) -> bool {
        self.profiles.contains_key(public_id)
    }

    /// Stores a profile stamped with the current time, replacing any
    /// previous entry.
    pub fn upsert_profile(&mut self, public_id: &str, data: Value) {
        let last_scraped = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.profiles
            .insert(public_id.to_string(), ProfileEntry { data, last_scraped });
    }

    pub fn upsert_posts(&mut self, public_id: &str, posts: Vec<Value>) {
        self.posts.insert(public_id.to_string(), Value::Array(posts));
    }

    #[must_use]
    pub fn profile(&self, public_id: &str) -> Option<&ProfileEntry> {
        self.profiles.get(public_id)
    }

    #[must_use]
    pub fn posts(&self, public_id: &str) -> Option<&Value> {
        self.posts.get(public_id)
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn count(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn posts_count(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    #[must_use]
    pub fn post_path(&self) -> &Path {
        &self.post_path
    }

    /// Writes both maps atomically.
    ///
    /// An empty map is never written, so an empty in-memory map cannot
    /// erase a previously persisted file. Both files are attempted even if
    /// the first write fails.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] encountered; the file it concerns
    /// keeps its previous contents.
    pub fn persist(&self) -> Result<(), StoreError> {
        let profiles = Self::persist_map(&self.profile_path, &self.profiles, "profiles");
        let posts = Self::persist_map(&self.post_path, &self.posts, "posts");
        profiles.and(posts)
    }

    fn persist_map<T: Serialize>(
        path: &Path,
        map: &BTreeMap<String, T>,
        what: &str,
    ) -> Result<(), StoreError> {
        if map.is_empty() {
            tracing::warn!(
                path = %path.display(),
                "no {what} data to save; leaving file untouched"
            );
            return Ok(());
        }

        match json_file::write_atomic(path, map) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), entries = map.len(), "saved {what}");
                Ok(())
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to save {what}");
                Err(e)
            }
        }
    }

    /// Logs counts and on-disk sizes for both store files.
    pub fn log_current_state(&self) {
        let size_of = |path: &Path| std::fs::metadata(path).map_or(0, |m| m.len());
        tracing::info!(
            profiles = self.count(),
            profiles_with_posts = self.posts_count(),
            profile_file_bytes = size_of(&self.profile_path),
            post_file_bytes = size_of(&self.post_path),
            "result store state"
        );
    }
}
