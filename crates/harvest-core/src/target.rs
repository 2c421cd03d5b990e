//! Target identifiers and their resolution from entity URLs.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::TargetError;

/// Matches `/in/<id>` or `/company/<id>` on any host, with or without scheme.
static ENTITY_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:https?:)?(?://)?(?:[\w-]+\.)+[a-z]{2,}/(in|company)/([^/?#\s]+)")
        .expect("valid entity url regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Organization,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Organization => write!(f, "organization"),
        }
    }
}

/// One line item from the target file: an entity URL plus the display label
/// it was listed under, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTarget {
    pub url: String,
    pub label: Option<String>,
}

impl QueuedTarget {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A target resolved to the public identifier the backend understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub raw: String,
    pub public_id: String,
    pub kind: EntityKind,
}

impl Target {
    /// Extracts `(public_id, kind)` from an entity URL.
    ///
    /// The id is percent-decoded, so `/in/j%C3%B6rg` and `/in/jörg` resolve
    /// to the same target.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError`] if `raw` has no `/in/<id>` or `/company/<id>`
    /// path on a recognisable host, or if the id does not decode to UTF-8.
    pub fn resolve(raw: &str) -> Result<Self, TargetError> {
        let trimmed = raw.trim();
        let caps = ENTITY_URL_RE.captures(trimmed).ok_or_else(|| TargetError {
            raw: raw.to_string(),
        })?;

        let public_id = percent_decode_str(&caps[2])
            .decode_utf8()
            .map_err(|_| TargetError {
                raw: raw.to_string(),
            })?
            .into_owned();

        let kind = if caps[1].eq_ignore_ascii_case("company") {
            EntityKind::Organization
        } else {
            EntityKind::User
        };

        Ok(Self {
            raw: trimmed.to_string(),
            public_id,
            kind,
        })
    }
}
