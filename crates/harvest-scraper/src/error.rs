use harvest_core::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response shape for {context}: {reason}")]
    Shape { context: String, reason: String },

    #[error("session rejected (HTTP {status}) for {url}")]
    Unauthorized { status: u16, url: String },

    #[error("rate limited or blocked (HTTP {status}, retry after {retry_after_secs}s)")]
    RateLimited { status: u16, retry_after_secs: u64 },

    #[error("entity not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("browser profile error: {0}")]
    BrowserProfile(String),

    #[error("cookie database error: {0}")]
    CookieDb(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOperation {
    Profile,
    Posts,
}

impl std::fmt::Display for FetchOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOperation::Profile => write!(f, "profile"),
            FetchOperation::Posts => write!(f, "posts"),
        }
    }
}

/// A failed backend call, tagged with what was being fetched.
#[derive(Debug, Error)]
#[error("failed to fetch {operation} for {kind} {public_id}: {source}")]
pub struct FetchFailure {
    pub operation: FetchOperation,
    pub public_id: String,
    pub kind: EntityKind,
    #[source]
    pub source: ScraperError,
}
