use async_trait::async_trait;
use harvest_core::EntityKind;
use harvest_store::Credential;
use serde_json::Value;

use crate::ScraperError;

/// The remote record source: one profile call and one posts call, each
/// dispatched on the entity kind.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    async fn fetch_profile(
        &self,
        credential: &Credential,
        public_id: &str,
        kind: EntityKind,
    ) -> Result<Value, ScraperError>;

    async fn fetch_posts(
        &self,
        credential: &Credential,
        public_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<Value>, ScraperError>;
}
