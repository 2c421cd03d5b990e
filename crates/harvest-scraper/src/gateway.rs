//! Typed fetch operations over a [`ProfileBackend`].
//!
//! Every backend error comes back as a [`FetchFailure`] and is logged here;
//! callers only decide what a failure means for the run.

use harvest_core::Target;
use harvest_store::Credential;
use serde_json::Value;

use crate::backend::ProfileBackend;
use crate::error::{FetchFailure, FetchOperation, ScraperError};
use crate::rate_limit::retry_with_backoff;

pub struct FetchGateway<B> {
    backend: B,
    profile_retries: u32,
    retry_backoff_base_ms: u64,
}

impl<B: ProfileBackend> FetchGateway<B> {
    /// Wraps `backend` with no retries: the first profile failure is final.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            profile_retries: 0,
            retry_backoff_base_ms: 0,
        }
    }

    /// Allows up to `retries` extra attempts on transient profile errors.
    #[must_use]
    pub fn with_profile_retries(mut self, retries: u32, backoff_base_ms: u64) -> Self {
        self.profile_retries = retries;
        self.retry_backoff_base_ms = backoff_base_ms;
        self
    }

    /// # Errors
    ///
    /// Returns [`FetchFailure`] for any backend error, after retries.
    pub async fn fetch_profile(
        &self,
        credential: &Credential,
        target: &Target,
    ) -> Result<Value, FetchFailure> {
        let result = retry_with_backoff(self.profile_retries, self.retry_backoff_base_ms, || {
            self.backend
                .fetch_profile(credential, &target.public_id, target.kind)
        })
        .await;
        Self::finish(result, FetchOperation::Profile, target)
    }

    /// # Errors
    ///
    /// Returns [`FetchFailure`] for any backend error. Posts are never retried.
    pub async fn fetch_posts(
        &self,
        credential: &Credential,
        target: &Target,
    ) -> Result<Vec<Value>, FetchFailure> {
        let result = self
            .backend
            .fetch_posts(credential, &target.public_id, target.kind)
            .await;
        Self::finish(result, FetchOperation::Posts, target)
    }

    fn finish<T>(
        result: Result<T, ScraperError>,
        operation: FetchOperation,
        target: &Target,
    ) -> Result<T, FetchFailure> {
        match result {
            Ok(value) => {
                tracing::info!(
                    public_id = %target.public_id,
                    kind = %target.kind,
                    %operation,
                    "fetched"
                );
                Ok(value)
            }
            Err(source) => {
                let failure = FetchFailure {
                    operation,
                    public_id: target.public_id.clone(),
                    kind: target.kind,
                    source,
                };
                tracing::error!(error = %failure, "fetch failed");
                Err(failure)
            }
        }
    }
}
