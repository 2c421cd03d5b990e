//! The sequential scrape loop.
//!
//! Targets are handled strictly one at a time: resolve, dedup against the
//! result store, fetch the profile (halting the run on failure), fetch posts
//! (best effort), persist, then pace. The store is persisted once more when
//! the loop ends, however it ends.

use harvest_core::{Target, TargetQueue};
use harvest_scraper::{CredentialSelector, FetchGateway, Pacer, ProfileBackend};
use harvest_store::{Credential, ResultStore};
use tokio_util::sync::CancellationToken;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunEnd {
    /// Every target was considered.
    Completed,
    /// A profile fetch failed; no further targets were attempted.
    HaltedOnFailure { public_id: String },
    /// Rotation found no valid credential set for the next fetch.
    CredentialsExhausted,
    /// Cancelled (Ctrl-C) between targets.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub considered: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub invalid: usize,
    /// Fetched targets whose posts could not be retrieved.
    pub posts_missing: usize,
    pub end: RunEnd,
}

/// What happened to one target.
enum TargetOutcome {
    Invalid,
    Skipped,
    Fetched { posts: bool },
    Failed,
}

pub(crate) struct ScrapeOrchestrator<B> {
    gateway: FetchGateway<B>,
    store: ResultStore,
    pacer: Pacer,
    cancel: CancellationToken,
}

impl<B: ProfileBackend> ScrapeOrchestrator<B> {
    pub(crate) fn new(gateway: FetchGateway<B>, store: ResultStore, pacer: Pacer) -> Self {
        Self {
            gateway,
            store,
            pacer,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub(crate) fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Runs `queue` to completion or until the first halting condition.
    ///
    /// With `rotation`, a fresh credential is drawn from the selector before
    /// every fetched target; otherwise `credential` is used throughout.
    pub(crate) async fn run(
        &mut self,
        queue: &mut TargetQueue,
        credential: Credential,
        mut rotation: Option<&mut CredentialSelector>,
    ) -> RunSummary {
        let total = queue.total();
        let mut credential = credential;
        let mut summary = RunSummary {
            considered: 0,
            fetched: 0,
            skipped: 0,
            invalid: 0,
            posts_missing: 0,
            end: RunEnd::Completed,
        };

        tracing::info!(targets = total, stored = self.store.count(), "starting scrape run");

        let end = loop {
            if self.cancel.is_cancelled() {
                break RunEnd::Interrupted;
            }
            let Some(queued) = queue.next() else {
                break RunEnd::Completed;
            };
            summary.considered += 1;

            let target = match Target::resolve(&queued.url) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!(error = %e, label = ?queued.label, "skipping invalid target");
                    summary.invalid += 1;
                    log_progress(&summary, total, &queued.url, &TargetOutcome::Invalid);
                    continue;
                }
            };

            if self.store.contains(&target.public_id) {
                summary.skipped += 1;
                log_progress(&summary, total, &target.public_id, &TargetOutcome::Skipped);
                continue;
            }

            if let Some(selector) = rotation.as_deref_mut() {
                match selector.next().await {
                    Some(next) => credential = next,
                    None => break RunEnd::CredentialsExhausted,
                }
            }

            let outcome = self.scrape_target(&credential, &target).await;
            log_progress(&summary, total, &target.public_id, &outcome);
            match outcome {
                TargetOutcome::Fetched { posts } => {
                    summary.fetched += 1;
                    if !posts {
                        summary.posts_missing += 1;
                    }
                }
                TargetOutcome::Failed => {
                    break RunEnd::HaltedOnFailure {
                        public_id: target.public_id,
                    };
                }
                TargetOutcome::Invalid | TargetOutcome::Skipped => {}
            }

            // No pause after the final target.
            if queue.remaining_count() == 0 {
                continue;
            }
            let delay = self.pacer.next_delay();
            tracing::debug!(delay_secs = delay.as_secs_f64(), "pausing before next target");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.cancel.cancelled() => break RunEnd::Interrupted,
            }
        };

        if let Err(e) = self.store.persist() {
            tracing::error!(error = %e, "final persist failed; previous files left intact");
        }

        summary.end = end;
        log_summary(&summary);
        summary
    }

    async fn scrape_target(&mut self, credential: &Credential, target: &Target) -> TargetOutcome {
        let Ok(profile) = self.gateway.fetch_profile(credential, target).await else {
            return TargetOutcome::Failed;
        };
        let posts = self.gateway.fetch_posts(credential, target).await.ok();
        let got_posts = posts.is_some();

        self.store.upsert_profile(&target.public_id, profile);
        if let Some(posts) = posts {
            self.store.upsert_posts(&target.public_id, posts);
        }
        if let Err(e) = self.store.persist() {
            tracing::error!(
                public_id = %target.public_id,
                error = %e,
                "persist failed; continuing with in-memory results"
            );
        }

        TargetOutcome::Fetched { posts: got_posts }
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_progress(summary: &RunSummary, total: usize, id: &str, outcome: &TargetOutcome) {
    let percent = if total == 0 {
        100.0
    } else {
        summary.considered as f64 * 100.0 / total as f64
    };
    let outcome = match outcome {
        TargetOutcome::Invalid => "invalid",
        TargetOutcome::Skipped => "skipped",
        TargetOutcome::Fetched { posts: true } => "fetched",
        TargetOutcome::Fetched { posts: false } => "fetched without posts",
        TargetOutcome::Failed => "failed",
    };
    tracing::info!(
        target_id = id,
        outcome,
        progress = format_args!("{percent:.1}%"),
        "{}/{total}",
        summary.considered
    );
}

fn log_summary(summary: &RunSummary) {
    let RunSummary {
        considered,
        fetched,
        skipped,
        invalid,
        posts_missing,
        end,
    } = summary;
    match end {
        RunEnd::Completed => tracing::info!(
            considered,
            fetched,
            skipped,
            invalid,
            posts_missing,
            "scrape run completed"
        ),
        RunEnd::HaltedOnFailure { public_id } => tracing::error!(
            considered,
            fetched,
            skipped,
            invalid,
            posts_missing,
            public_id = %public_id,
            "scrape run halted after profile fetch failure"
        ),
        RunEnd::CredentialsExhausted => tracing::error!(
            considered,
            fetched,
            skipped,
            invalid,
            posts_missing,
            "scrape run stopped: no valid credentials left"
        ),
        RunEnd::Interrupted => tracing::warn!(
            considered,
            fetched,
            skipped,
            invalid,
            posts_missing,
            "scrape run interrupted"
        ),
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
