//! `harvest run` and `harvest status`.
//!
//! `run` fails before any fetch when the target file is unusable or no
//! credential can be acquired, and exits non-zero when the run halts.

mod runner;

use anyhow::Context;
use harvest_core::{AppConfig, TargetQueue};
use harvest_scraper::{CredentialSelector, FetchGateway, FirefoxCookieSource, Pacer};
use harvest_store::{CredentialStore, ResultStore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::consent::consent_for;
use crate::credentials::build_client;
use crate::RunArgs;

use self::runner::{RunEnd, ScrapeOrchestrator};

pub(crate) async fn run_scrape(config: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    let input = args.input.as_deref().unwrap_or(config.input_path.as_path());
    let targets = harvest_core::load_targets(input)
        .with_context(|| format!("cannot load targets from {}", input.display()))?;
    let mut queue = TargetQueue::new(targets);

    let client = build_client(config)?;
    let rotate = args.rotate || config.iterate_accounts;
    let mut selector = CredentialSelector::new(
        CredentialStore::open(&config.cookie_file),
        Box::new(client.clone()),
        Box::new(FirefoxCookieSource::new(client.cookie_domain())),
        consent_for(args.yes, args.no_import),
    );
    let Some(credential) = selector.acquire(rotate).await else {
        anyhow::bail!(
            "no valid credentials available; add a set with `harvest credentials add` or import from Firefox"
        );
    };

    let store = ResultStore::open(&config.profile_output, &config.post_output);
    store.log_current_state();

    let gateway = FetchGateway::new(client)
        .with_profile_retries(config.profile_retries, config.retry_backoff_base_ms);
    let (min_delay, max_delay) = config.delay_bounds();
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let mut orchestrator = ScrapeOrchestrator::new(gateway, store, Pacer::new(min_delay, max_delay))
        .with_cancellation(cancel);

    let run_id = uuid::Uuid::new_v4();
    let rotation = if selector.is_rotating() {
        Some(&mut selector)
    } else {
        None
    };
    let summary = orchestrator
        .run(&mut queue, credential, rotation)
        .instrument(tracing::info_span!("run", %run_id))
        .await;
    orchestrator.store().log_current_state();

    println!(
        "considered {} of {} targets: {} fetched, {} skipped, {} invalid, {} without posts",
        summary.considered,
        queue.total(),
        summary.fetched,
        summary.skipped,
        summary.invalid,
        summary.posts_missing,
    );

    match summary.end {
        RunEnd::Completed => Ok(()),
        RunEnd::HaltedOnFailure { public_id } => {
            anyhow::bail!("run halted: profile fetch failed for '{public_id}'")
        }
        RunEnd::CredentialsExhausted => {
            anyhow::bail!("run halted: every credential set was rejected")
        }
        RunEnd::Interrupted => anyhow::bail!("run interrupted"),
    }
}

pub(crate) fn show_status(config: &AppConfig) {
    let store = ResultStore::open(&config.profile_output, &config.post_output);
    store.log_current_state();
    println!(
        "{} profiles in {}",
        store.count(),
        store.profile_path().display()
    );
    println!(
        "{} post collections in {}",
        store.posts_count(),
        store.post_path().display()
    );
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("interrupt received; stopping after the current target");
                cancel.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
        }
    });
}
