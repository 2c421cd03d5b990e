use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harvest_core::{EntityKind, QueuedTarget};
use harvest_scraper::{AutoConsent, ScraperError};
use harvest_store::{CookieRecord, CookieSource, CredentialProbe, CredentialStore, ProbeOutcome};
use serde_json::{json, Value};

use super::*;

const ALICE: &str = "https://www.linkedin.com/in/alice";
const BOB: &str = "https://www.linkedin.com/in/bob";
const CAROL: &str = "https://www.linkedin.com/in/carol";

/// In-memory backend. Ids without a profile answer `NotFound`.
#[derive(Default)]
struct FakeBackend {
    profiles: HashMap<String, Value>,
    failing_posts: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
    cancel_after_profile: Option<CancellationToken>,
}

impl FakeBackend {
    fn with_profiles(ids: &[&str]) -> Self {
        Self {
            profiles: ids
                .iter()
                .map(|id| ((*id).to_owned(), json!({"publicIdentifier": id})))
                .collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ProfileBackend for FakeBackend {
    async fn fetch_profile(
        &self,
        credential: &Credential,
        public_id: &str,
        _kind: EntityKind,
    ) -> Result<Value, ScraperError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("profile:{public_id}@{}", credential.set_name));
        if let Some(token) = &self.cancel_after_profile {
            token.cancel();
        }
        self.profiles
            .get(public_id)
            .cloned()
            .ok_or_else(|| ScraperError::NotFound {
                url: public_id.to_owned(),
            })
    }

    async fn fetch_posts(
        &self,
        _credential: &Credential,
        public_id: &str,
        _kind: EntityKind,
    ) -> Result<Vec<Value>, ScraperError> {
        self.calls.lock().unwrap().push(format!("posts:{public_id}"));
        if self.failing_posts.contains(public_id) {
            return Err(ScraperError::UnexpectedStatus {
                status: 500,
                url: public_id.to_owned(),
            });
        }
        Ok(vec![json!({"id": format!("{public_id}-post-1")})])
    }
}

fn credential() -> Credential {
    Credential::new(
        "primary",
        vec![CookieRecord {
            name: "li_at".to_owned(),
            value: "tok".to_owned(),
            domain: ".linkedin.com".to_owned(),
            path: "/".to_owned(),
        }],
    )
}

fn open_store(dir: &Path) -> ResultStore {
    ResultStore::open(dir.join("profiles.json"), dir.join("posts.json"))
}

fn orchestrator(dir: &Path, backend: FakeBackend, pacer: Pacer) -> ScrapeOrchestrator<FakeBackend> {
    ScrapeOrchestrator::new(FetchGateway::new(backend), open_store(dir), pacer)
}

fn queue(urls: &[&str]) -> TargetQueue {
    urls.iter().map(|url| QueuedTarget::new(*url)).collect()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn calls(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

// ---------------------------------------------------------------------------
// Halting and dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_failure_halts_after_persisting_earlier_results() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::with_profiles(&["alice", "carol"]);
    let log = backend.calls();
    let mut runner = orchestrator(dir.path(), backend, Pacer::none());

    let summary = runner
        .run(&mut queue(&[ALICE, BOB, CAROL]), credential(), None)
        .await;

    assert_eq!(summary.considered, 2);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(
        summary.end,
        RunEnd::HaltedOnFailure {
            public_id: "bob".to_owned()
        }
    );
    assert_eq!(
        calls(&log),
        vec!["profile:alice@primary", "posts:alice", "profile:bob@primary"],
        "no gateway calls after the failing profile"
    );

    let profiles = read_json(&dir.path().join("profiles.json"));
    assert_eq!(profiles["alice"]["data"]["publicIdentifier"], "alice");
    assert!(profiles["alice"]["last_scraped"].as_str().unwrap().ends_with('Z'));
    assert!(profiles.get("bob").is_none());
    let posts = read_json(&dir.path().join("posts.json"));
    assert_eq!(posts["alice"][0]["id"], "alice-post-1");
}

#[tokio::test(start_paused = true)]
async fn stored_target_is_skipped_without_delay() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("profiles.json"),
        r#"{"alice": {"data": {}, "last_scraped": "2024-01-01T00:00:00Z"}}"#,
    )
    .unwrap();
    let backend = FakeBackend::default();
    let log = backend.calls();
    let mut runner = orchestrator(
        dir.path(),
        backend,
        Pacer::new(Duration::from_secs(10), Duration::from_secs(10)),
    );

    let started = tokio::time::Instant::now();
    let summary = runner.run(&mut queue(&[ALICE, BOB]), credential(), None).await;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.fetched, 0);
    assert!(matches!(summary.end, RunEnd::HaltedOnFailure { .. }));
    assert_eq!(calls(&log), vec!["profile:bob@primary"]);
}

#[tokio::test]
async fn second_run_over_persisted_store_fetches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let first = orchestrator(
        dir.path(),
        FakeBackend::with_profiles(&["alice", "bob"]),
        Pacer::none(),
    )
    .run(&mut queue(&[ALICE, BOB]), credential(), None)
    .await;
    assert_eq!(first.fetched, 2);
    assert_eq!(first.end, RunEnd::Completed);

    let backend = FakeBackend::with_profiles(&["alice", "bob"]);
    let log = backend.calls();
    let mut second_runner = orchestrator(dir.path(), backend, Pacer::none());
    let second = second_runner
        .run(&mut queue(&[ALICE, BOB]), credential(), None)
        .await;

    assert_eq!(second.fetched, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.end, RunEnd::Completed);
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn duplicate_target_in_one_run_is_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::with_profiles(&["alice"]);
    let log = backend.calls();
    let mut runner = orchestrator(dir.path(), backend, Pacer::none());

    let summary = runner
        .run(
            &mut queue(&[ALICE, "https://linkedin.com/in/alice/?trk=x"]),
            credential(),
            None,
        )
        .await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(calls(&log), vec!["profile:alice@primary", "posts:alice"]);
}

// ---------------------------------------------------------------------------
// Best-effort posts and invalid input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn posts_failure_still_stores_profile() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = FakeBackend::with_profiles(&["alice"]);
    backend.failing_posts.insert("alice".to_owned());
    let mut runner = orchestrator(dir.path(), backend, Pacer::none());

    let summary = runner.run(&mut queue(&[ALICE]), credential(), None).await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.posts_missing, 1);
    assert_eq!(summary.end, RunEnd::Completed);
    assert!(runner.store().contains("alice"));
    assert!(runner.store().posts("alice").is_none());
    assert!(dir.path().join("profiles.json").exists());
    assert!(
        !dir.path().join("posts.json").exists(),
        "empty posts map must not be written"
    );
}

#[tokio::test]
async fn unresolvable_target_is_counted_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = orchestrator(
        dir.path(),
        FakeBackend::with_profiles(&["acme"]),
        Pacer::none(),
    );

    let summary = runner
        .run(
            &mut queue(&[
                "https://www.linkedin.com/feed/",
                "https://www.linkedin.com/company/acme",
            ]),
            credential(),
            None,
        )
        .await;

    assert_eq!(summary.considered, 2);
    assert_eq!(summary.invalid, 1);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.end, RunEnd::Completed);
    assert!(runner.store().contains("acme"));
}

// ---------------------------------------------------------------------------
// Pacing and cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pauses_between_fetches_but_not_after_the_last() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = orchestrator(
        dir.path(),
        FakeBackend::with_profiles(&["alice", "bob", "carol"]),
        Pacer::new(Duration::from_secs(10), Duration::from_secs(10)),
    );

    let started = tokio::time::Instant::now();
    let summary = runner
        .run(&mut queue(&[ALICE, BOB, CAROL]), credential(), None)
        .await;

    let elapsed = started.elapsed();
    assert_eq!(summary.fetched, 3);
    assert!(
        elapsed >= Duration::from_secs(20) && elapsed < Duration::from_secs(21),
        "elapsed {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_cuts_the_pause_short() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    let mut backend = FakeBackend::with_profiles(&["alice", "bob"]);
    backend.cancel_after_profile = Some(token.clone());
    let log = backend.calls();
    let mut runner = orchestrator(
        dir.path(),
        backend,
        Pacer::new(Duration::from_secs(1000), Duration::from_secs(1000)),
    )
    .with_cancellation(token);

    let started = tokio::time::Instant::now();
    let summary = runner.run(&mut queue(&[ALICE, BOB]), credential(), None).await;

    assert!(started.elapsed() < Duration::from_secs(1000));
    assert_eq!(summary.end, RunEnd::Interrupted);
    assert_eq!(summary.fetched, 1);
    assert_eq!(calls(&log), vec!["profile:alice@primary", "posts:alice"]);
    assert!(read_json(&dir.path().join("profiles.json")).get("alice").is_some());
}

#[tokio::test]
async fn cancelled_before_start_fetches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let backend = FakeBackend::with_profiles(&["alice"]);
    let log = backend.calls();
    let mut runner =
        orchestrator(dir.path(), backend, Pacer::none()).with_cancellation(token);

    let summary = runner.run(&mut queue(&[ALICE]), credential(), None).await;

    assert_eq!(summary.considered, 0);
    assert_eq!(summary.end, RunEnd::Interrupted);
    assert!(calls(&log).is_empty());
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

struct NamedProbe(HashSet<String>);

#[async_trait]
impl CredentialProbe for NamedProbe {
    async fn probe(&self, credential: &Credential) -> ProbeOutcome {
        if self.0.contains(&credential.set_name) {
            ProbeOutcome::Valid
        } else {
            ProbeOutcome::Expired
        }
    }
}

struct NoBrowser;

#[async_trait]
impl CookieSource for NoBrowser {
    async fn read_cookies(
        &self,
    ) -> Result<Vec<CookieRecord>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Vec::new())
    }
}

fn selector(dir: &Path, sets: &[&str], valid: &[&str]) -> CredentialSelector {
    let mut store = CredentialStore::open(dir.join("cookies.json"));
    for name in sets {
        store
            .add(
                name,
                vec![CookieRecord {
                    name: "li_at".to_owned(),
                    value: (*name).to_owned(),
                    domain: ".linkedin.com".to_owned(),
                    path: "/".to_owned(),
                }],
            )
            .unwrap();
    }
    CredentialSelector::new(
        store,
        Box::new(NamedProbe(valid.iter().map(|s| (*s).to_owned()).collect())),
        Box::new(NoBrowser),
        Box::new(AutoConsent(false)),
    )
}

#[tokio::test]
async fn rotation_draws_a_credential_per_fetched_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut rotation = selector(dir.path(), &["a", "b"], &["a", "b"]);
    let first = rotation.acquire(true).await.unwrap();

    let backend = FakeBackend::with_profiles(&["alice", "bob"]);
    let log = backend.calls();
    let mut runner = orchestrator(dir.path(), backend, Pacer::none());
    let summary = runner
        .run(&mut queue(&[ALICE, BOB]), first, Some(&mut rotation))
        .await;

    assert_eq!(summary.fetched, 2);
    let log = calls(&log);
    let used: Vec<&str> = log
        .iter()
        .filter(|c| c.starts_with("profile:"))
        .filter_map(|c| c.split('@').nth(1))
        .collect();
    assert_eq!(used.len(), 2);
    assert_ne!(used[0], used[1], "consecutive targets use different sets");
}

#[tokio::test]
async fn exhausted_rotation_ends_run_without_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let mut rotation = selector(dir.path(), &["a", "b"], &[]);
    assert!(rotation.acquire(true).await.is_none());

    let backend = FakeBackend::with_profiles(&["alice"]);
    let log = backend.calls();
    let mut runner = orchestrator(dir.path(), backend, Pacer::none());
    let summary = runner
        .run(&mut queue(&[ALICE]), credential(), Some(&mut rotation))
        .await;

    assert_eq!(summary.end, RunEnd::CredentialsExhausted);
    assert_eq!(summary.fetched, 0);
    assert!(calls(&log).is_empty());
}
