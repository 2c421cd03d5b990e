//! Choosing a working credential from the stored sets.
//!
//! [`CredentialSelector::acquire`] is called once at startup. In rotating
//! mode the orchestrator then calls [`CredentialSelector::next`] before each
//! fetch, which walks the set names cyclically and skips sets that failed
//! validation. Probe results are remembered for the selector's lifetime, so
//! each set is probed at most once per run.

use std::collections::HashMap;

use harvest_store::{CookieSource, Credential, CredentialProbe, CredentialStore};

/// Decides whether to import browser cookies when no credentials exist.
pub trait ImportConsent: Send + Sync {
    fn confirm_import(&self) -> bool;
}

/// Fixed answer, for `--yes` / `--no-import` and non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct AutoConsent(pub bool);

impl ImportConsent for AutoConsent {
    fn confirm_import(&self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    NoCredentials,
    HasInvalidated,
    HasValid,
    Rotating,
}

pub struct CredentialSelector {
    store: CredentialStore,
    probe: Box<dyn CredentialProbe>,
    source: Box<dyn CookieSource>,
    consent: Box<dyn ImportConsent>,
    state: SelectorState,
    validity: HashMap<String, bool>,
    ring: Vec<String>,
    cursor: usize,
    current: Option<Credential>,
    probes: usize,
}

impl CredentialSelector {
    #[must_use]
    pub fn new(
        store: CredentialStore,
        probe: Box<dyn CredentialProbe>,
        source: Box<dyn CookieSource>,
        consent: Box<dyn ImportConsent>,
    ) -> Self {
        Self {
            store,
            probe,
            source,
            consent,
            state: SelectorState::NoCredentials,
            validity: HashMap::new(),
            ring: Vec::new(),
            cursor: 0,
            current: None,
            probes: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SelectorState {
        self.state
    }

    /// Number of live validation probes issued so far.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes
    }

    #[must_use]
    pub fn is_rotating(&self) -> bool {
        self.state == SelectorState::Rotating
    }

    /// Loads all sets and returns a validated credential, or `None` if no
    /// set works.
    ///
    /// With no stored sets the consent provider is asked once whether to
    /// import from the browser. Rotation only engages with two or more sets.
    pub async fn acquire(&mut self, allow_rotation: bool) -> Option<Credential> {
        self.store.load();

        if self.store.is_empty() {
            self.state = SelectorState::NoCredentials;
            if self.consent.confirm_import() && self.store.import_from_browser(&*self.source).await
            {
                tracing::info!("session cookies imported from browser");
            } else {
                tracing::warn!("no credentials available; scraping cannot proceed");
                return None;
            }
        }

        let names = self.store.names();
        if allow_rotation && names.len() > 1 {
            tracing::info!(sets = names.len(), "rotating across credential sets");
            self.ring = names;
            self.cursor = 0;
            self.state = SelectorState::Rotating;
            return self.next().await;
        }

        for name in &names {
            if self.is_valid(name).await {
                self.current = self.store.build_usable_credential(name);
                if self.current.is_some() {
                    self.state = SelectorState::HasValid;
                    tracing::info!(set = %name, "using credential set");
                    return self.current.clone();
                }
            }
        }

        self.state = SelectorState::HasInvalidated;
        self.current = None;
        tracing::warn!("no valid credentials found");
        None
    }

    /// The credential to use for the next request.
    ///
    /// Outside rotating mode this is the credential chosen by `acquire`.
    /// In rotating mode it advances the cursor through at most one full
    /// cycle of sets and returns the first valid one, or `None` once every
    /// set has proven invalid.
    pub async fn next(&mut self) -> Option<Credential> {
        if self.state != SelectorState::Rotating {
            return self.current.clone();
        }

        for _ in 0..self.ring.len() {
            let name = self.ring[self.cursor].clone();
            self.cursor = (self.cursor + 1) % self.ring.len();
            if self.is_valid(&name).await {
                if let Some(credential) = self.store.build_usable_credential(&name) {
                    tracing::debug!(set = %name, "rotated to credential set");
                    self.current = Some(credential);
                    return self.current.clone();
                }
            }
        }

        tracing::warn!("no valid credentials found in the rotation");
        self.state = SelectorState::HasInvalidated;
        self.current = None;
        None
    }

    async fn is_valid(&mut self, name: &str) -> bool {
        if let Some(&known) = self.validity.get(name) {
            return known;
        }
        self.probes += 1;
        let valid = self.store.validate(name, &*self.probe).await;
        self.validity.insert(name.to_owned(), valid);
        valid
    }
}
