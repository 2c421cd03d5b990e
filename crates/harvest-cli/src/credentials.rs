//! `harvest credentials ...` handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use harvest_scraper::{FirefoxCookieSource, VoyagerClient};
use harvest_store::{CookieRecord, CredentialStore};

#[derive(Debug, Subcommand)]
pub(crate) enum CredentialCommands {
    /// List stored credential sets
    List,
    /// Probe one set, or every set, against the live service
    Validate {
        /// Set to validate; all sets when omitted
        name: Option<String>,
    },
    /// Import session cookies from the local Firefox profile
    Import,
    /// Add or replace a set from a JSON array of cookie records
    Add {
        name: String,

        #[arg(long)]
        file: PathBuf,
    },
}

pub(crate) async fn run_credentials_command(
    config: &harvest_core::AppConfig,
    command: CredentialCommands,
) -> anyhow::Result<()> {
    let mut store = CredentialStore::open(&config.cookie_file);

    match command {
        CredentialCommands::List => {
            if store.is_empty() {
                println!("no credential sets stored in {}", store.path().display());
                return Ok(());
            }
            for name in store.names() {
                let cookies = store.get(&name).map_or(0, Vec::len);
                println!("{name}\t{cookies} cookies");
            }
        }
        CredentialCommands::Validate { name } => {
            let client = build_client(config)?;
            let names = match name {
                Some(name) => {
                    if store.get(&name).is_none() {
                        anyhow::bail!("credential set '{name}' not found");
                    }
                    vec![name]
                }
                None => store.names(),
            };
            if names.is_empty() {
                anyhow::bail!("no credential sets stored in {}", store.path().display());
            }

            let mut valid = 0usize;
            for name in &names {
                let ok = store.validate(name, &client).await;
                println!("{name}\t{}", if ok { "valid" } else { "invalid" });
                if ok {
                    valid += 1;
                }
            }
            if valid == 0 {
                anyhow::bail!("none of {} credential sets are valid", names.len());
            }
        }
        CredentialCommands::Import => {
            let client = build_client(config)?;
            let source = FirefoxCookieSource::new(client.cookie_domain());
            if !store.import_from_browser(&source).await {
                anyhow::bail!("no session cookies imported from Firefox");
            }
            println!("imported Firefox cookies into {}", store.path().display());
        }
        CredentialCommands::Add { name, file } => {
            let cookies = read_cookie_file(&file)?;
            let count = cookies.len();
            store.add(&name, cookies)?;
            println!("stored {count} cookies as '{name}'");
        }
    }

    Ok(())
}

pub(crate) fn build_client(config: &harvest_core::AppConfig) -> anyhow::Result<VoyagerClient> {
    let client = VoyagerClient::new(
        &config.base_url,
        config.request_timeout(),
        &config.user_agent,
        config.posts_per_target,
    )?;
    Ok(client)
}

fn read_cookie_file(path: &Path) -> anyhow::Result<Vec<CookieRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cookies: Vec<CookieRecord> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of cookie records", path.display()))?;
    if cookies.is_empty() {
        anyhow::bail!("{} contains no cookies", path.display());
    }
    Ok(cookies)
}
