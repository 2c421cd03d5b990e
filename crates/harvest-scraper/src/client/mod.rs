//! HTTP client for the remote profile service's internal JSON API.

mod endpoints;
mod probe;

use std::time::Duration;

use async_trait::async_trait;
use harvest_core::EntityKind;
use harvest_store::Credential;
use reqwest::{header, redirect, Client, StatusCode, Url};
use serde_json::Value;

use crate::backend::ProfileBackend;
use crate::error::ScraperError;

/// Non-standard status the service uses when it blocks automated traffic.
const BLOCKED_STATUS: u16 = 999;

/// Client for the profile service.
///
/// Redirects are never followed: a redirect to the login wall is how the
/// service reports an expired session, and it is mapped to
/// [`ScraperError::Unauthorized`].
#[derive(Clone)]
pub struct VoyagerClient {
    client: Client,
    base_url: Url,
    posts_per_target: u32,
}

impl VoyagerClient {
    /// Creates a client rooted at `base_url` (e.g. `https://www.linkedin.com`).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ScraperError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        posts_per_target: u32,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()?;

        // Trailing slash so relative joins append rather than replace the
        // last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            posts_per_target,
        })
    }

    /// Host of the base URL without a leading `www.`, used to scope
    /// browser cookie imports.
    #[must_use]
    pub fn cookie_domain(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        host.strip_prefix("www.").unwrap_or(host).to_owned()
    }

    fn authed_get(&self, credential: &Credential, url: Url) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header(header::COOKIE, credential.cookie_header())
            .header(header::ACCEPT, "application/vnd.linkedin.normalized+json+2.1")
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header("x-restli-protocol-version", "2.0.0")
            .header("x-li-lang", "en_US");
        if let Some(token) = credential.csrf_token() {
            request = request.header("csrf-token", token);
        }
        request
    }

    /// Sends an authenticated GET and decodes the JSON body, mapping
    /// non-success statuses to typed errors.
    async fn get_json(
        &self,
        credential: &Credential,
        url: Url,
        context: &str,
    ) -> Result<Value, ScraperError> {
        let url_string = url.to_string();
        let response = self.authed_get(credential, url).send().await?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if is_login_redirect(location) {
                return Err(ScraperError::Unauthorized {
                    status: status.as_u16(),
                    url: url_string,
                });
            }
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url_string,
            });
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ScraperError::Unauthorized {
                    status: status.as_u16(),
                    url: url_string,
                });
            }
            StatusCode::NOT_FOUND => return Err(ScraperError::NotFound { url: url_string }),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    status: status.as_u16(),
                    retry_after_secs,
                });
            }
            s if s.as_u16() == BLOCKED_STATUS => {
                return Err(ScraperError::RateLimited {
                    status: BLOCKED_STATUS,
                    retry_after_secs: 0,
                });
            }
            s if !s.is_success() => {
                return Err(ScraperError::UnexpectedStatus {
                    status: s.as_u16(),
                    url: url_string,
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        serde_json::from_str::<Value>(&body).map_err(|e| ScraperError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

pub(crate) fn is_login_redirect(location: &str) -> bool {
    location.contains("login") || location.contains("authwall") || location.contains("checkpoint")
}

/// Pulls the entity out of an organization lookup, which answers with a
/// collection of zero or one match.
fn first_element(body: Value, context: &str, url: &str) -> Result<Value, ScraperError> {
    match body {
        Value::Object(mut map) => match map.remove("elements") {
            Some(Value::Array(elements)) => {
                elements
                    .into_iter()
                    .next()
                    .ok_or_else(|| ScraperError::NotFound {
                        url: url.to_owned(),
                    })
            }
            _ => Err(ScraperError::Shape {
                context: context.to_owned(),
                reason: "missing \"elements\" array".to_owned(),
            }),
        },
        _ => Err(ScraperError::Shape {
            context: context.to_owned(),
            reason: "response is not a JSON object".to_owned(),
        }),
    }
}

/// Post collections arrive as `elements`, or under `included` for
/// normalized responses.
fn post_entries(body: Value, context: &str) -> Result<Vec<Value>, ScraperError> {
    let Value::Object(mut map) = body else {
        return Err(ScraperError::Shape {
            context: context.to_owned(),
            reason: "response is not a JSON object".to_owned(),
        });
    };
    for key in ["elements", "included"] {
        if let Some(Value::Array(entries)) = map.remove(key) {
            return Ok(entries);
        }
    }
    Err(ScraperError::Shape {
        context: context.to_owned(),
        reason: "no \"elements\" or \"included\" array".to_owned(),
    })
}

#[async_trait]
impl ProfileBackend for VoyagerClient {
    async fn fetch_profile(
        &self,
        credential: &Credential,
        public_id: &str,
        kind: EntityKind,
    ) -> Result<Value, ScraperError> {
        let url = self.profile_url(public_id, kind)?;
        let context = format!("{kind} profile {public_id}");
        let url_string = url.to_string();
        let body = self.get_json(credential, url, &context).await?;
        match kind {
            EntityKind::User => Ok(body),
            EntityKind::Organization => first_element(body, &context, &url_string),
        }
    }

    async fn fetch_posts(
        &self,
        credential: &Credential,
        public_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<Value>, ScraperError> {
        let url = self.posts_url(public_id, kind)?;
        let context = format!("{kind} posts {public_id}");
        let body = self.get_json(credential, url, &context).await?;
        post_entries(body, &context)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
