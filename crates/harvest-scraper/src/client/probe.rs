//! Live session validation against the signed-in feed page.

use async_trait::async_trait;
use harvest_store::{Credential, CredentialProbe, ProbeOutcome};
use reqwest::{header, StatusCode};

use super::{is_login_redirect, VoyagerClient};

#[async_trait]
impl CredentialProbe for VoyagerClient {
    /// Only `200 OK` counts as valid. A redirect to the login wall means the
    /// session expired; anything else is reported as invalid.
    async fn probe(&self, credential: &Credential) -> ProbeOutcome {
        let url = match self.feed_url() {
            Ok(url) => url,
            Err(e) => return ProbeOutcome::Invalid(e.to_string()),
        };

        let response = match self
            .client
            .get(url)
            .header(header::COOKIE, credential.cookie_header())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    set = %credential.set_name,
                    error = %e,
                    "credential probe request failed"
                );
                return ProbeOutcome::Invalid(e.to_string());
            }
        };

        let status = response.status();
        tracing::debug!(
            set = %credential.set_name,
            status = status.as_u16(),
            "credential probe response"
        );

        if status == StatusCode::OK {
            return ProbeOutcome::Valid;
        }

        if status.is_redirection() {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if is_login_redirect(location) {
                return ProbeOutcome::Expired;
            }
            return ProbeOutcome::Invalid(format!("unexpected redirect to \"{location}\""));
        }

        ProbeOutcome::Invalid(format!("unexpected status {}", status.as_u16()))
    }
}
