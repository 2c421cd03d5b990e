//! Endpoint URL construction for [`VoyagerClient`].

use harvest_core::EntityKind;
use reqwest::Url;

use super::VoyagerClient;
use crate::error::ScraperError;

const COMPANY_DECORATION: &str =
    "com.linkedin.voyager.deco.organization.web.WebFullCompanyMain-12";

impl VoyagerClient {
    /// Builds `base + segments`, percent-encoding each segment.
    fn url_with_segments(&self, segments: &[&str]) -> Result<Url, ScraperError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ScraperError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(super) fn profile_url(
        &self,
        public_id: &str,
        kind: EntityKind,
    ) -> Result<Url, ScraperError> {
        match kind {
            EntityKind::User => self.url_with_segments(&[
                "voyager",
                "api",
                "identity",
                "profiles",
                public_id,
                "profileView",
            ]),
            EntityKind::Organization => {
                let mut url =
                    self.url_with_segments(&["voyager", "api", "organization", "companies"])?;
                url.query_pairs_mut()
                    .append_pair("decorationId", COMPANY_DECORATION)
                    .append_pair("q", "universalName")
                    .append_pair("universalName", public_id);
                Ok(url)
            }
        }
    }

    pub(super) fn posts_url(&self, public_id: &str, kind: EntityKind) -> Result<Url, ScraperError> {
        let count = self.posts_per_target.to_string();
        match kind {
            EntityKind::User => {
                let mut url =
                    self.url_with_segments(&["voyager", "api", "identity", "profileUpdatesV2"])?;
                url.query_pairs_mut()
                    .append_pair("q", "memberShareFeed")
                    .append_pair("moduleKey", "member-shares:phone")
                    .append_pair("includeLongTermHistory", "true")
                    .append_pair("profileId", public_id)
                    .append_pair("count", &count)
                    .append_pair("start", "0");
                Ok(url)
            }
            EntityKind::Organization => {
                let mut url = self.url_with_segments(&["voyager", "api", "feed", "updatesV2"])?;
                url.query_pairs_mut()
                    .append_pair("q", "companyFeedByUniversalName")
                    .append_pair("moduleKey", "member-share")
                    .append_pair("companyUniversalName", public_id)
                    .append_pair("count", &count)
                    .append_pair("start", "0");
                Ok(url)
            }
        }
    }

    /// Page that only renders for a signed-in session.
    pub(super) fn feed_url(&self) -> Result<Url, ScraperError> {
        self.url_with_segments(&["feed", ""])
    }
}
