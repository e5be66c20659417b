//! Job search URL construction

use crate::errors::IngestionError;
use jobalert_common::config::ScraperConfig;
use jobalert_common::db::models::Profile;
use url::Url;

/// Builds search result URLs for the configured job site
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    base: Url,
    remote_only: bool,
}

impl SearchUrlBuilder {
    pub fn new(base: &str, remote_only: bool) -> Result<Self, IngestionError> {
        Ok(Self {
            base: Url::parse(base)?,
            remote_only,
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, IngestionError> {
        Self::new(&config.search_base_url, config.remote_only)
    }

    /// Search URL for a keyword expression and optional location.
    ///
    /// Values are form-encoded; a blank location is left out and the
    /// remote-work filter (`f_WT=2`) is appended when enabled.
    pub fn build(&self, keywords: &str, location: Option<&str>) -> String {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("keywords", keywords.trim());

            if let Some(location) = location.map(str::trim).filter(|l| !l.is_empty()) {
                query.append_pair("location", location);
            }

            if self.remote_only {
                query.append_pair("f_WT", "2");
            }
        }

        url.into()
    }

    pub fn for_profile(&self, profile: &Profile) -> String {
        self.build(&profile.keywords, profile.location.as_deref())
    }
}
