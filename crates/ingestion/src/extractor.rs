//! Job card extraction from search result markup
//!
//! Handles both the public (guest) result page, where cards are
//! `.base-card` blocks, and the signed-in page built from
//! `.job-card-container` blocks.

use crate::errors::IngestionError;
use jobalert_common::config::ScraperConfig;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const CARD_SELECTOR: &str =
    "div.base-card, div.job-search-card, li.jobs-search-results__list-item, div.job-card-container";
const LINK_SELECTOR: &str =
    "a.base-card__full-link, a.job-card-list__title, a.job-card-container__link";
const TITLE_SELECTOR: &str =
    "h3.base-search-card__title, .job-card-list__title, .artdeco-entity-lockup__title";

/// One job card as found on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedPost {
    pub url: String,
    pub title: String,
}

/// Turns raw result markup into postings
pub trait PostExtractor: Send + Sync {
    fn extract(&self, markup: &str) -> Vec<ScrapedPost>;
}

pub struct LinkedInExtractor {
    origin: Url,
    card: Selector,
    link: Selector,
    title: Selector,
    whitespace: Regex,
    job_view: Regex,
}

impl LinkedInExtractor {
    /// `site` is any URL on the job site; only its origin is kept, e.g.
    /// `https://www.linkedin.com/jobs/search/` becomes `https://www.linkedin.com/`
    pub fn new(site: &str) -> Result<Self, IngestionError> {
        let origin = Url::parse(site)?.origin().ascii_serialization();

        Ok(Self {
            origin: Url::parse(&origin)?,
            card: parse_selector(CARD_SELECTOR)?,
            link: parse_selector(LINK_SELECTOR)?,
            title: parse_selector(TITLE_SELECTOR)?,
            whitespace: parse_regex(r"\s+")?,
            job_view: parse_regex(r"^/jobs/view/(?:[^/]*-)?(\d+)/?$")?,
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, IngestionError> {
        Self::new(&config.search_base_url)
    }

    /// Stable identity for a card link.
    ///
    /// Job view links collapse to `<origin>/jobs/view/<numeric id>`, whatever
    /// regional host or title slug the page used. Other links become absolute
    /// URLs without query string, fragment or trailing slash.
    pub fn canonical_url(&self, href: &str) -> Option<String> {
        let mut url = self.origin.join(href.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        if let Some(id) = self.job_view.captures(url.path()).and_then(|c| c.get(1)) {
            let job = self.origin.join(&format!("/jobs/view/{}", id.as_str())).ok()?;
            return Some(job.into());
        }

        url.set_query(None);
        url.set_fragment(None);

        let path = url.path().trim_end_matches('/').to_string();
        if !path.is_empty() {
            url.set_path(&path);
        }

        Some(url.into())
    }

    fn clean_text(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }

    fn card_title(&self, card: ElementRef<'_>, link: ElementRef<'_>) -> Option<String> {
        let from_heading = card
            .select(&self.title)
            .map(|el| self.clean_text(&el.text().collect::<String>()))
            .find(|t| !t.is_empty());

        from_heading
            .or_else(|| Some(self.clean_text(&link.text().collect::<String>())))
            .filter(|t| !t.is_empty())
            .or_else(|| link.value().attr("aria-label").map(|l| self.clean_text(l)))
            .filter(|t| !t.is_empty())
    }
}

impl PostExtractor for LinkedInExtractor {
    fn extract(&self, markup: &str) -> Vec<ScrapedPost> {
        let document = Html::parse_document(markup);
        let mut seen = HashSet::new();
        let mut posts = Vec::new();

        for card in document.select(&self.card) {
            let Some(link) = card.select(&self.link).next() else {
                continue;
            };
            let Some(url) = link.value().attr("href").and_then(|h| self.canonical_url(h)) else {
                debug!("Skipping card without a usable link");
                continue;
            };
            let Some(title) = self.card_title(card, link) else {
                debug!(url = %url, "Skipping card without a title");
                continue;
            };

            // Nested card containers match twice
            if seen.insert(url.clone()) {
                posts.push(ScrapedPost { url, title });
            }
        }

        debug!(count = posts.len(), "Extracted job cards");
        posts
    }
}

/// Document `<title>`, whitespace-collapsed
pub fn page_title(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn parse_selector(selector: &str) -> Result<Selector, IngestionError> {
    Selector::parse(selector).map_err(|e| IngestionError::ExtractionError(e.to_string()))
}

fn parse_regex(pattern: &str) -> Result<Regex, IngestionError> {
    Regex::new(pattern).map_err(|e| IngestionError::ExtractionError(e.to_string()))
}
