//! Input entries and run results.
//!
//! [`ArticleRef`] is one entry of the caller's article list, and
//! [`ExtractionResult`] is the aggregate a run returns and partly persists.

use serde::{Deserialize, Serialize};

use crate::{HarvestError, Result};

/// One article to harvest, as supplied by the caller.
///
/// Both fields are optional in the JSON form. A missing title is derived from
/// the page; a missing URL fails the entry without any request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ArticleRef {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self { title: Some(title.into()), url: Some(url.into()) }
    }

    /// The title as given, unless missing or blank.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// The URL as given, unless missing or blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Parses a JSON array of `{title, url}` objects.
pub fn parse_article_list(json: &str) -> Result<Vec<ArticleRef>> {
    serde_json::from_str(json).map_err(HarvestError::from)
}

/// A failed entry, as listed in `failed_urls.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedArticle {
    pub title: String,
    pub url: String,
}

/// Outcome of a harvest run.
///
/// Counters only grow; every input entry lands in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success_count: usize,
    pub fail_count: usize,
    pub failed_urls: Vec<FailedArticle>,
}

impl ExtractionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_failure(&mut self, title: impl Into<String>, url: impl Into<String>) {
        self.fail_count += 1;
        self.failed_urls.push(FailedArticle { title: title.into(), url: url.into() });
    }

    pub fn total(&self) -> usize {
        self.success_count + self.fail_count
    }

    pub fn has_failures(&self) -> bool {
        self.fail_count > 0
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(HarvestError::from)
    }
}
