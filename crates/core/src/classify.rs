//! Element skipping, image filtering and reference resolution.
//!
//! These are the policies shared between the block converter and the image
//! pipeline. Both passes must agree on which images exist and what their
//! absolute URLs are, otherwise a reference emitted in the document would
//! never be localized.

use scraper::Selector;
use url::Url;

use crate::Result;
use crate::parse::{Element, compile_selector};

/// Decides whether an element falls under one of the configured skip selectors.
#[derive(Debug, Clone, Default)]
pub struct SkipFilter {
    selectors: Vec<Selector>,
}

impl SkipFilter {
    /// Compiles every skip selector.
    ///
    /// # Errors
    ///
    /// Fails on the first selector that does not parse.
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| compile_selector(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// An element is skipped when a selector matches one of its ancestors, the
    /// element itself, or anything inside it.
    pub fn should_skip(&self, element: &Element<'_>) -> bool {
        self.selectors.iter().any(|selector| {
            element.has_ancestor_matching(selector)
                || element.matches(selector)
                || element.has_descendant_matching(selector)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

/// Keyword filter for image sources.
///
/// Matching is a case-insensitive substring test against the raw `src`.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    keywords: Vec<String>,
}

impl ImageFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// True when `src` is empty or contains a skip keyword.
    pub fn is_skipped(&self, src: &str) -> bool {
        if src.is_empty() {
            return true;
        }
        let lowered = src.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Resolves relative references against the configured base URL.
#[derive(Debug, Clone, Default)]
pub struct UrlResolver {
    base: Option<Url>,
}

impl UrlResolver {
    /// An empty or unparseable base leaves relative references untouched.
    pub fn new(base_url: &str) -> Self {
        let base = if base_url.trim().is_empty() {
            None
        } else {
            match Url::parse(base_url.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring invalid base URL '{}': {}", base_url, e);
                    None
                }
            }
        };
        Self { base }
    }

    /// Resolves an image source. `http://` and `https://` values pass through.
    pub fn resolve_src(&self, src: &str) -> String {
        if is_absolute(src) { src.to_string() } else { self.join(src) }
    }

    /// Resolves a link target. Absolute URLs, fragments and empty values pass
    /// through.
    pub fn resolve_href(&self, href: &str) -> String {
        if href.is_empty() || href.starts_with('#') || is_absolute(href) {
            href.to_string()
        } else {
            self.join(href)
        }
    }

    fn join(&self, reference: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(reference)
                .map(String::from)
                .unwrap_or_else(|_| reference.to_string()),
            None => reference.to_string(),
        }
    }
}

fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}
