//! The batch harvest loop.
//!
//! [`Harvester::run`] processes articles one at a time: fetch, decode, convert,
//! save, then localize images. A failing article is recorded and the loop
//! moves on; only output-directory and run-file errors abort the run.
//!
//! The parsed DOM never outlives [`Harvester::extract`], which is synchronous
//! and returns owned data. Nothing borrowed from the tree is held across an
//! await point.

use std::path::PathBuf;

use scraper::Selector;

use crate::article::{ArticleRef, ExtractionResult};
use crate::classify::{ImageFilter, UrlResolver};
use crate::config::ExtractionConfig;
use crate::fetch::{Fetcher, validate_headers};
use crate::formatters::markdown::{MarkdownConverter, MarkdownDocument};
use crate::images::{ImageLocalizer, collect_image_urls};
use crate::parse::{Document, compile_selector};
use crate::report::{Reporter, TracingReporter};
use crate::storage::{ArchiveStore, TextCodec};
use crate::{HarvestError, Result};

/// A converted article, detached from the page it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub document: MarkdownDocument,
    /// Images to localize, in document order. Empty when downloads are off.
    pub image_urls: Vec<String>,
}

/// Title used when neither the input nor the page provides one.
pub fn fallback_title(index: usize) -> String {
    format!("Article_{}", index)
}

/// Runs a batch of articles against one configuration.
pub struct Harvester<F, R = TracingReporter> {
    config: ExtractionConfig,
    fetcher: F,
    reporter: R,
    content_selector: Selector,
    title_selector: Selector,
    converter: MarkdownConverter,
    images: ImageFilter,
    resolver: UrlResolver,
    store: ArchiveStore,
}

impl<F: Fetcher> Harvester<F> {
    /// Harvester that reports through `tracing`.
    pub fn with_tracing(config: ExtractionConfig, fetcher: F) -> Result<Self> {
        Self::new(config, fetcher, TracingReporter)
    }
}

impl<F: Fetcher, R: Reporter> Harvester<F, R> {
    /// Compiles every selector up front.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] if a selector or header is
    /// invalid, or if the file encoding cannot be written.
    pub fn new(config: ExtractionConfig, fetcher: F, reporter: R) -> Result<Self> {
        let content_selector = compile_selector(&config.main_content_selector).map_err(as_config_error)?;
        let title_selector = compile_selector(&config.title_selector).map_err(as_config_error)?;
        let converter = MarkdownConverter::new(&config).map_err(as_config_error)?;
        validate_headers(&config.headers)?;
        let store = ArchiveStore::new(&config.output_dir, TextCodec::for_label(&config.file_encoding)?);

        Ok(Self {
            images: ImageFilter::new(&config.image_skip_keywords),
            resolver: UrlResolver::new(&config.base_url),
            content_selector,
            title_selector,
            converter,
            store,
            config,
            fetcher,
            reporter,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Harvests every article in order and writes the run files.
    ///
    /// `success_count + fail_count` always equals `articles.len()`.
    ///
    /// # Errors
    ///
    /// Fails only if the output directory, the failure list or the index
    /// cannot be written.
    pub async fn run(&self, articles: &[ArticleRef]) -> Result<ExtractionResult> {
        self.store.ensure_root()?;

        let total = articles.len();
        self.reporter.run_started(total);
        let mut result = ExtractionResult::new();

        for (i, article) in articles.iter().enumerate() {
            let index = i + 1;
            let label = article.title().map(str::to_string).unwrap_or_else(|| fallback_title(index));
            self.reporter.article_started(index, total, &label);

            let Some(url) = article.url() else {
                self.reporter.article_failed(&label, &HarvestError::MissingUrl);
                result.record_failure(label, "");
                continue;
            };

            match self.harvest_article(index, article.title(), url).await {
                Ok(_) => result.record_success(),
                Err(e) => {
                    self.reporter.article_failed(&label, &e);
                    result.record_failure(label, url);
                }
            }

            let delay = self.config.delay();
            if index < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        self.write_run_files(&result)?;
        self.reporter.run_finished(&result);
        Ok(result)
    }

    /// Fetches, converts and saves one article, then localizes its images.
    /// Returns the path of the saved Markdown file.
    pub async fn harvest_article(&self, index: usize, title: Option<&str>, url: &str) -> Result<PathBuf> {
        let bytes = self
            .fetcher
            .fetch_page(url, self.config.timeout(), &self.config.headers)
            .await?;
        let html = self.store.codec().decode(&bytes);

        let article = self.extract(&html, title, url, index)?;
        let path = self.store.write_article(&article.title, &article.document)?;
        self.reporter.article_saved(&article.title, &path);

        if !article.image_urls.is_empty() {
            self.reporter.images_found(&article.title, article.image_urls.len());
            let localizer = ImageLocalizer::new(&self.config, &self.fetcher, &self.store, &self.reporter);
            localizer
                .localize(&article.image_urls, &self.store.article_dir(&article.title), &path)
                .await?;
        }

        Ok(path)
    }

    /// Converts a fetched page.
    ///
    /// The title is `title` when given, else the trimmed text of the first
    /// title-selector match, else `Article_<index>`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ContentNotFound`] when the content selector
    /// matches nothing.
    pub fn extract(&self, html: &str, title: Option<&str>, url: &str, index: usize) -> Result<ExtractedArticle> {
        let doc = Document::parse(html)?;
        let root = doc
            .select_first(&self.content_selector)
            .ok_or_else(|| HarvestError::ContentNotFound { selector: self.config.main_content_selector.clone() })?;

        let title = match title {
            Some(title) => title.to_string(),
            None => doc
                .select_first(&self.title_selector)
                .map(|el| el.text().trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| fallback_title(index)),
        };

        let document = self.converter.convert(&root, &title, url);
        let image_urls = if self.config.download_images {
            collect_image_urls(&root, &self.images, &self.resolver)
        } else {
            Vec::new()
        };

        tracing::debug!(title = %title, blocks = document.len(), images = image_urls.len(), "Extracted article");
        Ok(ExtractedArticle { title, document, image_urls })
    }

    fn write_run_files(&self, result: &ExtractionResult) -> Result<()> {
        if self.config.save_failed_urls && result.has_failures() {
            let path = self.store.write_failed_urls(&result.failed_urls)?;
            self.reporter.file_written(&path);
        }
        if self.config.create_index {
            let path = self.store.write_index()?;
            self.reporter.file_written(&path);
        }
        Ok(())
    }
}

fn as_config_error(error: HarvestError) -> HarvestError {
    match error {
        HarvestError::HtmlParseError(message) => HarvestError::ConfigError(message),
        other => other,
    }
}
