//! Image references and image localization.
//!
//! The block converter turns each `img` into an [`ImageRef`]; after the article
//! is saved, [`collect_image_urls`] walks the same content root again with the
//! same [`ImageFilter`] and [`UrlResolver`], so every URL it returns appears
//! verbatim in the saved Markdown. [`ImageLocalizer`] downloads those URLs next
//! to the article and rewrites the references to point at the local copies.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::{HarvestError, Result};
use crate::classify::{ImageFilter, UrlResolver};
use crate::config::ExtractionConfig;
use crate::fetch::Fetcher;
use crate::parse::Element;
use crate::report::Reporter;
use crate::storage::ArchiveStore;

const DEFAULT_ALT: &str = "image";
const DEFAULT_EXTENSION: &str = ".png";

/// An image kept by the filter, with its source already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

impl ImageRef {
    /// Builds a reference from an `img` element, or `None` when the source is
    /// empty or filtered out.
    pub fn from_element(img: &Element<'_>, filter: &ImageFilter, resolver: &UrlResolver) -> Option<Self> {
        let src = img.attr("src").unwrap_or_default();
        if filter.is_skipped(src) {
            tracing::debug!("Skipping image '{}'", src);
            return None;
        }
        let alt = img.attr("alt").unwrap_or(DEFAULT_ALT);
        Some(Self { src: resolver.resolve_src(src), alt: alt.to_string() })
    }

    pub fn to_markdown(&self) -> String {
        format!("![{}]({})", self.alt, self.src)
    }
}

/// Absolute URLs of every kept image under `root`, in document order.
///
/// Duplicates are preserved: each occurrence gets its own download slot.
pub fn collect_image_urls(root: &Element<'_>, filter: &ImageFilter, resolver: &UrlResolver) -> Vec<String> {
    root.descendants_named(&["img"])
        .iter()
        .filter_map(|img| ImageRef::from_element(img, filter, resolver))
        .map(|image| image.src)
        .collect()
}

/// File extension of the URL's path, including the dot. `.png` when the path
/// has none.
pub fn image_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    let file_name = path.rsplit('/').next().unwrap_or_default();
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();

    match file_name[stem_start..].rfind('.') {
        Some(dot) => file_name[stem_start + dot..].to_string(),
        None => DEFAULT_EXTENSION.to_string(),
    }
}

/// Replaces every `](old_url)` link target with `](new_path)`.
pub fn rewrite_image_reference(markdown: &str, old_url: &str, new_path: &str) -> String {
    markdown.replace(&format!("]({})", old_url), &format!("]({})", new_path))
}

/// Downloads one article's images and points its Markdown at them.
pub struct ImageLocalizer<'a, F, R> {
    fetcher: &'a F,
    store: &'a ArchiveStore,
    reporter: &'a R,
    folder_name: &'a str,
    timeout: Duration,
    delay: Duration,
    verbose: bool,
}

impl<'a, F: Fetcher, R: Reporter> ImageLocalizer<'a, F, R> {
    pub fn new(config: &'a ExtractionConfig, fetcher: &'a F, store: &'a ArchiveStore, reporter: &'a R) -> Self {
        Self {
            fetcher,
            store,
            reporter,
            folder_name: &config.images_folder_name,
            timeout: config.timeout(),
            delay: config.image_delay(),
            verbose: config.verbose,
        }
    }

    /// Localizes `urls` for the article saved at `doc_path` inside
    /// `article_dir`. Returns how many images were downloaded.
    ///
    /// Per-image failures are reported and skipped; the reference keeps its
    /// remote URL. Only creating the images folder can fail the call.
    pub async fn localize(&self, urls: &[String], article_dir: &Path, doc_path: &Path) -> Result<usize> {
        if urls.is_empty() {
            return Ok(0);
        }

        let images_dir = article_dir.join(self.folder_name);
        std::fs::create_dir_all(&images_dir)?;

        let mut saved = 0;
        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let file_name = format!("image_{}{}", i + 1, image_extension(url));
            match self.download(url, &images_dir.join(&file_name)).await {
                Ok(path) => {
                    saved += 1;
                    if self.verbose {
                        self.reporter.image_saved(url, &path);
                    }
                    let local = format!("./{}/{}", self.folder_name, file_name);
                    if let Err(e) = self.rewrite(doc_path, url, &local) {
                        self.report_failure(url, &e);
                    }
                }
                Err(e) => self.report_failure(url, &e),
            }
        }

        tracing::debug!(saved, total = urls.len(), "Image localization finished");
        Ok(saved)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<PathBuf> {
        let bytes = self.fetcher.fetch_image(url, self.timeout).await?;
        self.store.write_bytes(path, &bytes)?;
        Ok(path.to_path_buf())
    }

    fn rewrite(&self, doc_path: &Path, url: &str, local: &str) -> Result<()> {
        let markdown = self.store.read_text(doc_path)?;
        self.store.write_text(doc_path, &rewrite_image_reference(&markdown, url, local))
    }

    fn report_failure(&self, url: &str, error: &HarvestError) {
        if self.verbose {
            self.reporter.image_failed(url, error);
        }
    }
}
