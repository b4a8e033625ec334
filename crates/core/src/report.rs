//! Progress reporting.
//!
//! The harvest loop never prints. It calls a [`Reporter`] supplied by the
//! caller; every method has a no-op default so reporters only implement what
//! they show. [`TracingReporter`] forwards everything to `tracing`.

use std::path::Path;

use crate::HarvestError;
use crate::article::ExtractionResult;

pub trait Reporter {
    fn run_started(&self, _total: usize) {}

    fn article_started(&self, _index: usize, _total: usize, _title: &str) {}

    fn article_saved(&self, _title: &str, _path: &Path) {}

    fn article_failed(&self, _title: &str, _error: &HarvestError) {}

    fn images_found(&self, _title: &str, _count: usize) {}

    fn image_saved(&self, _url: &str, _path: &Path) {}

    fn image_failed(&self, _url: &str, _error: &HarvestError) {}

    /// A run-level file (failure list or index) was written.
    fn file_written(&self, _path: &Path) {}

    fn run_finished(&self, _result: &ExtractionResult) {}
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn run_started(&self, total: usize) {
        (**self).run_started(total)
    }

    fn article_started(&self, index: usize, total: usize, title: &str) {
        (**self).article_started(index, total, title)
    }

    fn article_saved(&self, title: &str, path: &Path) {
        (**self).article_saved(title, path)
    }

    fn article_failed(&self, title: &str, error: &HarvestError) {
        (**self).article_failed(title, error)
    }

    fn images_found(&self, title: &str, count: usize) {
        (**self).images_found(title, count)
    }

    fn image_saved(&self, url: &str, path: &Path) {
        (**self).image_saved(url, path)
    }

    fn image_failed(&self, url: &str, error: &HarvestError) {
        (**self).image_failed(url, error)
    }

    fn file_written(&self, path: &Path) {
        (**self).file_written(path)
    }

    fn run_finished(&self, result: &ExtractionResult) {
        (**self).run_finished(result)
    }
}

/// Reporter that emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn run_started(&self, total: usize) {
        tracing::info!(total, "Starting extraction");
    }

    fn article_started(&self, index: usize, total: usize, title: &str) {
        tracing::info!("[{}/{}] Processing: {}", index, total, title);
    }

    fn article_saved(&self, title: &str, path: &Path) {
        tracing::info!(title, path = %path.display(), "Saved article");
    }

    fn article_failed(&self, title: &str, error: &HarvestError) {
        tracing::warn!(title, "Article failed: {}", error);
    }

    fn images_found(&self, title: &str, count: usize) {
        tracing::info!(title, count, "Downloading images");
    }

    fn image_saved(&self, url: &str, path: &Path) {
        tracing::debug!(url, path = %path.display(), "Saved image");
    }

    fn image_failed(&self, url: &str, error: &HarvestError) {
        tracing::warn!(url, "Image download failed: {}", error);
    }

    fn file_written(&self, path: &Path) {
        tracing::info!(path = %path.display(), "Wrote file");
    }

    fn run_finished(&self, result: &ExtractionResult) {
        tracing::info!(
            success = result.success_count,
            failed = result.fail_count,
            "Extraction complete"
        );
    }
}

/// Reporter that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}
