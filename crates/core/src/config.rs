//! Run configuration.
//!
//! [`ExtractionConfig`] holds every setting for one harvest run. It is built
//! once, either through [`ExtractionConfig::builder`], from a named preset, or
//! from a JSON file, and is never mutated afterwards.
//!
//! # Example
//!
//! ```rust
//! use webharvest_core::ExtractionConfig;
//!
//! let config = ExtractionConfig::builder()
//!     .base_url("https://example.com")
//!     .main_content_selector("article")
//!     .skip_selectors(["nav", ".sidebar"])
//!     .download_images(false)
//!     .build();
//! assert_eq!(config.main_content_selector, "article");
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{HarvestError, Result};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Names accepted by [`ExtractionConfig::preset`].
pub const PRESET_NAMES: &[&str] = &["golangstar", "generic_blog", "juejin", "aliyun_developer"];

/// Settings for a harvest run.
///
/// All fields are optional in the JSON form; missing fields take the
/// defaults listed below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Base URL for resolving relative links and image sources (default: empty).
    pub base_url: String,

    /// Directory the archive is written to (default: `extracted_articles`).
    pub output_dir: PathBuf,

    /// Selector for the main content element (default: `main`).
    pub main_content_selector: String,

    /// Selector used to derive a title when an input entry has none (default: `h1`).
    pub title_selector: String,

    /// Elements matching any of these (or inside one) are not emitted.
    pub skip_selectors: Vec<String>,

    /// Whether to download and localize images (default: true).
    pub download_images: bool,

    /// Case-insensitive substrings that exclude an image source.
    pub image_skip_keywords: Vec<String>,

    /// Per-article images subfolder (default: `imgs`).
    pub images_folder_name: String,

    /// Keep `strong`/`b` as `**bold**`.
    pub preserve_bold: bool,
    /// Keep `em`/`i` as `*italic*`.
    pub preserve_italic: bool,
    /// Keep inline `code` as backtick spans.
    pub preserve_code: bool,
    /// Keep `a` as `[text](href)`.
    pub preserve_links: bool,

    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,

    /// Pause between articles in seconds (default: 1.0).
    pub delay_secs: f64,

    /// Pause between image downloads in milliseconds (default: 300).
    pub image_delay_ms: u64,

    /// Headers sent with page requests. Image requests send none.
    pub headers: BTreeMap<String, String>,

    /// Encoding label for decoding pages and writing files (default: `utf-8`).
    pub file_encoding: String,

    /// Write a `README.md` index of the archive (default: true).
    pub create_index: bool,

    /// Emit per-image diagnostics (default: true).
    pub verbose: bool,

    /// Write `failed_urls.json` when anything failed (default: true).
    pub save_failed_urls: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            output_dir: PathBuf::from("extracted_articles"),
            main_content_selector: "main".to_string(),
            title_selector: "h1".to_string(),
            skip_selectors: strings(&["nav", "aside", "footer"]),
            download_images: true,
            image_skip_keywords: strings(&["icon", "avatar", "logo"]),
            images_folder_name: "imgs".to_string(),
            preserve_bold: true,
            preserve_italic: true,
            preserve_code: true,
            preserve_links: true,
            timeout_secs: 30,
            delay_secs: 1.0,
            image_delay_ms: 300,
            headers: BTreeMap::from([("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())]),
            file_encoding: "utf-8".to_string(),
            create_index: true,
            verbose: true,
            save_failed_urls: true,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ExtractionConfig {
    /// Creates a new builder for ExtractionConfig.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::new()
    }

    /// Returns a builder seeded with this configuration.
    pub fn to_builder(&self) -> ExtractionConfigBuilder {
        ExtractionConfigBuilder { config: self.clone() }
    }

    /// Looks up a named preset for a known site layout.
    ///
    /// Returns `None` for unknown names; see [`PRESET_NAMES`].
    pub fn preset(name: &str) -> Option<Self> {
        let builder = Self::builder();
        let config = match name {
            "golangstar" => builder
                .base_url("https://golangstar.cn")
                .main_content_selector("main")
                .title_selector("h1")
                .skip_selectors(["nav", "aside", "footer", ".VPDocFooter", ".VPSidebar"])
                .image_skip_keywords(["icon", "avatar"]),
            "generic_blog" => builder
                .main_content_selector("article")
                .title_selector("h1")
                .skip_selectors(["nav", "aside", "footer", "header"]),
            "juejin" => builder
                .base_url("https://juejin.cn")
                .main_content_selector("article")
                .title_selector("h1.article-title")
                .skip_selectors(["nav", "aside", "footer", ".author-info"]),
            "aliyun_developer" => builder
                .base_url("https://developer.aliyun.com")
                .main_content_selector(".article-content")
                .title_selector("h1")
                .skip_selectors(["nav", "aside", "footer", "header", ".comment", ".related", ".author-info"])
                .image_skip_keywords(["icon", "avatar", "logo", "qrcode"]),
            _ => return None,
        };
        Some(config.build())
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(invalid_config)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarvestError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Overlays the fields present in a JSON object onto this configuration.
    ///
    /// Fields missing from `json` keep their current values, so a file can
    /// refine a preset without restating it.
    pub fn merge_json(&self, json: &str) -> Result<Self> {
        let overrides: serde_json::Value = serde_json::from_str(json).map_err(invalid_config)?;
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(HarvestError::ConfigError("Invalid config: expected a JSON object".to_string()));
        };

        let mut merged = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut merged {
            fields.extend(overrides);
        }
        serde_json::from_value(merged).map_err(invalid_config)
    }

    /// [`merge_json`](Self::merge_json) with the contents of a file.
    pub fn merge_file<P: AsRef<Path>>(&self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarvestError::FileNotFound(path.to_path_buf()));
        }
        self.merge_json(&fs::read_to_string(path)?)
    }

    /// Default config file location (`~/.config/webharvest/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("webharvest").join("config.json"))
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pause between articles. Negative or non-finite values mean no pause.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }

    /// Pause between image downloads.
    pub fn image_delay(&self) -> Duration {
        Duration::from_millis(self.image_delay_ms)
    }
}

fn invalid_config(e: serde_json::Error) -> HarvestError {
    HarvestError::ConfigError(format!("Invalid config: {}", e))
}

/// Builder for ExtractionConfig.
///
/// Provides a fluent API over the defaults.
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractionConfig::default() }
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.base_url = value.into();
        self
    }

    pub fn output_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.config.output_dir = value.into();
        self
    }

    pub fn main_content_selector(mut self, value: impl Into<String>) -> Self {
        self.config.main_content_selector = value.into();
        self
    }

    pub fn title_selector(mut self, value: impl Into<String>) -> Self {
        self.config.title_selector = value.into();
        self
    }

    /// Replaces the skip selector list.
    pub fn skip_selectors<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.skip_selectors = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn download_images(mut self, value: bool) -> Self {
        self.config.download_images = value;
        self
    }

    /// Replaces the image skip keyword list.
    pub fn image_skip_keywords<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.image_skip_keywords = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn images_folder_name(mut self, value: impl Into<String>) -> Self {
        self.config.images_folder_name = value.into();
        self
    }

    pub fn preserve_bold(mut self, value: bool) -> Self {
        self.config.preserve_bold = value;
        self
    }

    pub fn preserve_italic(mut self, value: bool) -> Self {
        self.config.preserve_italic = value;
        self
    }

    pub fn preserve_code(mut self, value: bool) -> Self {
        self.config.preserve_code = value;
        self
    }

    pub fn preserve_links(mut self, value: bool) -> Self {
        self.config.preserve_links = value;
        self
    }

    pub fn timeout_secs(mut self, value: u64) -> Self {
        self.config.timeout_secs = value;
        self
    }

    pub fn delay_secs(mut self, value: f64) -> Self {
        self.config.delay_secs = value;
        self
    }

    pub fn image_delay_ms(mut self, value: u64) -> Self {
        self.config.image_delay_ms = value;
        self
    }

    /// Sets (or overrides) one request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn file_encoding(mut self, value: impl Into<String>) -> Self {
        self.config.file_encoding = value.into();
        self
    }

    pub fn create_index(mut self, value: bool) -> Self {
        self.config.create_index = value;
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    pub fn save_failed_urls(mut self, value: bool) -> Self {
        self.config.save_failed_urls = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractionConfig {
        self.config
    }
}

impl Default for ExtractionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.main_content_selector, "main");
        assert_eq!(config.skip_selectors, vec!["nav", "aside", "footer"]);
        assert_eq!(config.image_skip_keywords, vec!["icon", "avatar", "logo"]);
        assert_eq!(config.images_folder_name, "imgs");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.image_delay(), Duration::from_millis(300));
        assert!(config.headers.contains_key("User-Agent"));
    }

    #[test]
    fn test_list_defaults_are_independent() {
        let mut a = ExtractionConfig::default();
        let b = ExtractionConfig::default();
        a.skip_selectors.push(".ads".to_string());
        assert_eq!(b.skip_selectors.len(), 3);
    }

    #[test]
    fn test_builder() {
        let config = ExtractionConfig::builder()
            .base_url("https://example.com")
            .skip_selectors(["nav"])
            .preserve_links(false)
            .header("Accept", "text/html")
            .build();

        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.skip_selectors, vec!["nav"]);
        assert!(!config.preserve_links);
        assert_eq!(config.headers.len(), 2);
    }

    #[test]
    fn test_presets() {
        for name in PRESET_NAMES {
            assert!(ExtractionConfig::preset(name).is_some(), "missing preset {}", name);
        }
        let aliyun = ExtractionConfig::preset("aliyun_developer").unwrap();
        assert_eq!(aliyun.main_content_selector, ".article-content");
        assert!(aliyun.image_skip_keywords.contains(&"qrcode".to_string()));
        assert!(ExtractionConfig::preset("nope").is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ExtractionConfig::from_json(r#"{"main_content_selector": "article", "delay_secs": 0.5}"#).unwrap();
        assert_eq!(config.main_content_selector, "article");
        assert_eq!(config.delay(), Duration::from_millis(500));
        assert_eq!(config.title_selector, "h1");
    }

    #[test]
    fn test_from_json_invalid() {
        let result = ExtractionConfig::from_json("{not json");
        assert!(matches!(result, Err(HarvestError::ConfigError(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = ExtractionConfig::from_file("/nonexistent/webharvest.json");
        assert!(matches!(result, Err(HarvestError::FileNotFound(_))));
    }

    #[test]
    fn test_merge_json_keeps_unset_fields() {
        let juejin = ExtractionConfig::preset("juejin").unwrap();
        let merged = juejin.merge_json(r#"{"download_images": false, "output_dir": "out"}"#).unwrap();

        assert!(!merged.download_images);
        assert_eq!(merged.output_dir, PathBuf::from("out"));
        assert_eq!(merged.title_selector, "h1.article-title");
        assert_eq!(merged.base_url, "https://juejin.cn");
    }

    #[test]
    fn test_merge_json_rejects_non_object() {
        let result = ExtractionConfig::default().merge_json("[1, 2]");
        assert!(matches!(result, Err(HarvestError::ConfigError(_))));

        let result = ExtractionConfig::default().merge_json(r#"{"timeout_secs": "soon"}"#);
        assert!(matches!(result, Err(HarvestError::ConfigError(_))));
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let config = ExtractionConfig::builder().delay_secs(-1.0).build();
        assert_eq!(config.delay(), Duration::ZERO);
    }
}
