pub mod article;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod formatters;
pub mod harvest;
pub mod images;
pub mod parse;
pub mod report;
pub mod storage;

pub use article::{ArticleRef, ExtractionResult, FailedArticle, parse_article_list};
pub use classify::{ImageFilter, SkipFilter, UrlResolver};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, PRESET_NAMES};
pub use error::{HarvestError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use fetch::{Fetcher, fetch_file, fetch_stdin, validate_headers};
pub use formatters::{BlockKind, InlineFormatter, InlineOptions, MarkdownConverter, MarkdownDocument};
pub use harvest::{ExtractedArticle, Harvester};
pub use images::{ImageLocalizer, ImageRef, collect_image_urls};
pub use parse::Document;
pub use report::{Reporter, SilentReporter, TracingReporter};
pub use storage::{ArchiveStore, TextCodec, sanitize_filename};
