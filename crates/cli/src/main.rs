use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::Parser;
use clap::builder::PossibleValuesParser;
use tracing_subscriber::EnvFilter;
use url::Url;
use webharvest_core::{
    ArticleRef, ExtractionConfig, Harvester, HttpFetcher, PRESET_NAMES, fetch_file, fetch_stdin, parse_article_list,
};

mod echo;

use echo::{ConsoleReporter, print_banner, print_info, print_summary};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Archive a list of web articles as Markdown with local images
#[derive(Parser, Debug)]
#[command(name = "webharvest")]
#[command(author = "Webharvest Contributors")]
#[command(version)]
#[command(about = "Archive a list of web articles as Markdown with local images", long_about = None)]
struct Args {
    /// JSON file with [{"title": ..., "url": ...}] entries, or "-" for stdin
    #[arg(value_name = "ARTICLES")]
    articles: String,

    /// Output directory (default: extracted_articles)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// JSON config file (default: ~/.config/webharvest/config.json if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start from a site preset
    #[arg(long, value_name = "NAME", value_parser = PossibleValuesParser::new(PRESET_NAMES.iter().copied()))]
    preset: Option<String>,

    /// Base URL for resolving relative links and images
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// CSS selector for the main content element
    #[arg(long, value_name = "SEL")]
    content_selector: Option<String>,

    /// CSS selector used to derive missing titles
    #[arg(long, value_name = "SEL")]
    title_selector: Option<String>,

    /// Additional CSS selector to skip (repeatable)
    #[arg(long = "skip", value_name = "SEL")]
    skip: Vec<String>,

    /// Additional image source keyword to skip (repeatable)
    #[arg(long = "skip-image", value_name = "KEYWORD")]
    skip_image: Vec<String>,

    /// Keep remote image references instead of downloading
    #[arg(long)]
    no_images: bool,

    /// Name of the per-article images folder
    #[arg(long, value_name = "NAME")]
    images_folder: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Pause between articles in seconds
    #[arg(long, value_name = "SECS")]
    delay: Option<f64>,

    /// Custom User-Agent for page requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Encoding for decoding pages and writing files
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Do not write README.md
    #[arg(long)]
    no_index: bool,

    /// Do not write failed_urls.json
    #[arg(long)]
    no_failed_urls: bool,

    /// Only print failures and the summary
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Preset or defaults, then the config file, then flags.
    fn resolve_config(&self) -> anyhow::Result<ExtractionConfig> {
        let mut config = match &self.preset {
            Some(name) => ExtractionConfig::preset(name)
                .ok_or_else(|| anyhow!("Unknown preset '{}' (available: {})", name, PRESET_NAMES.join(", ")))?,
            None => ExtractionConfig::default(),
        };

        let config_file = self
            .config
            .clone()
            .or_else(|| ExtractionConfig::default_path().filter(|path| path.exists()));
        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "Loading config file");
            config = config
                .merge_file(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
        }

        let mut builder = config.to_builder();
        if let Some(output) = &self.output {
            builder = builder.output_dir(output);
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
            builder = builder.base_url(base_url);
        }
        if let Some(selector) = &self.content_selector {
            builder = builder.main_content_selector(selector);
        }
        if let Some(selector) = &self.title_selector {
            builder = builder.title_selector(selector);
        }
        if !self.skip.is_empty() {
            builder = builder.skip_selectors(config.skip_selectors.iter().chain(&self.skip));
        }
        if !self.skip_image.is_empty() {
            builder = builder.image_skip_keywords(config.image_skip_keywords.iter().chain(&self.skip_image));
        }
        if self.no_images {
            builder = builder.download_images(false);
        }
        if let Some(folder) = &self.images_folder {
            builder = builder.images_folder_name(folder);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout_secs(timeout);
        }
        if let Some(delay) = self.delay {
            builder = builder.delay_secs(delay);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.header("User-Agent", user_agent);
        }
        if let Some(encoding) = &self.encoding {
            builder = builder.file_encoding(encoding);
        }
        if self.no_index {
            builder = builder.create_index(false);
        }
        if self.no_failed_urls {
            builder = builder.save_failed_urls(false);
        }
        if self.quiet {
            builder = builder.verbose(false);
        }
        if self.verbose {
            builder = builder.verbose(true);
        }

        Ok(builder.build())
    }
}

/// `RUST_LOG` wins; otherwise `-v` shows debug events and `-q` only errors.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "webharvest_core=debug,webharvest=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_articles(input: &str) -> anyhow::Result<Vec<ArticleRef>> {
    let json = if input == "-" {
        fetch_stdin().context("Failed to read from stdin")?
    } else {
        fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?
    };
    parse_article_list(&json).with_context(|| format!("Invalid article list: {}", input))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = args.resolve_config()?;
    let articles = read_articles(&args.articles)?;

    if !args.quiet {
        print_banner();
        print_info(&format!("Output directory: {}", config.output_dir.display()));
    }

    let fetcher = HttpFetcher::new().context("Failed to build HTTP client")?;
    let harvester = Harvester::new(config, fetcher, ConsoleReporter::new(args.quiet)).context("Invalid configuration")?;

    let started = Instant::now();
    let result = harvester.run(&articles).await.context("Extraction run failed")?;
    print_summary(&result, started.elapsed());

    Ok(())
}
