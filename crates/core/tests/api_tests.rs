//! Library API integration tests
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;
use webharvest_core::parse::compile_selector;
use webharvest_core::*;

const BASE: &str = "https://blog.example.com";

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(get_fixture_path(name)).unwrap()
}

/// Serves fixture pages and images from memory; anything else is a 404.
#[derive(Default)]
struct FixtureFetcher {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    headers_seen: Mutex<Vec<BTreeMap<String, String>>>,
}

impl Fetcher for FixtureFetcher {
    async fn fetch_page(&self, url: &str, _timeout: Duration, headers: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        self.headers_seen.lock().unwrap().push(headers.clone());
        self.pages
            .get(url)
            .map(|page| page.clone().into_bytes())
            .ok_or_else(|| HarvestError::HttpStatus { url: url.to_string(), status: 404 })
    }

    async fn fetch_image(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| HarvestError::HttpStatus { url: url.to_string(), status: 404 })
    }
}

fn config(out: &Path) -> ExtractionConfig {
    ExtractionConfig::builder()
        .base_url(BASE)
        .output_dir(out)
        .delay_secs(0.0)
        .image_delay_ms(0)
        .build()
}

fn run<F: Fetcher>(harvester: &Harvester<F, SilentReporter>, articles: &[ArticleRef]) -> ExtractionResult {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(harvester.run(articles))
        .unwrap()
}

#[test]
fn test_convert_fixture_blocks() {
    let html = fixture("blog_post.html");
    let doc = Document::parse(&html).unwrap();
    let root = doc.select_first(&compile_selector("main").unwrap()).unwrap();
    let converter = MarkdownConverter::new(&config(Path::new("unused"))).unwrap();

    let markdown = converter.convert(&root, "Pools", "https://blog.example.com/pools");
    let expected = vec![
        "# Pools",
        "> Source: [https://blog.example.com/pools](https://blog.example.com/pools)",
        "# Connection Pools in Go",
        "A pool keeps **idle connections** around so that requests do not pay the *handshake* cost.",
        "## Configuration",
        "Call `SetMaxOpenConns` before the first query. See [the docs](https://blog.example.com/docs/sql) or [limits](#limits).",
        "![Pool diagram](https://blog.example.com/static/pool-diagram.png)",
        "- Open a handle\n- Set `MaxIdle`",
        "```go\ndb.SetMaxOpenConns(10)\ndb.SetMaxIdleConns(5)\n```",
        "> Measure before tuning.\n> Then measure again.",
        "### Limits",
        "| Setting | Default |\n|---|---|\n| MaxOpen | 0 |\n| MaxIdle | 2 |",
    ];
    assert_eq!(markdown.blocks(), expected.as_slice());
    assert!(markdown.render().ends_with("| MaxIdle | 2 |\n"));
}

#[test]
fn test_convert_without_inline_markup() {
    let html = fixture("blog_post.html");
    let doc = Document::parse(&html).unwrap();
    let root = doc.select_first(&compile_selector("main").unwrap()).unwrap();
    let config = config(Path::new("unused"))
        .to_builder()
        .preserve_bold(false)
        .preserve_italic(false)
        .preserve_code(false)
        .preserve_links(false)
        .build();

    let markdown = MarkdownConverter::new(&config).unwrap().convert(&root, "Pools", "u");
    assert_eq!(
        markdown.blocks()[3],
        "A pool keeps idle connections around so that requests do not pay the handshake cost."
    );
    assert_eq!(
        markdown.blocks()[5],
        "Call SetMaxOpenConns before the first query. See the docs or limits."
    );
}

#[test]
fn test_harvest_fixture_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let mut fetcher = FixtureFetcher::default();
    fetcher
        .pages
        .insert(format!("{}/pools", BASE), fixture("blog_post.html"));
    fetcher
        .pages
        .insert(format!("{}/landing", BASE), fixture("no_main.html"));
    fetcher
        .images
        .insert(format!("{}/static/pool-diagram.png", BASE), vec![0x89, b'P', b'N', b'G']);

    let harvester = Harvester::new(config(tmp.path()), fetcher, SilentReporter).unwrap();
    let articles = vec![
        ArticleRef { title: None, url: Some(format!("{}/pools", BASE)) },
        ArticleRef::new("Landing", format!("{}/landing", BASE)),
        ArticleRef { title: Some("Unlinked".to_string()), url: None },
    ];
    let result = run(&harvester, &articles);

    assert_eq!(result.success_count, 1);
    assert_eq!(result.fail_count, 2);
    assert_eq!(result.failed_urls.len(), 2);
    assert_eq!(result.failed_urls[0].title, "Landing");

    let article_dir = tmp.path().join("Connection Pools in Go");
    let markdown = fs::read_to_string(article_dir.join("Connection Pools in Go.md")).unwrap();
    assert!(markdown.starts_with("# Connection Pools in Go\n\n> Source: "));
    assert!(markdown.contains("![Pool diagram](./imgs/image_1.png)"));
    assert!(!markdown.contains("avatar"));
    assert!(!markdown.contains("Related posts"));
    assert!(!markdown.contains("Written in 2024"));
    assert_eq!(fs::read(article_dir.join("imgs").join("image_1.png")).unwrap(), vec![0x89, b'P', b'N', b'G']);

    let index = fs::read_to_string(tmp.path().join("README.md")).unwrap();
    assert!(index.contains("Total: 1 articles"));
    assert!(index.contains("1. [Connection Pools in Go](./Connection Pools in Go/Connection Pools in Go.md)"));

    let failed: Vec<FailedArticle> =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("failed_urls.json")).unwrap()).unwrap();
    assert_eq!(failed, result.failed_urls);
}

#[test]
fn test_harvest_sends_configured_headers() {
    let tmp = TempDir::new().unwrap();
    let mut fetcher = FixtureFetcher::default();
    fetcher
        .pages
        .insert(format!("{}/pools", BASE), fixture("blog_post.html"));

    let config = config(tmp.path())
        .to_builder()
        .header("User-Agent", "webharvest-test")
        .download_images(false)
        .build();
    let harvester = Harvester::new(config, fetcher, SilentReporter).unwrap();
    let result = run(&harvester, &[ArticleRef::new("Pools", format!("{}/pools", BASE))]);
    assert_eq!(result.success_count, 1);

    let headers = harvester.fetcher().headers_seen.lock().unwrap();
    assert_eq!(headers[0]["User-Agent"], "webharvest-test");

    let markdown = fs::read_to_string(tmp.path().join("Pools").join("Pools.md")).unwrap();
    assert!(markdown.contains("![Pool diagram](https://blog.example.com/static/pool-diagram.png)"));
    assert!(!tmp.path().join("Pools").join("imgs").exists());
}

#[test]
fn test_harvest_encodes_output() {
    let tmp = TempDir::new().unwrap();
    let page = "<main><p>中文内容</p></main>";
    let codec = TextCodec::for_label("gbk").unwrap();

    let harvester = Harvester::new(
        config(tmp.path()).to_builder().file_encoding("gbk").build(),
        GbkFetcher { body: codec.encode(page).unwrap() },
        SilentReporter,
    )
    .unwrap();
    let result = run(&harvester, &[ArticleRef::new("文章", format!("{}/gbk", BASE))]);
    assert_eq!(result.success_count, 1);

    let bytes = fs::read(tmp.path().join("文章").join("文章.md")).unwrap();
    assert!(codec.decode(&bytes).contains("中文内容"));
    assert!(String::from_utf8(bytes).is_err());
}

#[test]
fn test_harvest_unrepresentable_text_fails_article() {
    let tmp = TempDir::new().unwrap();
    let page = "<main><p>中文</p><pre><code>let s = \"&#128512;\";</code></pre></main>";
    let codec = TextCodec::for_label("gbk").unwrap();

    let harvester = Harvester::new(
        config(tmp.path()).to_builder().file_encoding("gbk").build(),
        GbkFetcher { body: codec.encode(page).unwrap() },
        SilentReporter,
    )
    .unwrap();
    let result = run(&harvester, &[ArticleRef::new("表情", format!("{}/emoji", BASE))]);

    assert_eq!(result.success_count, 0);
    assert_eq!(result.fail_count, 1);
    assert!(!tmp.path().join("表情").join("表情.md").exists());
}

#[test]
fn test_harvest_rejects_utf16_output() {
    let tmp = TempDir::new().unwrap();
    let config = config(tmp.path()).to_builder().file_encoding("utf-16le").build();
    assert!(matches!(
        Harvester::new(config, FixtureFetcher::default(), SilentReporter),
        Err(HarvestError::ConfigError(_))
    ));
}

/// Returns the same pre-encoded body for every page.
struct GbkFetcher {
    body: Vec<u8>,
}

impl Fetcher for GbkFetcher {
    async fn fetch_page(&self, _url: &str, _timeout: Duration, _headers: &BTreeMap<String, String>) -> Result<Vec<u8>> {
        Ok(self.body.clone())
    }

    async fn fetch_image(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
        Err(HarvestError::HttpStatus { url: url.to_string(), status: 404 })
    }
}

#[test]
fn test_presets_compile() {
    for name in PRESET_NAMES {
        let config = ExtractionConfig::preset(name).unwrap();
        assert!(
            Harvester::new(config, FixtureFetcher::default(), SilentReporter).is_ok(),
            "preset {} has an invalid selector",
            name
        );
    }
}

#[test]
fn test_sanitized_titles() {
    assert_eq!(sanitize_filename("Q&A: what/why?"), "Q&A_ what_why_");
}
