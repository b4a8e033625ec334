//! On-disk archive layout.
//!
//! Every article lives in `<output_dir>/<name>/<name>.md`, where `<name>` is the
//! sanitized title; downloaded images sit next to it in the images subfolder.
//! Text files are written in the configured encoding.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;

use crate::article::FailedArticle;
use crate::formatters::markdown::MarkdownDocument;
use crate::{HarvestError, Result};

const MAX_FILENAME_CHARS: usize = 200;

/// File name of the failure list at the archive root.
pub const FAILED_URLS_FILE: &str = "failed_urls.json";

/// File name of the archive index.
pub const INDEX_FILE: &str = "README.md";

static RESERVED_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

/// Makes a title safe to use as a file or folder name.
///
/// Each of `< > : " / \ | ? *` becomes `_`, the result is cut to 200
/// characters, then surrounding whitespace is trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let replaced = RESERVED_CHARS.replace_all(name, "_");
    let truncated: String = replaced.chars().take(MAX_FILENAME_CHARS).collect();
    truncated.trim().to_string()
}

/// Encoder/decoder for the configured text encoding.
///
/// Reading and writing always use the same encoding, so a saved article can be
/// read back and rewritten losslessly.
#[derive(Debug, Clone, Copy)]
pub struct TextCodec {
    encoding: &'static Encoding,
}

impl TextCodec {
    /// Looks up a WHATWG encoding label. Unknown labels fall back to UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] for encodings that encoding_rs
    /// cannot write in their own form (UTF-16LE, UTF-16BE, replacement).
    pub fn for_label(label: &str) -> Result<Self> {
        let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
            tracing::warn!("Unknown encoding '{}', using UTF-8", label);
            return Ok(Self::default());
        };
        if encoding.output_encoding() != encoding {
            return Err(HarvestError::ConfigError(format!(
                "Encoding '{}' cannot be used for output files",
                encoding.name()
            )));
        }
        Ok(Self { encoding })
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            tracing::debug!("Malformed {} input replaced during decoding", self.name());
        }
        text.into_owned()
    }

    /// # Errors
    ///
    /// Returns [`HarvestError::WriteError`] if `text` holds characters the
    /// encoding cannot represent.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let (bytes, _, had_unmappable) = self.encoding.encode(text);
        if had_unmappable {
            return Err(HarvestError::WriteError(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("text contains characters not representable in {}", self.name()),
            )));
        }
        Ok(bytes.into_owned())
    }
}

impl Default for TextCodec {
    fn default() -> Self {
        Self { encoding: UTF_8 }
    }
}

/// Filesystem side of a harvest run.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
    codec: TextCodec,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>, codec: TextCodec) -> Self {
        Self { root: root.into(), codec }
    }

    pub fn codec(&self) -> TextCodec {
        self.codec
    }

    /// Creates the output directory if it does not exist.
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// `<root>/<sanitized title>`
    pub fn article_dir(&self, title: &str) -> PathBuf {
        self.root.join(sanitize_filename(title))
    }

    /// `<root>/<sanitized title>/<sanitized title>.md`
    pub fn markdown_path(&self, title: &str) -> PathBuf {
        let name = sanitize_filename(title);
        self.root.join(&name).join(format!("{}.md", name))
    }

    /// Writes an article's Markdown, creating its folder. Returns the file path.
    pub fn write_article(&self, title: &str, doc: &MarkdownDocument) -> Result<PathBuf> {
        let dir = self.article_dir(title);
        fs::create_dir_all(&dir)?;
        let path = self.markdown_path(title);
        self.write_text(&path, &doc.render())?;
        Ok(path)
    }

    pub fn read_text(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(HarvestError::FileNotFound(path.to_path_buf()));
        }
        Ok(self.codec.decode(&fs::read(path)?))
    }

    pub fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, self.codec.encode(text)?)?;
        Ok(())
    }

    pub fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Writes the failure list as a pretty-printed JSON array.
    pub fn write_failed_urls(&self, failed: &[FailedArticle]) -> Result<PathBuf> {
        let path = self.root.join(FAILED_URLS_FILE);
        let json = serde_json::to_string_pretty(failed)?;
        self.write_text(&path, &json)?;
        Ok(path)
    }

    /// Writes `README.md` listing every article folder, sorted by name, linked
    /// to the first `.md` file inside it.
    pub fn write_index(&self) -> Result<PathBuf> {
        let mut folders: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        folders.sort();

        let mut content = String::from("# Extracted Articles Index\n\n");
        content.push_str(&format!("Total: {} articles\n\n", folders.len()));
        content.push_str("## Articles\n\n");

        for (i, folder) in folders.iter().enumerate() {
            if let Some(md_file) = self.first_markdown_file(&self.root.join(folder))? {
                content.push_str(&format!("{}. [{}](./{}/{})\n", i + 1, folder, folder, md_file));
            }
        }

        let path = self.root.join(INDEX_FILE);
        self.write_text(&path, &content)?;
        Ok(path)
    }

    fn first_markdown_file(&self, dir: &Path) -> Result<Option<String>> {
        let mut files: Vec<String> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".md"))
            .collect();
        files.sort();
        Ok(files.into_iter().next())
    }
}
