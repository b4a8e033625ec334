use std::collections::HashSet;
use std::fmt;

use crate::classify::{ImageFilter, SkipFilter, UrlResolver};
use crate::config::ExtractionConfig;
use crate::formatters::inline::InlineFormatter;
use crate::images::ImageRef;
use crate::parse::Element;
use crate::Result;

/// Tags that start a Markdown block.
pub const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "pre", "img", "blockquote", "table",
];

/// Block-level element kinds, keyed by tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    List,
    Preformatted,
    Image,
    Blockquote,
    Table,
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "p" => Self::Paragraph,
            "ul" | "ol" => Self::List,
            "pre" => Self::Preformatted,
            "img" => Self::Image,
            "blockquote" => Self::Blockquote,
            "table" => Self::Table,
            _ => return None,
        };
        Some(kind)
    }

    /// Containers render their whole subtree, so nested blocks must not be
    /// emitted again on their own.
    pub fn is_container(self) -> bool {
        matches!(self, Self::List | Self::Preformatted | Self::Blockquote | Self::Table)
    }
}

/// An article rendered as an ordered list of Markdown blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkdownDocument {
    blocks: Vec<String>,
}

impl MarkdownDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: impl Into<String>) {
        self.blocks.push(block.into());
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks separated by a blank line, with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = self.blocks.join("\n\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for MarkdownDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A block candidate with its pre-order position in the content subtree.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    index: usize,
    kind: BlockKind,
    element: Element<'a>,
}

/// Pre-order numbering of the content subtree, restricted to block candidates.
///
/// The root gets index 0. A node's descendants occupy the contiguous range
/// right after its own index, which is what lets a container mark its nested
/// candidates as consumed by index alone.
struct ContentIndex<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> ContentIndex<'a> {
    fn build(root: &Element<'a>) -> Self {
        let candidates = root
            .as_element_ref()
            .descendants()
            .enumerate()
            .skip(1)
            .filter_map(|(index, node)| {
                let element = scraper::ElementRef::wrap(node)?;
                let kind = BlockKind::from_tag(element.value().name())?;
                Some((index, kind, element))
            })
            .map(|(index, kind, element)| Candidate { index, kind, element: Element::from(element) })
            .collect();
        Self { candidates }
    }

    /// Candidates strictly inside `container`.
    fn nested_in(&self, container: &Candidate<'a>) -> impl Iterator<Item = &Candidate<'a>> {
        let start = container.index;
        let end = start + container.element.subtree_len();
        self.candidates.iter().filter(move |c| c.index > start && c.index < end)
    }
}

/// Indices already folded into an emitted block. Lives for one conversion.
#[derive(Debug, Default)]
struct ConsumedSet {
    indices: HashSet<usize>,
}

impl ConsumedSet {
    fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    fn insert(&mut self, index: usize) {
        self.indices.insert(index);
    }
}

/// Converts the main content subtree of an article into a [`MarkdownDocument`].
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    inline: InlineFormatter,
    skip: SkipFilter,
    images: ImageFilter,
    resolver: UrlResolver,
}

impl MarkdownConverter {
    /// Builds a converter from the run configuration.
    ///
    /// # Errors
    ///
    /// Fails if a skip selector does not parse.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            inline: InlineFormatter::from_config(config),
            skip: SkipFilter::new(&config.skip_selectors)?,
            images: ImageFilter::new(&config.image_skip_keywords),
            resolver: UrlResolver::new(&config.base_url),
        })
    }

    /// Walks `root` in document order and emits one block per unconsumed,
    /// non-skipped block element, after a title heading and a source line.
    pub fn convert(&self, root: &Element<'_>, title: &str, url: &str) -> MarkdownDocument {
        let mut doc = MarkdownDocument::new();
        doc.push(format!("# {}", title));
        doc.push(format!("> Source: [{}]({})", url, url));

        let index = ContentIndex::build(root);
        let mut consumed = ConsumedSet::default();

        for candidate in &index.candidates {
            if consumed.contains(candidate.index) || self.skip.should_skip(&candidate.element) {
                continue;
            }

            consumed.insert(candidate.index);
            if candidate.kind.is_container() {
                for nested in index.nested_in(candidate) {
                    consumed.insert(nested.index);
                }
            }

            if let Some(block) = self.convert_block(candidate.kind, &candidate.element) {
                doc.push(block);
            }
        }

        tracing::debug!(
            candidates = index.candidates.len(),
            blocks = doc.len() - 2,
            "Converted content to Markdown"
        );
        doc
    }

    fn convert_block(&self, kind: BlockKind, element: &Element<'_>) -> Option<String> {
        match kind {
            BlockKind::Heading(level) => Some(format!(
                "{} {}",
                "#".repeat(level as usize),
                self.inline.render_inline(element)
            )),
            BlockKind::Paragraph => non_empty(self.inline.render_inline(element).trim().to_string()),
            BlockKind::List => self.convert_list(element),
            BlockKind::Preformatted => convert_preformatted(element),
            BlockKind::Image => self.process_image(element),
            BlockKind::Blockquote => self.convert_blockquote(element),
            BlockKind::Table => convert_table(element),
        }
    }

    /// Emits `![alt](src)` for an image that passes the keyword filter.
    pub fn process_image(&self, img: &Element<'_>) -> Option<String> {
        ImageRef::from_element(img, &self.images, &self.resolver).map(|image| image.to_markdown())
    }

    /// Direct `li` children only; ordered lists also use `-`.
    fn convert_list(&self, list: &Element<'_>) -> Option<String> {
        let lines: Vec<String> = list
            .child_elements("li")
            .map(|li| format!("- {}", self.inline.render_inline(&li).trim()))
            .collect();
        non_empty(lines.join("\n"))
    }

    fn convert_blockquote(&self, quote: &Element<'_>) -> Option<String> {
        let text = self.inline.render_inline(quote);
        let lines: Vec<String> = text
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("> {}", line))
            .collect();
        non_empty(lines.join("\n"))
    }
}

/// Fenced code from the first `code` descendant; the body is not formatted.
fn convert_preformatted(pre: &Element<'_>) -> Option<String> {
    let code = pre.find("code")?;
    Some(format!("```{}\n{}\n```", code_language(&code), code.text()))
}

/// Language from the first `language-<lang>` class token.
pub fn code_language(code: &Element<'_>) -> String {
    code.classes()
        .find_map(|class| class.strip_prefix("language-"))
        .unwrap_or_default()
        .to_string()
}

/// Pipe table. Header from `thead`, rows from the first `tbody` or the table
/// itself. Column counts are not reconciled.
pub fn convert_table(table: &Element<'_>) -> Option<String> {
    let mut lines = Vec::new();

    if let Some(thead) = table.find("thead") {
        let headers = cell_texts(&thead);
        lines.push(table_row(&headers));
        lines.push(format!("|{}|", vec!["---"; headers.len()].join("|")));
    }

    let body = table.find("tbody").unwrap_or(*table);
    for tr in body.descendants_named(&["tr"]) {
        let cells = cell_texts(&tr);
        if !cells.is_empty() {
            lines.push(table_row(&cells));
        }
    }

    non_empty(lines.join("\n"))
}

fn cell_texts(element: &Element<'_>) -> Vec<String> {
    element
        .descendants_named(&["th", "td"])
        .iter()
        .map(|cell| cell.text().trim().to_string())
        .collect()
}

fn table_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn non_empty(block: String) -> Option<String> {
    if block.is_empty() { None } else { Some(block) }
}
