use crate::classify::UrlResolver;
use crate::config::ExtractionConfig;
use crate::parse::{Child, Element};

/// Which inline markups survive conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineOptions {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub links: bool,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self { bold: true, italic: true, code: true, links: true }
    }
}

impl From<&ExtractionConfig> for InlineOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            bold: config.preserve_bold,
            italic: config.preserve_italic,
            code: config.preserve_code,
            links: config.preserve_links,
        }
    }
}

/// Renders an element's children as inline Markdown.
///
/// Text is emitted verbatim, without escaping Markdown metacharacters.
/// Emphasis, code spans and link text use the flattened text of the marked-up
/// element, so markup nested inside them is dropped.
#[derive(Debug, Clone)]
pub struct InlineFormatter {
    options: InlineOptions,
    resolver: UrlResolver,
}

impl InlineFormatter {
    pub fn new(options: InlineOptions, resolver: UrlResolver) -> Self {
        Self { options, resolver }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(InlineOptions::from(config), UrlResolver::new(&config.base_url))
    }

    pub fn render_inline(&self, element: &Element<'_>) -> String {
        let mut out = String::new();
        self.render_into(element, &mut out);
        out
    }

    fn render_into(&self, element: &Element<'_>, out: &mut String) {
        for child in element.children() {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(el) => self.render_child(&el, out),
            }
        }
    }

    fn render_child(&self, el: &Element<'_>, out: &mut String) {
        match el.tag_name() {
            "strong" | "b" if self.options.bold => {
                out.push_str("**");
                out.push_str(&el.text());
                out.push_str("**");
            }
            "em" | "i" if self.options.italic => {
                out.push('*');
                out.push_str(&el.text());
                out.push('*');
            }
            "code" if self.options.code => {
                out.push('`');
                out.push_str(&el.text());
                out.push('`');
            }
            "a" if self.options.links => {
                let href = self.resolver.resolve_href(el.attr("href").unwrap_or_default());
                out.push_str(&format!("[{}]({})", el.text(), href));
            }
            _ => self.render_into(el, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{Document, compile_selector};

    fn render(html: &str, options: InlineOptions) -> String {
        let doc = Document::parse(html).unwrap();
        let p = doc.select_first(&compile_selector("p").unwrap()).unwrap();
        InlineFormatter::new(options, UrlResolver::new("https://example.com")).render_inline(&p)
    }

    #[test]
    fn test_plain_text_verbatim() {
        assert_eq!(render("<p>2 * 3 = 6_</p>", InlineOptions::default()), "2 * 3 = 6_");
    }

    #[test]
    fn test_each_kind() {
        let options = InlineOptions::default();
        assert_eq!(render("<p><strong>bold</strong></p>", options), "**bold**");
        assert_eq!(render("<p><b>bold</b></p>", options), "**bold**");
        assert_eq!(render("<p><em>it</em></p>", options), "*it*");
        assert_eq!(render("<p><i>it</i></p>", options), "*it*");
        assert_eq!(render("<p><code>x()</code></p>", options), "`x()`");
        assert_eq!(
            render(r#"<p><a href="/docs">docs</a></p>"#, options),
            "[docs](https://example.com/docs)"
        );
    }

    #[test]
    fn test_composition_in_order() {
        let html = r##"<p><strong>B</strong><em>I</em><code>C</code><a href="#x">L</a></p>"##;
        assert_eq!(render(html, InlineOptions::default()), "**B***I*`C`[L](#x)");
    }

    #[test]
    fn test_nested_markup_is_flattened() {
        let html = r#"<p><strong>very <em>bold</em></strong></p>"#;
        assert_eq!(render(html, InlineOptions::default()), "**very bold**");
    }

    #[test]
    fn test_unknown_wrappers_recurse() {
        let html = r#"<p>Go <span>to <a href="https://rust-lang.org">Rust</a></span>!</p>"#;
        assert_eq!(render(html, InlineOptions::default()), "Go to [Rust](https://rust-lang.org)!");
    }

    #[test]
    fn test_disabled_flags_fall_back_to_content() {
        let options = InlineOptions { bold: false, italic: false, code: false, links: false };
        let html = r#"<p><b>a</b><i>b</i><code>c</code><a href="/d">d</a></p>"#;
        assert_eq!(render(html, options), "abcd");
    }

    #[test]
    fn test_link_without_href() {
        assert_eq!(render("<p><a>anchor</a></p>", InlineOptions::default()), "[anchor]()");
    }

    #[test]
    fn test_render_is_idempotent() {
        let doc = Document::parse("<p>x <b>y</b></p>").unwrap();
        let p = doc.select_first(&compile_selector("p").unwrap()).unwrap();
        let formatter = InlineFormatter::from_config(&ExtractionConfig::default());
        assert_eq!(formatter.render_inline(&p), formatter.render_inline(&p));
    }
}
