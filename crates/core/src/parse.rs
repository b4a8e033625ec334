//! HTML parsing and DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types, thin wrappers
//! over `scraper` that expose the handful of queries the converter needs:
//! first match for a selector, descendants by tag set, direct children,
//! ancestor matching and child iteration that separates text from elements.
//!
//! # Example
//!
//! ```rust
//! use webharvest_core::parse::{Document, compile_selector};
//!
//! let html = r#"<main><h1>Title</h1><p class="content">Paragraph</p></main>"#;
//! let doc = Document::parse(html).unwrap();
//! let main = doc.select_first(&compile_selector("main").unwrap()).unwrap();
//! assert_eq!(main.descendants_named(&["h1", "p"]).len(), 2);
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{HarvestError, Result};

/// Compiles a CSS selector.
///
/// # Errors
///
/// Returns [`HarvestError::HtmlParseError`] if the selector is invalid.
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::HtmlParseError(format!("Invalid selector '{}': {}", selector, e)))
}

/// Represents a parsed HTML document.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup still yields a document.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Returns the first element matching `selector` in document order.
    pub fn select_first(&self, selector: &Selector) -> Option<Element<'_>> {
        self.html.select(selector).next().map(Element::from)
    }

    /// Selects elements using a CSS selector string.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).map(Element::from).collect())
    }
}

/// A direct child of an element.
#[derive(Debug, Clone)]
pub enum Child<'a> {
    /// A text node, verbatim.
    Text(&'a str),
    /// An element node.
    Element(Element<'a>),
}

/// A wrapper around scraper's ElementRef.
///
/// Every query is read-only; the tree is never modified.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl<'a> Element<'a> {
    /// Gets the tag name of this element (lowercase for HTML documents).
    pub fn tag_name(&self) -> &'a str {
        self.element.value().name()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Iterates over the class tokens of this element.
    pub fn classes(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.element.value().classes()
    }

    /// Concatenation of every descendant text node.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Direct children in document order. Comments and other non-content
    /// nodes are left out.
    pub fn children(&self) -> impl Iterator<Item = Child<'a>> + 'a {
        self.element.children().filter_map(|node| match node.value() {
            Node::Text(text) => Some(Child::Text(&**text)),
            Node::Element(_) => ElementRef::wrap(node).map(|el| Child::Element(Element::from(el))),
            _ => None,
        })
    }

    /// Direct element children with the given tag name.
    pub fn child_elements(&self, tag: &'a str) -> impl Iterator<Item = Element<'a>> + 'a {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(move |el| el.value().name() == tag)
            .map(Element::from)
    }

    /// Every descendant element (not this one) whose tag is in `tags`, in
    /// document order.
    pub fn descendants_named(&self, tags: &[&str]) -> Vec<Element<'a>> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| tags.contains(&el.value().name()))
            .map(Element::from)
            .collect()
    }

    /// First descendant element with the given tag name.
    pub fn find(&self, tag: &str) -> Option<Element<'a>> {
        self.element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == tag)
            .map(Element::from)
    }

    /// Number of nodes in the subtree rooted here, this node included.
    pub fn subtree_len(&self) -> usize {
        self.element.descendants().count()
    }

    /// Does `selector` match this element itself?
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.element)
    }

    /// Does `selector` match any ancestor, up to the document root?
    pub fn has_ancestor_matching(&self, selector: &Selector) -> bool {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| selector.matches(&el))
    }

    /// Does `selector` match any descendant (this element excluded)?
    pub fn has_descendant_matching(&self, selector: &Selector) -> bool {
        self.element.select(selector).next().is_some()
    }

    /// Selects descendant elements using a compiled selector.
    pub fn select_first(&self, selector: &Selector) -> Option<Element<'a>> {
        self.element.select(selector).next().map(Element::from)
    }

    /// Access to the wrapped scraper element.
    pub fn as_element_ref(&self) -> ElementRef<'a> {
        self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head><title>Test Page</title></head>
        <body>
            <nav><a href="/">Home</a></nav>
            <main>
                <h1>Heading</h1>
                <p class="content">Paragraph <b>1</b><!-- hidden --></p>
                <ul><li>One<ul><li>Nested</li></ul></li><li>Two</li></ul>
            </main>
        </body>
        </html>
    "#;

    fn main_of(doc: &Document) -> Element<'_> {
        doc.select_first(&compile_selector("main").unwrap()).unwrap()
    }

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let title = doc.select_first(&compile_selector("title").unwrap()).unwrap();
        assert_eq!(title.text(), "Test Page");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert!(matches!(doc.select("[[invalid"), Err(HarvestError::HtmlParseError(_))));
        assert!(compile_selector("p..x").is_err());
    }

    #[test]
    fn test_descendants_named_in_document_order() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tags: Vec<&str> = main_of(&doc)
            .descendants_named(&["h1", "p", "ul"])
            .iter()
            .map(|el| el.tag_name())
            .collect();
        assert_eq!(tags, vec!["h1", "p", "ul", "ul"]);
    }

    #[test]
    fn test_children_skip_comments() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let p = main_of(&doc).find("p").unwrap();
        let children: Vec<Child<'_>> = p.children().collect();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Child::Text("Paragraph ")));
        assert!(matches!(&children[1], Child::Element(el) if el.tag_name() == "b"));
    }

    #[test]
    fn test_child_elements_direct_only() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let ul = main_of(&doc).find("ul").unwrap();
        assert_eq!(ul.child_elements("li").count(), 2);
        assert_eq!(ul.descendants_named(&["li"]).len(), 3);
    }

    #[test]
    fn test_ancestor_and_descendant_matching() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let nav = compile_selector("nav").unwrap();
        let body = compile_selector("body").unwrap();
        let home = doc.select("a").unwrap()[0];
        assert!(home.has_ancestor_matching(&nav));

        let main = main_of(&doc);
        assert!(!main.has_ancestor_matching(&nav));
        assert!(main.has_ancestor_matching(&body));
        assert!(!main.has_descendant_matching(&nav));
        assert!(main.has_descendant_matching(&compile_selector("b").unwrap()));
    }

    #[test]
    fn test_subtree_len_counts_self() {
        let doc = Document::parse("<main><p>a</p></main>").unwrap();
        let p = main_of(&doc).find("p").unwrap();
        assert_eq!(p.subtree_len(), 2);
    }
}
