//! Passage extraction from lookup-page markup.
//!
//! The page is parsed with an HTML5 tree builder, so optional end tags
//! (`</p>`, `</li>`, `</body>`) and other lenient markup resolve the way a
//! browser resolves them. The first element carrying the `passage-text` class
//! is the container; its visible text is the text nodes in document order,
//! with block elements and `<br>` ending a line.
//!
//! No cleanup happens here; see [`crate::clean`].

use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use thiserror::Error;

/// Class that marks the element holding the rendered passage.
pub const PASSAGE_CLASS: &str = "passage-text";

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "ul", "table", "tr", "blockquote",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!(".{}", PASSAGE_CLASS)).unwrap());

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page has no '{PASSAGE_CLASS}' element")]
    MissingContainer,
}

/// Extract the raw visible text of the passage container.
pub fn extract_passage(html: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    let container = document
        .select(&CONTAINER)
        .next()
        .ok_or(ExtractError::MissingContainer)?;

    let mut out = String::new();
    collect_text(container, &mut out);
    Ok(out)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
                if BLOCK_ELEMENTS.contains(&name) && !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
