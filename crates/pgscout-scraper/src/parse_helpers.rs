//! DOM text primitives shared by the extractors and the replay surface.
//!
//! Everything here works on a parsed [`scraper::Html`] snapshot. `Html` is
//! not `Send`, so callers parse and query inside synchronous functions and
//! never hold a document across an `.await`.

use scraper::ElementRef;

use crate::normalize::collapse_whitespace;

/// Elements whose content the browser never renders as text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start and end a line in rendered text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Approximates `HTMLElement.innerText`: block elements become line breaks,
/// whitespace inside a line collapses to single spaces, empty lines vanish.
pub(crate) fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    walk(element, &mut raw);
    raw.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    let tag = element.value().name();
    if SKIPPED_TAGS.contains(&tag) {
        return;
    }
    let block = BLOCK_TAGS.contains(&tag);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
        } else if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, out);
        }
    }
    if block {
        out.push('\n');
    }
}

/// Whitespace-collapsed text content of an element on one line.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Nearest proper ancestor whose tag is in `tags`, else the parent element.
pub(crate) fn enclosing_container<'a>(
    element: ElementRef<'a>,
    tags: &[String],
) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| tags.iter().any(|tag| tag == ancestor.value().name()))
        .or_else(|| element.parent().and_then(ElementRef::wrap))
}
