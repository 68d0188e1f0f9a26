//! Reduce list items to plain text.

use itertools::Itertools;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose boundaries separate words even when the markup has no
/// whitespace there, as in `<li>outer<ul><li>inner</li></ul></li>`.
const BLOCK_ELEMENTS: &[&str] = &[
    "ul", "ol", "li", "dl", "dt", "dd", "p", "div", "br", "table", "tr", "td", "blockquote",
];

fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Concatenate text nodes, collapse whitespace runs to one space and trim.
pub fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().join(" ")
}

/// Plain text of a list item with citation markers removed.
///
/// The item is re-parsed into its own fragment and citations are detached
/// from that copy, leaving the source document untouched. Returns `None`
/// when nothing but citations and whitespace was left.
pub fn normalize_item(item: ElementRef<'_>, citation: &Selector) -> Option<String> {
    let mut fragment = Html::parse_fragment(&item.html());

    let citations: Vec<_> = fragment.select(citation).map(|el| el.id()).collect();
    for id in citations {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    // Inline markup joins directly so CJK text stays unbroken across links.
    let mut parts: Vec<&str> = Vec::new();
    let mut at_block_start = false;
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Element(el) if is_block(el.name()) => at_block_start = true,
            Node::Text(text) => {
                let after_block = node
                    .prev_sibling()
                    .and_then(|prev| prev.value().as_element())
                    .is_some_and(|el| is_block(el.name()));
                if at_block_start || after_block {
                    parts.push(" ");
                }
                parts.push(text);
                at_block_start = false;
            }
            _ => {}
        }
    }

    let text = collapse_whitespace(parts.into_iter());
    (!text.is_empty()).then_some(text)
}
