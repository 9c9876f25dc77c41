//! Recursive HTML re-serializer that skips removed nodes and hoists
//! preserved images into the nearest surviving ancestor, in document order.
//!
//! Adapted directly from the teacher's
//! `content_saver/markdown_converter/html_preprocessing/html_cleaning.rs::serialize_html_with_unwrap`,
//! generalized to additionally hoist `<img>` descendants out of a container
//! about to be dropped (`spec.md` §4.5 step 3: "Image preservation").

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img is a valid selector"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
}

fn serialize_element(element: &ElementRef, out: &mut String) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr_name, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr_name);
        out.push_str("=\"");
        for ch in value.chars() {
            match ch {
                '"' => out.push_str("&quot;"),
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                c => out.push(c),
            }
        }
        out.push('"');
    }
    out.push('>');
    if !VOID_ELEMENTS.contains(&name) {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

/// Serialize `element`'s children, skipping anything in `to_remove`. When
/// `hoist_images` is true, an `<img>` nested inside a removed subtree is
/// emitted in its place instead of being dropped, unless its own id is in
/// `explicit_image_removals` (it matched a `removeSelectors` entry
/// directly, per `spec.md` §8's "not removed by an explicit removeSelectors
/// match" carve-out).
pub fn serialize_with_removal(
    element: &ElementRef,
    to_remove: &HashSet<NodeId>,
    explicit_image_removals: &HashSet<NodeId>,
    hoist_images: bool,
    out: &mut String,
) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_text(text, out),
            Node::Element(_) => {
                let Some(child_elem) = ElementRef::wrap(child) else { continue };
                if to_remove.contains(&child_elem.id()) {
                    if hoist_images {
                        for img in child_elem.select(&IMG_SELECTOR) {
                            if !explicit_image_removals.contains(&img.id()) {
                                serialize_element(&img, out);
                            }
                        }
                    }
                    continue;
                }
                let name = child_elem.value().name();
                out.push('<');
                out.push_str(name);
                for (attr_name, value) in child_elem.value().attrs() {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    for ch in value.chars() {
                        match ch {
                            '"' => out.push_str("&quot;"),
                            '&' => out.push_str("&amp;"),
                            '<' => out.push_str("&lt;"),
                            '>' => out.push_str("&gt;"),
                            c => out.push(c),
                        }
                    }
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name) {
                    continue;
                }
                serialize_with_removal(
                    &child_elem,
                    to_remove,
                    explicit_image_removals,
                    hoist_images,
                    out,
                );
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Node::Comment(_) => {}
            _ => {}
        }
    }
}
