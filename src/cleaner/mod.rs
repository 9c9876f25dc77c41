//! Cleaner (`spec.md` §4.5): the five-step DOM-pruning pipeline over
//! `document.body.innerHTML`, producing sanitized HTML.
//!
//! Grounded in the teacher's
//! `content_saver/markdown_converter/html_preprocessing/html_cleaning.rs`:
//! the same `scraper`/`ego_tree` NodeId-based removal-set-then-reserialize
//! approach, generalized to the exact rule table `spec.md` names. Runs
//! entirely in pure Rust over a string already fetched from the page once
//! (see `SPEC_FULL.md` §4.5 for why this satisfies the spec's own
//! "text-node-only traversal is an optimization, not a contract" escape
//! hatch).

mod serialize;

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::warn;

use crate::config::ConversionOptions;
use crate::rules::{RulesStore, RULES};

/// Every removal step is individually defensive (`spec.md` §4.5: "a failure
/// inside the page must not abort cleaning; log and continue"). In this
/// pure-Rust implementation the analogous failure is an unparsable selector,
/// which is skipped rather than propagated.
fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(selector = raw, error = %e, "skipping unparsable selector during cleaning");
            None
        }
    }
}

fn case_insensitive_contains_selector(substring: &str) -> String {
    format!(r#"[class*="{substring}" i], [id*="{substring}" i]"#)
}

pub fn clean(body_html: &str, options: &ConversionOptions, rules: &RulesStore) -> String {
    // Step 0: fast path.
    if !options.aggressive_cleaning {
        return body_html.to_string();
    }

    let isolated = isolate_content(body_html, &options.target_selectors);
    let removed = remove_elements(&isolated, options, rules);
    let swept = sweep_empty_elements(&removed);
    normalize_text(&swept, rules)
}

/// Step 1: content isolation. If `targetSelectors` match nothing, skip
/// replacement rather than erase content.
fn isolate_content(body_html: &str, target_selectors: &[String]) -> String {
    if target_selectors.is_empty() {
        return body_html.to_string();
    }

    let document = Html::parse_fragment(body_html);
    let mut isolated = String::new();
    let mut matched_any = false;

    for raw_selector in target_selectors {
        let Some(selector) = parse_selector(raw_selector) else { continue };
        for element in document.select(&selector) {
            matched_any = true;
            isolated.push_str(&element.html());
        }
    }

    if matched_any { isolated } else { body_html.to_string() }
}

/// Steps 2-3: removal pass (a)-(f) plus image preservation/hoisting.
fn remove_elements(body_html: &str, options: &ConversionOptions, rules: &RulesStore) -> String {
    let document = Html::parse_fragment(body_html);
    let root = document.root_element();

    let mut structural_selectors: Vec<Selector> = Vec::new();
    for tag in &rules.header_footer_tags {
        if let Some(s) = parse_selector(tag) {
            structural_selectors.push(s);
        }
    }
    for class in &rules.header_footer_classes {
        if let Some(s) = parse_selector(&format!(".{class}")) {
            structural_selectors.push(s);
        }
    }
    for id in &rules.header_footer_ids {
        if let Some(s) = parse_selector(&format!("#{id}")) {
            structural_selectors.push(s);
        }
    }
    for substring in &rules.contains_in_class_or_id {
        if let Some(s) = parse_selector(&case_insensitive_contains_selector(substring)) {
            structural_selectors.push(s);
        }
    }
    for raw in &rules.cookies_consent {
        if let Some(s) = parse_selector(raw) {
            structural_selectors.push(s);
        }
    }

    let mut explicit_selectors: Vec<Selector> = Vec::new();
    for raw in &options.remove_selectors {
        if let Some(s) = parse_selector(raw) {
            explicit_selectors.push(s);
        }
    }

    let mut to_remove: HashSet<ego_tree::NodeId> = HashSet::new();
    let mut explicit_image_removals: HashSet<ego_tree::NodeId> = HashSet::new();

    for selector in &structural_selectors {
        for element in root.select(selector) {
            to_remove.insert(element.id());
        }
    }
    for selector in &explicit_selectors {
        for element in root.select(selector) {
            to_remove.insert(element.id());
            if element.value().name() == "img" {
                explicit_image_removals.insert(element.id());
            }
        }
    }

    if options.remove_images {
        if let Some(img_selector) = parse_selector("img") {
            for element in root.select(&img_selector) {
                to_remove.insert(element.id());
                explicit_image_removals.insert(element.id());
            }
        }
    }

    let mut out = String::new();
    serialize::serialize_with_removal(
        &root,
        &to_remove,
        &explicit_image_removals,
        !options.remove_images,
        &mut out,
    );
    out
}

/// Step 4: depth-first empty-element sweep. `<img>` is never itself
/// considered empty — it carries no text/element children by nature, but
/// §4.5 step 4 forbids removing an image or any ancestor chain holding one.
/// An element with a surviving `<img>` descendant always has an element
/// child, so it is never considered empty either. Iterates to a fixpoint
/// since removing a leaf can empty out its parent.
fn sweep_empty_elements(body_html: &str) -> String {
    let mut current = body_html.to_string();

    for _ in 0..8 {
        let document = Html::parse_fragment(&current);
        let root = document.root_element();

        let mut to_remove: HashSet<ego_tree::NodeId> = HashSet::new();
        for element in root.descendants().filter_map(scraper::ElementRef::wrap) {
            if element.value().name() == "img" {
                continue;
            }
            let has_element_child = element.children().any(|c| c.value().is_element());
            let has_text = element.text().any(|t| !t.trim().is_empty());
            if !has_element_child && !has_text {
                to_remove.insert(element.id());
            }
        }

        if to_remove.is_empty() {
            return current;
        }

        let mut out = String::new();
        serialize::serialize_with_removal(&root, &to_remove, &HashSet::new(), false, &mut out);
        current = out;
    }

    current
}

/// Step 5: text normalization over remaining text nodes containing `|`,
/// `\`, or `_`. Applied at the string level rather than per text node,
/// which Design Note "text-node-only traversal is an optimization, not a
/// contract" explicitly permits.
fn normalize_text(body_html: &str, rules: &RulesStore) -> String {
    if !body_html.contains('|') && !body_html.contains('\\') && !body_html.contains('_') {
        return body_html.to_string();
    }

    let patterns = &rules.format_patterns;
    let mut text = patterns.any_table_line.replace_all(body_html, "").into_owned();
    text = patterns.function_calls_with_pipes.replace_all(&text, "").into_owned();
    text = patterns.pipe_with_dashes.replace_all(&text, "").into_owned();
    text = patterns.escape_chars.replace_all(&text, "").into_owned();
    text = patterns.trailing_backslashes.replace_all(&text, "").into_owned();
    patterns.excessive_newlines.replace_all(&text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConversionOptions {
        ConversionOptions {
            target_selectors: vec![],
            remove_selectors: vec![],
            aggressive_cleaning: true,
            remove_images: false,
            min_content_length: 500,
            scroll_wait_ms: 200,
            no_cache: false,
        }
    }

    #[test]
    fn fast_path_returns_input_unchanged_when_not_aggressive() {
        let mut opts = options();
        opts.aggressive_cleaning = false;
        let html = "<header>nav</header><p>body</p>";
        assert_eq!(clean(html, &opts, &RULES), html);
    }

    #[test]
    fn removes_header_footer_tags() {
        let opts = options();
        let html = "<header>nav</header><p>keep me</p><footer>bye</footer>";
        let cleaned = clean(html, &opts, &RULES);
        assert!(!cleaned.contains("nav"));
        assert!(!cleaned.contains("bye"));
        assert!(cleaned.contains("keep me"));
    }

    #[test]
    fn preserves_images_inside_removed_containers_by_default() {
        let opts = options();
        let html = r#"<header><img src="logo.png"></header><p>text</p>"#;
        let cleaned = clean(html, &opts, &RULES);
        assert!(cleaned.contains("logo.png"), "image must survive container removal");
    }

    #[test]
    fn remove_images_true_strips_images_outright() {
        let mut opts = options();
        opts.remove_images = true;
        let html = r#"<div><img src="a.png"><p>text</p></div>"#;
        let cleaned = clean(html, &opts, &RULES);
        assert!(!cleaned.contains("a.png"));
        assert!(cleaned.contains("text"));
    }

    #[test]
    fn content_isolation_skips_replacement_when_no_selector_matches() {
        let mut opts = options();
        opts.target_selectors = vec![".does-not-exist".to_string()];
        let html = "<p>original content</p>";
        let cleaned = clean(html, &opts, &RULES);
        assert!(cleaned.contains("original content"));
    }

    #[test]
    fn empty_element_sweep_removes_elements_with_no_content() {
        let opts = options();
        let html = "<p>keep</p><div></div><span>   </span>";
        let cleaned = clean(html, &opts, &RULES);
        assert!(cleaned.contains("keep"));
        assert!(!cleaned.contains("<div>"));
        assert!(!cleaned.contains("<span>"));
    }
}
