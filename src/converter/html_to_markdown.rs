//! Core HTML→Markdown transform (`spec.md` §4.6): pre-pass string cleanup,
//! `html2md::parse_html_custom` with the custom link/code handlers, and the
//! post-pass regex cleanups, with a plain-text fallback on catastrophic
//! transform failure.
//!
//! Grounded in the teacher's
//! `content_saver/markdown_converter/html_to_markdown.rs`, replacing its
//! `parse_html` + generic cleanup with the exact rule set `spec.md` names.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use html2md::TagHandlerFactory;
use regex::Regex;
use scraper::Html;

use super::custom_handlers::{CodeLanguageHandlerFactory, LinkHandlerFactory};

static PIPE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^.*\|.*$\n?").expect("PIPE_LINE: hardcoded regex is valid"));

static MARKDOWN_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\([_\\`'])").expect("MARKDOWN_ESCAPE: hardcoded regex is valid"));

static EXCESSIVE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("EXCESSIVE_NEWLINES: hardcoded regex is valid"));

static ESCAPED_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\\[([^\]]*)\\\]\\\(([^)]*)\\\)")
        .expect("ESCAPED_LINK: hardcoded regex is valid")
});

static UNSUPPORTED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|iframe|noscript|canvas|svg)\b[^>]*>.*?</\1\s*>")
        .expect("UNSUPPORTED_TAG: hardcoded regex is valid")
});

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("IMG_TAG: hardcoded regex is valid"));

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bsrc\s*=\s*["']([^"']*)["']"#).expect("IMG_SRC: hardcoded regex is valid")
});

const PLACEHOLDER_PATTERNS: &[&str] =
    &["blank.gif", "placeholder", "spacer", "1x1.gif", "pixel", "transparent"];

/// Pre-pass on the raw HTML string: strip pipe-bearing lines and unescape
/// `\_`, `\\`, `` \` ``, `\'` left over from upstream processing.
pub fn pre_pass(html: &str) -> String {
    let stripped = PIPE_LINE.replace_all(html, "");
    MARKDOWN_ESCAPE.replace_all(&stripped, "$1").into_owned()
}

/// Drop `<script>`, `<style>`, `<iframe>`, `<noscript>`, `<canvas>`, `<svg>`
/// outright, and either strip all `<img>` tags (`remove_images=true`) or
/// just the ones pointing at known tracking-pixel / placeholder sources.
pub fn strip_unsupported_and_placeholder_images(html: &str, remove_images: bool) -> String {
    let without_unsupported = UNSUPPORTED_TAG.replace_all(html, "");

    if remove_images {
        return IMG_TAG.replace_all(&without_unsupported, "").into_owned();
    }

    IMG_TAG
        .replace_all(&without_unsupported, |caps: &regex::Captures| {
            let whole = &caps[0];
            let src = IMG_SRC.captures(whole).and_then(|c| c.get(1)).map(|m| m.as_str());
            match src {
                None => String::new(),
                Some(src) if src.trim().is_empty() => String::new(),
                Some(src) => {
                    let lower = src.to_lowercase();
                    if PLACEHOLDER_PATTERNS.iter().any(|p| lower.contains(p)) {
                        String::new()
                    } else {
                        whole.to_string()
                    }
                }
            }
        })
        .into_owned()
}

fn custom_handlers() -> HashMap<String, Box<dyn TagHandlerFactory>> {
    let mut handlers: HashMap<String, Box<dyn TagHandlerFactory>> = HashMap::new();
    handlers.insert("a".to_string(), Box::new(LinkHandlerFactory));
    handlers.insert("pre".to_string(), Box::new(CodeLanguageHandlerFactory));
    handlers.insert("code".to_string(), Box::new(CodeLanguageHandlerFactory));
    handlers.insert("samp".to_string(), Box::new(CodeLanguageHandlerFactory));
    handlers
}

/// Runs the core transform, treating a panic inside `html2md` as the
/// "catastrophic transform failure" `spec.md` §4.6 names, returning `None`
/// in that case so the caller can fall back to plain text.
pub fn try_parse_to_markdown(html: &str) -> Option<String> {
    let handlers = custom_handlers();
    panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html_custom(html, &handlers))).ok()
}

/// Replace tables with more than 20 rows with a single blank line; leaves
/// smaller tables as the core transform emitted them.
pub fn drop_large_tables(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let is_header = is_table_row(lines[i]);
        let is_separator = lines.get(i + 1).is_some_and(|l| is_table_separator(l));

        if is_header && is_separator {
            let start = i;
            let mut j = i + 2;
            while j < lines.len() && is_table_row(lines[j]) {
                j += 1;
            }
            let row_count = j - (start + 2);
            if row_count > 20 {
                out.push(String::new());
            } else {
                out.extend(lines[start..j].iter().map(|s| s.to_string()));
            }
            i = j;
        } else {
            out.push(lines[i].to_string());
            i += 1;
        }
    }

    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 1
}

fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    is_table_row(trimmed)
        && trimmed.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Post-pass: collapse 3+ newlines to 2, drop any residual pipe-bearing
/// lines, and fix escaped link syntax `\[…\](…)` → `[…](…)`.
pub fn post_pass(markdown: &str) -> String {
    let no_pipes = PIPE_LINE.replace_all(markdown, "");
    let fixed_links = ESCAPED_LINK.replace_all(&no_pipes, "[$1]($2)");
    EXCESSIVE_NEWLINES.replace_all(&fixed_links, "\n\n").trim().to_string()
}

/// Catastrophic-failure fallback: extracted plain text with whitespace
/// normalized.
pub fn plain_text_fallback(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_pass_strips_pipe_bearing_lines() {
        let html = "<p>keep</p>\n<p>| a | b |</p>";
        let cleaned = pre_pass(html);
        assert!(cleaned.contains("keep"));
        assert!(!cleaned.contains('|'));
    }

    #[test]
    fn pre_pass_unescapes_markdown_escapes() {
        let cleaned = pre_pass(r"\_emph\_ and \`code\`");
        assert_eq!(cleaned, "_emph_ and `code`");
    }

    #[test]
    fn strips_script_and_style_tags_entirely() {
        let html = "<script>evil()</script><style>.x{}</style><p>keep</p>";
        let cleaned = strip_unsupported_and_placeholder_images(html, false);
        assert!(!cleaned.contains("evil"));
        assert!(!cleaned.contains(".x{}"));
        assert!(cleaned.contains("keep"));
    }

    #[test]
    fn drops_placeholder_images_but_keeps_real_ones() {
        let html = r#"<img src="tracking/pixel.gif"><img src="photo.jpg">"#;
        let cleaned = strip_unsupported_and_placeholder_images(html, false);
        assert!(!cleaned.contains("pixel.gif"));
        assert!(cleaned.contains("photo.jpg"));
    }

    #[test]
    fn remove_images_strips_every_img_tag() {
        let html = r#"<img src="photo.jpg">"#;
        let cleaned = strip_unsupported_and_placeholder_images(html, true);
        assert!(!cleaned.contains("img"));
    }

    #[test]
    fn drop_large_tables_replaces_tables_over_twenty_rows() {
        let header = "| a | b |\n|---|---|\n";
        let rows: String = (0..25).map(|i| format!("| {i} | x |\n")).collect();
        let markdown = format!("before\n{header}{rows}after");
        let cleaned = drop_large_tables(&markdown);
        assert!(cleaned.contains("before"));
        assert!(cleaned.contains("after"));
        assert!(!cleaned.contains("| 0 |"));
    }

    #[test]
    fn small_tables_survive_unchanged() {
        let markdown = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        let cleaned = drop_large_tables(markdown);
        assert!(cleaned.contains("| 1 | 2 |"));
    }

    #[test]
    fn post_pass_collapses_newlines_and_fixes_escaped_links() {
        let markdown = r"a\n\n\n\nb \[text\]\(http://x\)".replace(r"\n", "\n");
        let cleaned = post_pass(&markdown);
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.contains("[text](http://x)"));
    }

    #[test]
    fn plain_text_fallback_normalizes_whitespace() {
        let text = plain_text_fallback("<p>hello   \n  world</p>");
        assert_eq!(text, "hello world");
    }
}
