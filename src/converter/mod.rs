//! Markdown Converter (`spec.md` §4.6): pure HTML→Markdown transform plus
//! pre-/post-processing regex passes, with a plain-text fallback on
//! catastrophic transform failure.

mod custom_handlers;
mod html_to_markdown;

use crate::config::ConversionOptions;

/// Convert a cleaned HTML fragment to Markdown. Infallible by design — a
/// catastrophic failure inside the core transform degrades to extracted
/// plain text rather than propagating an error, per `spec.md` §4.6.
pub fn convert(html: &str, options: &ConversionOptions) -> String {
    let pre_passed = html_to_markdown::pre_pass(html);
    let sanitized = html_to_markdown::strip_unsupported_and_placeholder_images(
        &pre_passed,
        options.remove_images,
    );

    match html_to_markdown::try_parse_to_markdown(&sanitized) {
        Some(markdown) => {
            let tabled = html_to_markdown::drop_large_tables(&markdown);
            html_to_markdown::post_pass(&tabled)
        }
        None => html_to_markdown::plain_text_fallback(&sanitized),
    }
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
    fn converts_headings_and_links() {
        let html = r#"<h1>Title</h1><p>Visit <a href="/docs">the docs</a>.</p>"#;
        let markdown = convert(html, &options());
        assert!(markdown.contains("# Title"));
        assert!(markdown.contains("[the docs](/docs)"));
    }

    #[test]
    fn drops_empty_and_hash_anchors() {
        let html = r#"<p><a href="/a"></a> and <a href="/b">#</a></p>"#;
        let markdown = convert(html, &options());
        assert!(!markdown.contains("[#]"));
        assert!(!markdown.contains("[]("));
    }

    #[test]
    fn fences_code_blocks_with_language() {
        let html = r#"<pre><code class="language-rust">fn main() {}</code></pre>"#;
        let markdown = convert(html, &options());
        assert!(markdown.contains("```rust"));
    }

    #[test]
    fn strips_script_style_and_svg() {
        let html = "<script>bad()</script><svg><rect/></svg><p>text</p>";
        let markdown = convert(html, &options());
        assert!(!markdown.contains("bad()"));
        assert!(!markdown.contains("rect"));
        assert!(markdown.contains("text"));
    }

    #[test]
    fn remove_images_option_drops_image_markdown() {
        let html = r#"<p>before</p><img src="photo.jpg"><p>after</p>"#;
        let mut opts = options();
        opts.remove_images = true;
        let markdown = convert(html, &opts);
        assert!(!markdown.contains("photo.jpg"));
    }
}
