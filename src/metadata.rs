//! Metadata Extractor (`spec.md` §4.4): a pure function over a loaded page
//! that reads title, description meta tags, `og:*` tags, `<html lang>`,
//! canonical link, and publication meta tags, returning a stable formatted
//! block. Grounded in the teacher's
//! `page_extractor/{extractors.rs,js_scripts.rs}::METADATA_SCRIPT` pattern.

use serde::Deserialize;
use serde_json::Value;

use crate::browser::{BrowserCollaborator, PageHandle};
use crate::error::Sf4aiError;

const METADATA_SCRIPT: &str = r#"
(() => {
    const meta = {};
    document.querySelectorAll('meta').forEach(tag => {
        const name = tag.getAttribute('name') || tag.getAttribute('property');
        if (name) {
            meta[name] = tag.getAttribute('content');
        }
    });

    return {
        title: document.title || null,
        description: meta['description'] || meta['og:description'] || null,
        og_title: meta['og:title'] || null,
        og_type: meta['og:type'] || null,
        og_image: meta['og:image'] || null,
        author: meta['author'] || meta['og:author'] || null,
        published_date: meta['article:published_time'] || meta['publishedDate'] || null,
        modified_date: meta['article:modified_time'] || meta['modifiedDate'] || null,
        language: document.documentElement.lang || null,
        canonical_url: document.querySelector('link[rel="canonical"]')?.href || null,
    };
})()
"#;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_type: Option<String>,
    pub og_image: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    pub modified_date: Option<String>,
    pub language: Option<String>,
    pub canonical_url: Option<String>,
}

pub async fn extract<B: BrowserCollaborator>(
    browser: &B,
    page: &PageHandle<B>,
) -> Result<PageMetadata, Sf4aiError> {
    let value: Value = browser.evaluate(page.page(), METADATA_SCRIPT).await?;
    serde_json::from_value(value)
        .map_err(|e| Sf4aiError::NavigationError(format!("failed to decode page metadata: {e}")))
}

/// Stable, human-readable block used verbatim in the final artifact header
/// (`spec.md` §4.4: "prefixed `Title:`, `Description:`, etc.").
pub fn format_metadata(metadata: &PageMetadata) -> String {
    let mut lines = Vec::new();
    if let Some(title) = &metadata.title {
        lines.push(format!("Title: {title}"));
    }
    if let Some(description) = &metadata.description {
        lines.push(format!("Description: {description}"));
    }
    if let Some(author) = &metadata.author {
        lines.push(format!("Author: {author}"));
    }
    if let Some(language) = &metadata.language {
        lines.push(format!("Language: {language}"));
    }
    if let Some(canonical) = &metadata.canonical_url {
        lines.push(format!("Canonical URL: {canonical}"));
    }
    if let Some(published) = &metadata.published_date {
        lines.push(format!("Published: {published}"));
    }
    if let Some(modified) = &metadata.modified_date {
        lines.push(format!("Modified: {modified}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_metadata_emits_stable_prefixed_lines() {
        let metadata = PageMetadata {
            title: Some("Example".to_string()),
            description: Some("An example page".to_string()),
            language: Some("en".to_string()),
            ..Default::default()
        };
        let formatted = format_metadata(&metadata);
        assert!(formatted.starts_with("Title: Example"));
        assert!(formatted.contains("Description: An example page"));
        assert!(formatted.contains("Language: en"));
    }

    #[test]
    fn missing_fields_are_simply_omitted() {
        let formatted = format_metadata(&PageMetadata::default());
        assert!(formatted.is_empty());
    }
}
