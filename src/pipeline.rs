//! Single-URL Pipeline (`spec.md` §4.7): `convert(url, options) -> Artifact`,
//! including the dynamic-content fallback ladder and the transient-error
//! retry policy.
//!
//! Grounded structurally in the teacher's
//! `crawl_engine/page_processor.rs::process_single_page` (page
//! create→navigate→extract→convert→record), generalized away from its
//! circuit-breaker gating to the exact ladder and retry policy `spec.md`
//! specifies (see `DESIGN.md` for why the circuit breaker is not carried
//! forward).

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::browser::{BrowserCollaborator, PageHandle};
use crate::cache::{self, Cache};
use crate::cleaner;
use crate::config::ConversionOptions;
use crate::converter;
use crate::error::Sf4aiError;
use crate::metadata::{self, PageMetadata};
use crate::model::Artifact;
use crate::rules::RULES;

pub struct PipelineDeps<B: BrowserCollaborator> {
    pub browser: Arc<B>,
    pub cache: Arc<Cache>,
    pub page_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct Richness {
    text_length: usize,
    #[allow(dead_code)]
    element_count: usize,
}

const RICHNESS_SCRIPT: &str = r#"
(() => ({
    text_length: (document.body.innerText || "").length,
    element_count: document.body.getElementsByTagName("*").length,
}))()
"#;

const BODY_HTML_SCRIPT: &str = "document.body.innerHTML";

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Step 1: prepend `https://` when the URL has no scheme; reject anything
/// still unparsable as `InvalidInput`.
fn validate_url(raw: &str) -> Result<String, Sf4aiError> {
    if url::Url::parse(raw).is_ok() {
        return Ok(raw.to_string());
    }
    let with_scheme = format!("https://{raw}");
    url::Url::parse(&with_scheme)
        .map(|_| with_scheme)
        .map_err(|e| Sf4aiError::InvalidInput(format!("malformed URL {raw:?}: {e}")))
}

pub async fn convert<B: BrowserCollaborator + 'static>(
    url: &str,
    options: &ConversionOptions,
    deps: &PipelineDeps<B>,
) -> Result<Artifact, Sf4aiError>
where
    B::Page: 'static,
{
    let url = validate_url(url)?;
    let fingerprint = cache::fingerprint(&url, &options.target_selectors, &options.remove_selectors);

    if !options.no_cache
        && let Some(cached) = deps.cache.get(&fingerprint).await
    {
        info!(url, "cache hit");
        return Ok(cached);
    }

    let mut last_error = None;
    for attempt in 0..=deps.max_retries {
        match try_once(&url, options, deps).await {
            Ok(artifact) => {
                if !options.no_cache {
                    deps.cache.set(&fingerprint, artifact.clone()).await;
                }
                return Ok(artifact);
            }
            Err(e) if e.is_transient() && attempt < deps.max_retries => {
                warn!(url, attempt, error = %e, "transient error, retrying");
                tokio::time::sleep(deps.retry_delay).await;
                last_error = Some(e);
            }
            Err(e) => {
                last_error = Some(e);
                break;
            }
        }
    }

    let error = last_error.expect("loop always runs at least once and records an error on exit");

    if !options.no_cache
        && let Some(cached) = deps.cache.get(&fingerprint).await
    {
        warn!(url, error = %error, "conversion failed, serving cached artifact as emergency fallback");
        return Ok(cached);
    }

    Err(error)
}

/// One attempt through the fallback ladder, on its own fresh page(s).
/// Releases every page it acquires, on every exit path.
async fn try_once<B: BrowserCollaborator + 'static>(
    url: &str,
    options: &ConversionOptions,
    deps: &PipelineDeps<B>,
) -> Result<Artifact, Sf4aiError>
where
    B::Page: 'static,
{
    let page = acquire_and_navigate(url, deps).await?;
    let stage0 = run_stage(&page, deps, options, url, ScrollMode::Conditional, options.aggressive_cleaning).await;
    page.release().await;

    let content = match stage0 {
        Ok(content) if content.markdown.len() >= options.min_content_length => {
            return Ok(content.into_artifact(url));
        }
        Ok(content) => Some(content),
        Err(e) => return Err(e),
    };

    let page = acquire_and_navigate(url, deps).await?;
    let stage1 = run_stage(&page, deps, options, url, ScrollMode::Unconditional, true).await;
    page.release().await;

    let best = match stage1 {
        Ok(c) if c.markdown.len() >= options.min_content_length => return Ok(c.into_artifact(url)),
        Ok(c) => Some(c),
        Err(_) => content,
    };

    let page = acquire_and_navigate(url, deps).await?;
    let stage2 = run_stage(&page, deps, options, url, ScrollMode::Unconditional, false).await;
    page.release().await;

    match stage2 {
        Ok(c) => Ok(c.into_artifact(url)),
        Err(_) => best.map(|c| c.into_artifact(url)).ok_or_else(|| {
            Sf4aiError::ConverterError("all fallback stages failed to produce output".to_string())
        }),
    }
}

struct StageOutput {
    markdown: String,
    metadata: PageMetadata,
}

impl StageOutput {
    fn into_artifact(self, url: &str) -> Artifact {
        let formatted = metadata::format_metadata(&self.metadata);
        Artifact {
            url: url.to_string(),
            metadata: formatted.clone(),
            markdown: Artifact::compose(url, &formatted, &self.markdown),
            timestamp: chrono::Utc::now(),
        }
    }
}

enum ScrollMode {
    Conditional,
    Unconditional,
}

async fn acquire_and_navigate<B: BrowserCollaborator + 'static>(
    url: &str,
    deps: &PipelineDeps<B>,
) -> Result<PageHandle<B>, Sf4aiError>
where
    B::Page: 'static,
{
    let raw_page = deps.browser.acquire_page().await?;
    let page = PageHandle::new(deps.browser.clone(), raw_page);
    deps.browser.navigate(page.page(), url, deps.page_timeout).await?;
    wait_for_content(&page, deps).await?;
    Ok(page)
}

/// Step 3 tail: poll `document.body.innerHTML.length > 0` until the page
/// timeout elapses.
async fn wait_for_content<B: BrowserCollaborator>(
    page: &PageHandle<B>,
    deps: &PipelineDeps<B>,
) -> Result<(), Sf4aiError> {
    let deadline = Instant::now() + deps.page_timeout;
    loop {
        let value = deps.browser.evaluate(page.page(), BODY_HTML_SCRIPT).await?;
        let length = value.as_str().map(str::len).unwrap_or(0);
        if length > 0 {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Sf4aiError::NavigationError("Navigation timeout".to_string()));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn run_stage<B: BrowserCollaborator>(
    page: &PageHandle<B>,
    deps: &PipelineDeps<B>,
    options: &ConversionOptions,
    url: &str,
    scroll_mode: ScrollMode,
    aggressive_cleaning: bool,
) -> Result<StageOutput, Sf4aiError> {
    let richness: Value = deps.browser.evaluate(page.page(), RICHNESS_SCRIPT).await?;
    let richness: Richness = serde_json::from_value(richness)
        .map_err(|e| Sf4aiError::NavigationError(format!("failed to decode richness probe: {e}")))?;

    let should_scroll = match scroll_mode {
        ScrollMode::Conditional => richness.text_length < options.min_content_length,
        ScrollMode::Unconditional => true,
    };

    if should_scroll {
        deps.browser.evaluate(page.page(), SCROLL_SCRIPT).await?;
        tokio::time::sleep(Duration::from_millis(options.scroll_wait_ms)).await;
    }

    let body_html: Value = deps.browser.evaluate(page.page(), BODY_HTML_SCRIPT).await?;
    let body_html = body_html.as_str().unwrap_or_default();

    let mut stage_options = options.clone();
    stage_options.aggressive_cleaning = aggressive_cleaning;

    let cleaned = cleaner::clean(body_html, &stage_options, &RULES);
    let markdown = converter::convert(&cleaned, &stage_options);
    let page_metadata = metadata::extract(deps.browser.as_ref(), page).await.unwrap_or_else(|e| {
        warn!(url, error = %e, "metadata extraction failed, continuing without it");
        PageMetadata::default()
    });

    Ok(StageOutput { markdown, metadata: page_metadata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_prepends_scheme_when_missing() {
        assert_eq!(validate_url("example.com/page").unwrap(), "https://example.com/page");
    }

    #[test]
    fn validate_url_keeps_explicit_scheme() {
        assert_eq!(validate_url("http://example.com").unwrap(), "http://example.com");
    }

    #[test]
    fn validate_url_rejects_unparsable_input() {
        assert!(validate_url("  not a url at all \t\n").is_err());
    }
}
