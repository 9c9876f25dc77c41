//! Sitemap Reader (`SPEC_FULL.md` §4.2a, supplement): resolves a
//! [`Source`](crate::config::Source) into a flat list of URLs, parsing XML
//! sitemaps, sitemap indexes (recursing up to depth 3), and plain-text URL
//! lists.
//!
//! Grounded in `dIB59-seo/src-tauri/src/extractor/sitemap.rs`'s
//! `SitemapFormat` detect/extract split, extended with index recursion and
//! the Bounded Worker Group for concurrent sub-fetches.

use std::future::Future;
use std::pin::Pin;

use quick_xml::events::Event;
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::config::Source;
use crate::error::Sf4aiError;
use crate::worker;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const MAX_SITEMAP_INDEX_DEPTH: u32 = 3;
const MAX_CONCURRENT_SUB_FETCHES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SitemapFormat {
    Xml,
    PlainText,
}

impl SitemapFormat {
    fn detect(text: &str) -> Self {
        if text.contains("<loc>") || text.contains("<urlset") || text.contains("<sitemapindex") {
            SitemapFormat::Xml
        } else {
            SitemapFormat::PlainText
        }
    }
}

/// Resolve `source` into the deduplicated work queue the Job Orchestrator's
/// driver consumes (`SPEC_FULL.md` §2: "a deduplicated work queue"; `spec.md`
/// §3/§8: `total` and `urlState` must agree on the set of distinct URLs).
pub async fn read_source(source: &Source, client: &Client) -> Result<Vec<Url>, Sf4aiError> {
    let urls = match source {
        Source::Urls(urls) => urls.clone(),
        Source::Sitemap(url) => read_sitemap(url, client, 0).await?,
    };
    Ok(dedup_preserving_order(urls))
}

/// Order-preserving dedup, keyed on the URL's serialized string form.
fn dedup_preserving_order(urls: Vec<Url>) -> Vec<Url> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.to_string())).collect()
}

fn read_sitemap<'a>(
    url: &'a Url,
    client: &'a Client,
    depth: u32,
) -> BoxFuture<'a, Result<Vec<Url>, Sf4aiError>> {
    Box::pin(async move {
        let text = fetch(url, client).await?;

        if is_sitemap_index(&text) {
            if depth >= MAX_SITEMAP_INDEX_DEPTH {
                warn!(url = %url, depth, "sitemap index recursion depth cap reached, stopping");
                return Ok(Vec::new());
            }

            let sub_sitemaps = extract_locs(&text);
            let sub_urls: Vec<Url> =
                sub_sitemaps.iter().filter_map(|s| Url::parse(s).ok()).collect();

            let results = worker::run_bounded(sub_urls, MAX_CONCURRENT_SUB_FETCHES, {
                let client = client.clone();
                move |sub_url: Url| {
                    let client = client.clone();
                    async move { read_sitemap(&sub_url, &client, depth + 1).await }
                }
            })
            .await;

            let mut flattened = Vec::new();
            for result in results {
                if let Ok(urls) = result {
                    flattened.extend(urls);
                }
            }
            return Ok(flattened);
        }

        let format = SitemapFormat::detect(&text);
        let raw = match format {
            SitemapFormat::Xml => extract_locs(&text),
            SitemapFormat::PlainText => text.split_whitespace().map(|s| s.to_string()).collect(),
        };

        Ok(raw.iter().filter_map(|s| Url::parse(s).ok()).collect())
    })
}

async fn fetch(url: &Url, client: &Client) -> Result<String, Sf4aiError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Sf4aiError::NavigationError(format!("sitemap fetch failed: {e}")))?;
    response
        .text()
        .await
        .map_err(|e| Sf4aiError::NavigationError(format!("sitemap body read failed: {e}")))
}

fn is_sitemap_index(text: &str) -> bool {
    text.contains("<sitemapindex")
}

fn extract_locs(text: &str) -> Vec<String> {
    let mut reader = quick_xml::Reader::from_str(text);
    let mut locs = Vec::new();
    let mut buf = Vec::new();
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"loc" => in_loc = true,
            Ok(Event::Text(e)) if in_loc => {
                match e.decode() {
                    Ok(text) => locs.push(text.to_string()),
                    Err(e) => warn!(error = %e, "invalid <loc> text in sitemap"),
                }
                in_loc = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(error = %e, "malformed sitemap XML, stopping parse");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    locs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_xml_by_loc_tag() {
        assert_eq!(SitemapFormat::detect("<urlset><url><loc>https://x</loc></url></urlset>"), SitemapFormat::Xml);
    }

    #[test]
    fn detects_plain_text_when_no_xml_markers() {
        assert_eq!(SitemapFormat::detect("https://a.com\nhttps://b.com"), SitemapFormat::PlainText);
    }

    #[test]
    fn extracts_locs_from_urlset() {
        let xml = "<urlset><url><loc>https://a.com/</loc></url><url><loc>https://b.com/</loc></url></urlset>";
        let locs = extract_locs(xml);
        assert_eq!(locs, vec!["https://a.com/".to_string(), "https://b.com/".to_string()]);
    }

    #[test]
    fn recognizes_sitemap_index_root() {
        assert!(is_sitemap_index("<sitemapindex><sitemap><loc>https://a.com/sitemap.xml</loc></sitemap></sitemapindex>"));
    }

    #[test]
    fn malformed_xml_yields_empty_rather_than_panicking() {
        let locs = extract_locs("<urlset><url><loc>not closed");
        assert!(locs.is_empty() || locs.len() <= 1);
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let urls: Vec<Url> = ["https://a.test/", "https://b.test/", "https://a.test/"]
            .iter()
            .map(|s| Url::parse(s).unwrap())
            .collect();
        let deduped = dedup_preserving_order(urls);
        assert_eq!(
            deduped,
            vec![Url::parse("https://a.test/").unwrap(), Url::parse("https://b.test/").unwrap()]
        );
    }
}
