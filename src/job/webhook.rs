//! Webhook Sender (`SPEC_FULL.md` §2 item 2, §6): progress/final JSON POSTs
//! with headers merged from the job's [`WebhookSpec`]. Failures are logged
//! and swallowed — `spec.md` §7: "WebhookError is logged and does not alter
//! job status."
//!
//! Payload shapes grounded in the closest sibling precedent in the pack,
//! `other_examples/...firecrawl-sdk-src-batch_scrape.rs.rs`'s
//! `BatchScrapeWebhook { url, headers, metadata, events }`.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::config::WebhookSpec;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct WebhookSender {
    client: Client,
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self { client: Client::new() }
    }
}

impl WebhookSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends `payload` to `spec.url` with `spec.headers` merged in and
    /// `spec.extra_fields` folded into the JSON body. Never returns an
    /// error to the caller — failures are logged at `warn` and swallowed.
    pub async fn send(&self, spec: &WebhookSpec, payload: impl Serialize) {
        let mut body = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(url = %spec.url, "webhook payload did not serialize to a JSON object, skipping send");
                return;
            }
        };

        for (key, value) in &spec.extra_fields {
            body.insert(key.clone(), value.clone());
        }

        let mut request = self.client.post(&spec.url).timeout(WEBHOOK_TIMEOUT).json(&body);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(url = %spec.url, status = %response.status(), "webhook POST returned non-success status");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(url = %spec.url, error = %e, "webhook POST failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn sends_merged_extra_fields_and_succeeds_on_2xx() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "jobId": "abc",
                "traceId": "xyz",
            })))
            .with_status(200)
            .create_async()
            .await;

        let spec = WebhookSpec {
            url: format!("{}/hook", server.url()),
            headers: HashMap::new(),
            extra_fields: HashMap::from([(
                "traceId".to_string(),
                serde_json::Value::String("xyz".to_string()),
            )]),
            progress_updates: true,
        };

        let sender = WebhookSender::new();
        sender.send(&spec, serde_json::json!({ "jobId": "abc" })).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_response_is_logged_and_swallowed_not_panicked() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/hook").with_status(500).create_async().await;

        let spec = WebhookSpec {
            url: format!("{}/hook", server.url()),
            headers: HashMap::new(),
            extra_fields: HashMap::new(),
            progress_updates: false,
        };

        WebhookSender::new().send(&spec, serde_json::json!({})).await;
    }
}
