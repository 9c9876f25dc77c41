//! Single long-lived browser providing cheap page acquisition, per
//! `spec.md` §2 ("a single long-lived browser"). Grounded in the teacher's
//! `browser_pool/mod.rs` launch/handler-task idiom and
//! `crawl_engine/page_processor.rs`'s `new_page`/`goto`/`evaluate` calls,
//! narrowed from a multi-browser pool down to one shared `Browser`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::Sf4aiError;

use super::BrowserCollaborator;

pub struct ChromiumoxideBrowser {
    browser: Browser,
    _handler: JoinHandle<()>,
}

impl ChromiumoxideBrowser {
    pub async fn launch(headless: bool, user_data_dir: PathBuf) -> Result<Self, Sf4aiError> {
        std::fs::create_dir_all(&user_data_dir).map_err(|e| {
            Sf4aiError::NavigationError(format!("failed to create chrome data dir: {e}"))
        })?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir);

        builder = if headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };

        let config = builder
            .build()
            .map_err(|e| Sf4aiError::NavigationError(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Sf4aiError::NavigationError(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!(error = %e, "browser handler event error");
                }
            }
        });

        Ok(Self { browser, _handler: handler_task })
    }
}

#[async_trait]
impl BrowserCollaborator for ChromiumoxideBrowser {
    type Page = Page;

    async fn acquire_page(&self) -> Result<Page, Sf4aiError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| Sf4aiError::NavigationError(format!("failed to acquire page: {e}")))
    }

    async fn navigate(&self, page: &Page, url: &str, timeout: Duration) -> Result<(), Sf4aiError> {
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| Sf4aiError::NavigationError("Navigation timeout".to_string()))?
            .map_err(|e| Sf4aiError::NavigationError(format!("{e}")))?;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| Sf4aiError::NavigationError("Navigation timeout".to_string()))?
            .map_err(|e| Sf4aiError::NavigationError(format!("{e}")))?;

        Ok(())
    }

    async fn evaluate(&self, page: &Page, script: &str) -> Result<Value, Sf4aiError> {
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| Sf4aiError::NavigationError(format!("Protocol error: {e}")))?;
        result
            .into_value()
            .map_err(|e| Sf4aiError::NavigationError(format!("failed to decode evaluate result: {e}")))
    }

    async fn release_page(&self, page: &Page) {
        if let Err(e) = page.close().await {
            error!(error = %e, "failed to close page during release");
        }
    }
}
