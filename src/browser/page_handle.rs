//! `PageHandle` — a page as a scoped resource (Design Note "model a page as
//! a scoped resource"). `Drop` releases the page if it was not already
//! released, making release idempotent even on panics/early returns, which
//! grounds the "Idempotence of release" property in `spec.md` §8.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::BrowserCollaborator;

pub struct PageHandle<B: BrowserCollaborator> {
    browser: Arc<B>,
    page: Option<B::Page>,
    released: AtomicBool,
}

impl<B: BrowserCollaborator> PageHandle<B> {
    pub fn new(browser: Arc<B>, page: B::Page) -> Self {
        Self { browser, page: Some(page), released: AtomicBool::new(false) }
    }

    pub fn page(&self) -> &B::Page {
        self.page.as_ref().expect("page is Some until release consumes it in Drop")
    }

    /// Explicit release. Idempotent: a second call, or a later `Drop`, is a
    /// no-op.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(page) = &self.page {
            self.browser.release_page(page).await;
        }
    }
}

impl<B: BrowserCollaborator + 'static> Drop for PageHandle<B>
where
    B::Page: 'static,
{
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        // Best-effort synchronous release path: callers are expected to
        // `release().await` explicitly on every exit path (`spec.md` §4.3);
        // this only guards against a caller forgetting to.
        if let Some(page) = self.page.take() {
            let browser = self.browser.clone();
            tokio::spawn(async move {
                browser.release_page(&page).await;
            });
        }
    }
}
