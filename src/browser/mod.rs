//! Browser Collaborator (`spec.md` §4.3): the interface the core consumes,
//! plus the one chromiumoxide-backed implementation.

mod chromiumoxide_browser;
mod page_handle;

pub use chromiumoxide_browser::ChromiumoxideBrowser;
pub use page_handle::PageHandle;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Sf4aiError;

/// Capability set required by the core: `{acquirePage, navigate, evaluate,
/// releasePage}`. `release_page` must be idempotent and safe to call on
/// every exit path.
#[async_trait]
pub trait BrowserCollaborator: Send + Sync {
    type Page: Send + Sync;

    async fn acquire_page(&self) -> Result<Self::Page, Sf4aiError>;
    async fn navigate(&self, page: &Self::Page, url: &str, timeout: Duration) -> Result<(), Sf4aiError>;
    async fn evaluate(&self, page: &Self::Page, script: &str) -> Result<Value, Sf4aiError>;
    async fn release_page(&self, page: &Self::Page);
}
