//! Crate-facing error type. Internal plumbing returns `anyhow::Result` and is
//! adapted to `Sf4aiError` at module boundaries, mirroring the teacher's split
//! between `anyhow` for internals and `thiserror` for the public error surface.

use thiserror::Error;

/// The error kinds a conversion or job can surface.
#[derive(Debug, Error)]
pub enum Sf4aiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("navigation error: {0}")]
    NavigationError(String),

    #[error("cleaning error: {0}")]
    CleaningError(String),

    #[error("converter error: {0}")]
    ConverterError(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("webhook error: {0}")]
    WebhookError(String),

    #[error("cancelled")]
    Cancelled,
}

impl Sf4aiError {
    /// Transient errors are retried by the pipeline (`spec.md` §4.7 retry policy):
    /// anything whose message contains `net::`, `Navigation timeout`, or
    /// `Protocol error`.
    pub fn is_transient(&self) -> bool {
        let msg = match self {
            Sf4aiError::NavigationError(m) | Sf4aiError::ConverterError(m) => m,
            _ => return false,
        };
        msg.contains("net::") || msg.contains("Navigation timeout") || msg.contains("Protocol error")
    }
}

pub type Sf4aiResult<T> = Result<T, Sf4aiError>;
