//! Converts arbitrary web pages into cleaned Markdown for RAG/LLM ingestion
//! pipelines. Core surface: a per-URL conversion in [`pipeline`], a
//! background [`job`] orchestrator for batches and sitemaps, and a layered
//! [`cache`] shared between both.

pub mod browser;
pub mod cache;
pub mod cleaner;
pub mod config;
pub mod converter;
pub mod error;
pub mod job;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod rules;
pub mod sitemap;
pub mod worker;

pub use browser::{BrowserCollaborator, ChromiumoxideBrowser};
pub use cache::Cache;
pub use config::{ConversionOptions, JobConfig, JobConfigBuilder, Settings, Source, WebhookSpec};
pub use error::{Sf4aiError, Sf4aiResult};
pub use job::{Job, JobId, JobOrchestrator};
pub use model::{Artifact, JobCounts, JobStatus, JobTiming, ProcessingResult};
pub use pipeline::PipelineDeps;
