//! `JobConfig` and its typestate builder. The only field with no sensible
//! default is the job's `source`; everything else is seeded from
//! [`Settings`] and overridable, matching `spec.md` §3's "frozen
//! ConversionOptions + concurrency knobs + webhook spec + source" shape.
//!
//! Grounded in the teacher's `config::builder::CrawlConfigBuilder<State>`
//! typestate, narrowed to the one field that actually needs a required-set
//! marker.

use std::marker::PhantomData;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::options::ConversionOptions;
use super::settings::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Source {
    Urls(Vec<Url>),
    Sitemap(Url),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSpec {
    pub url: String,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub extra_fields: std::collections::HashMap<String, serde_json::Value>,
    pub progress_updates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub options: ConversionOptions,
    pub source: Source,
    pub max_concurrent: usize,
    pub batch_size: usize,
    #[serde(with = "duration_millis")]
    pub processing_delay: Duration,
    pub retry_count: u32,
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,
    pub webhook: Option<WebhookSpec>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

pub struct NeedsSource;
pub struct Complete;

pub struct JobConfigBuilder<State = NeedsSource> {
    options: ConversionOptions,
    max_concurrent: usize,
    batch_size: usize,
    processing_delay: Duration,
    retry_count: u32,
    retry_delay: Duration,
    webhook: Option<WebhookSpec>,
    source: Option<Source>,
    _phantom: PhantomData<State>,
}

impl JobConfigBuilder<NeedsSource> {
    pub fn new(settings: &Settings) -> Self {
        Self {
            options: ConversionOptions::from_settings(settings),
            max_concurrent: settings.default_max_concurrent,
            batch_size: settings.default_batch_size,
            processing_delay: settings.default_processing_delay,
            retry_count: settings.default_retry_count,
            retry_delay: settings.default_retry_delay,
            webhook: None,
            source: None,
            _phantom: PhantomData,
        }
    }

    pub fn source(self, source: Source) -> JobConfigBuilder<Complete> {
        JobConfigBuilder {
            options: self.options,
            max_concurrent: self.max_concurrent,
            batch_size: self.batch_size,
            processing_delay: self.processing_delay,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            webhook: self.webhook,
            source: Some(source),
            _phantom: PhantomData,
        }
    }
}

impl<State> JobConfigBuilder<State> {
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    pub fn processing_delay(mut self, d: Duration) -> Self {
        self.processing_delay = d;
        self
    }

    pub fn retry_count(mut self, n: u32) -> Self {
        self.retry_count = n;
        self
    }

    pub fn retry_delay(mut self, d: Duration) -> Self {
        self.retry_delay = d;
        self
    }

    pub fn webhook(mut self, webhook: WebhookSpec) -> Self {
        self.webhook = Some(webhook);
        self
    }
}

impl JobConfigBuilder<Complete> {
    pub fn build(self) -> JobConfig {
        JobConfig {
            options: self.options,
            source: self.source.expect("Complete state guarantees source is set"),
            max_concurrent: self.max_concurrent,
            batch_size: self.batch_size,
            processing_delay: self.processing_delay,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            webhook: self.webhook,
        }
    }
}
