mod job_config;
mod options;
mod settings;

pub use job_config::{Complete, JobConfig, JobConfigBuilder, NeedsSource, Source, WebhookSpec};
pub use options::ConversionOptions;
pub use settings::{CacheMode, Settings};
