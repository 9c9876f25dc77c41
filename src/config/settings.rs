//! Process-wide settings loaded once from the environment at startup and
//! threaded through constructors, per Design Note "explicit lifecycles...
//! pass references through constructors rather than importing module state."
//!
//! Variable names and defaults below are load-bearing: every entry matches
//! the configuration table verbatim.

use std::env;
use std::time::Duration;

/// Redis connection mode for the shared cache tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    Internal,
    External,
    None,
}

impl CacheMode {
    fn parse(raw: &str) -> Self {
        match raw {
            "internal" => CacheMode::Internal,
            "external" => CacheMode::External,
            _ => CacheMode::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub max_retries: u32,
    pub page_timeout: Duration,
    pub min_content_length: usize,
    pub scroll_wait_time: Duration,
    pub aggressive_cleaning: bool,
    pub remove_images: bool,

    pub cache_mode: CacheMode,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: String,
    pub redis_db: u32,
    pub external_redis_url: Option<String>,
    pub redis_cache_ttl: Duration,
    pub lru_cache_ttl: Duration,
    pub disable_all_caching: bool,

    pub default_max_concurrent: usize,
    pub default_batch_size: usize,
    pub default_processing_delay: Duration,
    pub default_retry_count: u32,
    pub default_retry_delay: Duration,
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
        .unwrap_or(default)
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Settings {
    /// Read every environment variable the configuration table names,
    /// falling back to its documented default when unset or unparsable.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 3000),
            max_retries: env_parsed("MAX_RETRIES", 2),
            page_timeout: Duration::from_millis(env_parsed("PAGE_TIMEOUT", 30_000)),
            min_content_length: env_parsed("MIN_CONTENT_LENGTH", 500),
            scroll_wait_time: Duration::from_millis(env_parsed("SCROLL_WAIT_TIME", 200)),
            aggressive_cleaning: env_bool("AGGRESSIVE_CLEANING", true),
            remove_images: env_bool("REMOVE_IMAGES", false),

            cache_mode: CacheMode::parse(&env_string("USE_REDIS", "none")),
            redis_host: env_string("REDIS_HOST", "localhost"),
            redis_port: env_parsed("REDIS_PORT", 6379),
            redis_password: env_string("REDIS_PASSWORD", ""),
            redis_db: env_parsed("REDIS_DB", 0),
            external_redis_url: env::var("EXTERNAL_REDIS_URL").ok().filter(|v| !v.is_empty()),
            redis_cache_ttl: Duration::from_secs(env_parsed("REDIS_CACHE_TTL", 3600)),
            lru_cache_ttl: Duration::from_millis(env_parsed("LRU_CACHE_TTL", 3_600_000)),
            disable_all_caching: env_bool("DISABLE_ALL_CACHING", false),

            default_max_concurrent: env_parsed("DEFAULT_MAX_CONCURRENT", 5),
            default_batch_size: env_parsed("DEFAULT_BATCH_SIZE", 10),
            default_processing_delay: Duration::from_millis(env_parsed(
                "DEFAULT_PROCESSING_DELAY",
                100,
            )),
            default_retry_count: env_parsed("DEFAULT_RETRY_COUNT", 2),
            default_retry_delay: Duration::from_millis(env_parsed("DEFAULT_RETRY_DELAY", 3000)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_when_env_unset() {
        for key in [
            "PORT",
            "MAX_RETRIES",
            "PAGE_TIMEOUT",
            "MIN_CONTENT_LENGTH",
            "USE_REDIS",
            "DISABLE_ALL_CACHING",
            "DEFAULT_MAX_CONCURRENT",
        ] {
            env::remove_var(key);
        }
        let settings = Settings::from_env();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.page_timeout, Duration::from_millis(30_000));
        assert_eq!(settings.min_content_length, 500);
        assert_eq!(settings.cache_mode, CacheMode::None);
        assert!(!settings.disable_all_caching);
        assert_eq!(settings.default_max_concurrent, 5);
    }

    #[test]
    fn cache_mode_parses_known_values() {
        assert_eq!(CacheMode::parse("internal"), CacheMode::Internal);
        assert_eq!(CacheMode::parse("external"), CacheMode::External);
        assert_eq!(CacheMode::parse("garbage"), CacheMode::None);
    }
}
