//! Two-tier cache (`spec.md` §4.1). Tier selection happens once at startup
//! via [`Cache::connect`]; the master switch (`disableAllCaching`) is
//! checked on every `get`/`set` regardless of which tier is active.

mod fingerprint;
mod lru_tier;
mod shared_tier;

pub use fingerprint::fingerprint;

use tracing::warn;

use crate::config::{CacheMode, Settings};
use crate::model::Artifact;
use lru_tier::LruTier;
use shared_tier::SharedTier;

enum Tier {
    Shared(tokio::sync::Mutex<SharedTier>),
    Lru(LruTier),
}

pub struct Cache {
    tier: Tier,
    disabled: bool,
}

impl Cache {
    /// Connect per `spec.md` §4.1: try the configured shared tier, probing
    /// with a round-trip write/read; on any connect/probe failure, fall
    /// back to the in-process LRU.
    pub async fn connect(settings: &Settings) -> Self {
        let lru_fallback = || Tier::Lru(LruTier::new(settings.lru_cache_ttl));

        let tier = match &settings.cache_mode {
            CacheMode::External => match &settings.external_redis_url {
                Some(url) => {
                    match SharedTier::connect_external(url, settings.redis_cache_ttl.as_secs())
                        .await
                    {
                        Ok(mut shared) => match shared.probe().await {
                            Ok(()) => Tier::Shared(tokio::sync::Mutex::new(shared)),
                            Err(e) => {
                                warn!(error = %e, "external cache probe failed, falling back to LRU");
                                lru_fallback()
                            }
                        },
                        Err(e) => {
                            warn!(error = %e, "failed to connect external cache, falling back to LRU");
                            lru_fallback()
                        }
                    }
                }
                None => {
                    warn!("USE_REDIS=external but EXTERNAL_REDIS_URL is unset, falling back to LRU");
                    lru_fallback()
                }
            },
            CacheMode::Internal => {
                match SharedTier::connect_internal(
                    &settings.redis_host,
                    settings.redis_port,
                    &settings.redis_password,
                    settings.redis_db,
                    settings.redis_cache_ttl.as_secs(),
                )
                .await
                {
                    Ok(mut shared) => match shared.probe().await {
                        Ok(()) => Tier::Shared(tokio::sync::Mutex::new(shared)),
                        Err(e) => {
                            warn!(error = %e, "internal cache probe failed, falling back to LRU");
                            lru_fallback()
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "failed to connect internal cache, falling back to LRU");
                        lru_fallback()
                    }
                }
            }
            CacheMode::None => lru_fallback(),
        };

        Self { tier, disabled: settings.disable_all_caching }
    }

    /// Errors are logged and treated as miss; never surfaced to the caller
    /// (`spec.md` §4.1 "Operations must never fail the caller").
    pub async fn get(&self, key: &str) -> Option<Artifact> {
        if self.disabled {
            return None;
        }
        match &self.tier {
            Tier::Lru(lru) => lru.get(key),
            Tier::Shared(shared) => match shared.lock().await.get(key).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, key, "cache get failed, treating as miss");
                    None
                }
            },
        }
    }

    pub async fn set(&self, key: &str, artifact: Artifact) {
        if self.disabled {
            return;
        }
        match &self.tier {
            Tier::Lru(lru) => lru.set(key.to_string(), artifact),
            Tier::Shared(shared) => {
                if let Err(e) = shared.lock().await.set(key, &artifact).await {
                    warn!(error = %e, key, "cache set failed, ignoring");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn disabled_master_switch_short_circuits_to_miss() {
        let mut settings = Settings::default();
        settings.disable_all_caching = true;
        let cache = Cache::connect(&settings).await;
        let artifact = Artifact {
            url: "https://x.test".into(),
            metadata: String::new(),
            markdown: "body".into(),
            timestamp: Utc::now(),
        };
        cache.set("k", artifact).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn none_mode_uses_lru_and_round_trips() {
        let settings = Settings::default();
        let cache = Cache::connect(&settings).await;
        let artifact = Artifact {
            url: "https://x.test".into(),
            metadata: "Title: X".into(),
            markdown: "body".into(),
            timestamp: Utc::now(),
        };
        cache.set("k", artifact.clone()).await;
        let got = cache.get("k").await.expect("lru should have the entry");
        assert_eq!(got.markdown, artifact.markdown);
    }
}
