//! In-process LRU fallback tier. TTL is tracked in milliseconds, per
//! `spec.md` §4.1/§9 ("TTL semantics between shared and LRU tiers differ by
//! unit (seconds vs milliseconds); the spec keeps this but flags it").

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::model::Artifact;

struct Entry {
    artifact: Artifact,
    expires_at: Instant,
}

/// Capacity 1000, per `spec.md` §4.1.
const CAPACITY: usize = 1000;

pub struct LruTier {
    cache: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl LruTier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CAPACITY).expect("CAPACITY is a nonzero literal"),
            )),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Artifact> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.artifact.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: String, artifact: Artifact) {
        let expires_at = Instant::now() + self.ttl;
        self.cache.lock().put(key, Entry { artifact, expires_at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn artifact(url: &str) -> Artifact {
        Artifact {
            url: url.to_string(),
            metadata: String::new(),
            markdown: "hello".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn set_then_get_returns_the_same_artifact() {
        let tier = LruTier::new(Duration::from_secs(60));
        tier.set("k".into(), artifact("https://x.test"));
        let got = tier.get("k").expect("should hit");
        assert_eq!(got.markdown, "hello");
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let tier = LruTier::new(Duration::from_millis(1));
        tier.set("k".into(), artifact("https://x.test"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(tier.get("k").is_none());
    }

    #[test]
    fn miss_on_unknown_key() {
        let tier = LruTier::new(Duration::from_secs(60));
        assert!(tier.get("missing").is_none());
    }
}
