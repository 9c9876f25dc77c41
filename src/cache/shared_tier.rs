//! Networked KV shared tier over Redis. TTL is tracked in seconds, per
//! `spec.md` §4.1. Grounded in `foofork-riptidecrawler`'s
//! `riptide-core/src/cache.rs::CacheManager` (the teacher itself never
//! touches Redis), narrowed to the plain `get(key)`/`set(key, Artifact)`
//! interface `spec.md` specifies.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::model::Artifact;

pub struct SharedTier {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl SharedTier {
    pub async fn connect_external(url: &str, ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("failed to connect to redis")?;
        Ok(Self { conn, ttl_secs })
    }

    pub async fn connect_internal(
        host: &str,
        port: u16,
        password: &str,
        db: u32,
        ttl_secs: u64,
    ) -> Result<Self> {
        let url = if password.is_empty() {
            format!("redis://{host}:{port}/{db}")
        } else {
            format!("redis://:{password}@{host}:{port}/{db}")
        };
        Self::connect_external(&url, ttl_secs).await
    }

    /// `set(probe,"ok",TTL=10s)` then `get(probe)` equal to `"ok"`
    /// (`spec.md` §4.1 tier-selection probe).
    pub async fn probe(&mut self) -> Result<()> {
        let key = "sf4ai:probe";
        let () = self.conn.set_ex(key, "ok", 10).await.context("probe set failed")?;
        let value: String = self.conn.get(key).await.context("probe get failed")?;
        anyhow::ensure!(value == "ok", "probe round-trip mismatch");
        Ok(())
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Artifact>> {
        let raw: Option<String> = self.conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&mut self, key: &str, artifact: &Artifact) -> Result<()> {
        let json = serde_json::to_string(artifact)?;
        let () = self.conn.set_ex(key, json, self.ttl_secs).await?;
        Ok(())
    }
}
