//! Read-through response cache.
//!
//! Handlers wrap expensive reads in [`cache_aside`] with an explicit key and
//! TTL. Entries are never invalidated on writes; callers tolerate staleness
//! up to the TTL. A failing cache never fails the request.

#![allow(async_fn_in_trait)]

use std::future::Future;

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use serde::{Serialize, de::DeserializeOwned};

/// Byte-level key/expiry store backing [`cache_aside`].
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct RedisResponseCache {
    pub pool: Pool,
}

impl ResponseCache for RedisResponseCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await.context("acquire redis connection")?;
        let value: Option<Vec<u8>> = conn.get(key).await.context("redis GET")?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await.context("acquire redis connection")?;
        let (): () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .context("redis SETEX")?;
        Ok(())
    }
}

/// Build a cache key from a namespace and the full parameter set of a request.
pub fn cache_key<P: Serialize>(namespace: &str, params: &P) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    format!("{namespace}:{params}")
}

/// Return the cached value under `key`, or compute, store and return it.
///
/// Cache errors and undecodable entries are logged and fall back to `compute`.
/// Errors from `compute` are returned unchanged and nothing is stored.
pub async fn cache_aside<C, T, E, F, Fut>(
    cache: &C,
    key: &str,
    ttl_secs: u64,
    compute: F,
) -> Result<T, E>
where
    C: ResponseCache,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match cache.get(key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => return Ok(value),
            Err(e) => tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(key = %key, error = %e, "cache lookup failed"),
    }

    let value = compute().await?;

    match serde_json::to_vec(&value) {
        Ok(bytes) => {
            if let Err(e) = cache.set(key, bytes, ttl_secs).await {
                tracing::warn!(key = %key, error = %e, "cache store failed");
            }
        }
        Err(e) => tracing::warn!(key = %key, error = %e, "cache encode failed"),
    }
    Ok(value)
}
