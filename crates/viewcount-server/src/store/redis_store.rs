//! Redis-backed counter store.
//!
//! One `ConnectionManager` (multiplexed, auto-reconnecting) is shared by the
//! process and cloned per call. It is established on first use rather than
//! at startup: while Redis is unreachable every call fails with
//! `ViewError::Store` (degraded replies, `/readyz` 503) and the next call
//! retries the connect.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tokio::sync::OnceCell;

use viewcount_core::error::{Result, ViewError};

use super::{millis, CounterStore, WindowSample};

/// Fixed-window hit using the server clock. Returns
/// `{previous, current, elapsed_ms}`; the current bucket expires after two
/// windows so it can still serve as "previous" for the next one.
const WINDOW_HIT_LUA: &str = r#"
local t = redis.call('TIME')
local now_ms = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)
local window = tonumber(ARGV[1])
local bucket = math.floor(now_ms / window)
local cur_key = KEYS[1] .. ':' .. bucket
local prev_key = KEYS[1] .. ':' .. (bucket - 1)
local current = redis.call('INCR', cur_key)
if current == 1 then
    redis.call('PEXPIRE', cur_key, window * 2)
end
local previous = tonumber(redis.call('GET', prev_key) or '0')
return {previous, current, now_ms % window}
"#;

/// Reconnect backoff: `factor * base^n` ms for at most `CONNECT_RETRIES`
/// retries, so a call during an outage fails within about a second.
const CONNECT_BACKOFF_BASE: u64 = 2;
const CONNECT_BACKOFF_FACTOR_MS: u64 = 100;
const CONNECT_RETRIES: usize = 2;

pub struct RedisStore {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    window_hit: Script,
}

impl RedisStore {
    /// Parse the URL and prepare the client. No network I/O happens here, so
    /// only a malformed URL fails.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| ViewError::Config(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            window_hit: Script::new(WINDOW_HIT_LUA),
        })
    }

    /// Shared connection, connecting on first use.
    async fn conn(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    CONNECT_BACKOFF_BASE,
                    CONNECT_BACKOFF_FACTOR_MS,
                    CONNECT_RETRIES,
                )
                .await
                .map_err(store_err)?;
                tracing::info!("connected to redis counter store");
                Ok::<_, ViewError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

fn store_err(e: redis::RedisError) -> ViewError {
    ViewError::Store(format!("redis: {e}"))
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<u64>> {
        let mut conn = self.conn().await?;
        let v: Option<u64> = conn.get(key).await.map_err(store_err)?;
        Ok(v)
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let v: u64 = conn.incr(key, 1u64).await.map_err(store_err)?;
        Ok(v)
    }

    async fn set_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, value: u64, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn().await?;
        // SET ... NX replies OK when written, nil when the key exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(reply.is_some())
    }

    async fn window_hit(&self, key: &str, window: Duration) -> Result<WindowSample> {
        let mut conn = self.conn().await?;
        let (previous, current, elapsed_ms): (u64, u64, u64) = self
            .window_hit
            .key(key)
            .arg(millis(window))
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(WindowSample {
            previous,
            current,
            elapsed: Duration::from_millis(elapsed_ms),
        })
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
