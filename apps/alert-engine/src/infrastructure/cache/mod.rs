//! Redis Quote Cache
//!
//! `QuoteCachePort` adapter backed by Redis. Availability is best-effort: if
//! Redis is down at startup or goes away later, every operation degrades to
//! a cache miss and the pipeline keeps running against the gateway alone.
//!
//! The degraded state is logged once per transition, not once per miss, so
//! an extended outage does not flood the logs.
//!
//! Expiry is enforced server-side: `set` writes with `SETEX`, so Redis stops
//! returning the value once the TTL elapses and `get` sees a plain miss. No
//! expiry bookkeeping happens in-process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::application::ports::QuoteCachePort;

/// Redis-backed TTL cache with soft-fail semantics.
pub struct RedisQuoteCache {
    conn: Option<ConnectionManager>,
    degraded_logged: AtomicBool,
}

impl RedisQuoteCache {
    /// Connect to Redis at the given URL.
    ///
    /// A connection failure here does not fail startup; the cache comes up
    /// degraded and every lookup is a miss.
    pub async fn connect(redis_url: &str) -> Self {
        let conn = match redis::Client::open(redis_url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(conn) => {
                    tracing::info!("Connected to Redis quote cache");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unreachable, running without quote cache");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Invalid Redis URL, running without quote cache");
                None
            }
        };

        Self {
            conn,
            degraded_logged: AtomicBool::new(false),
        }
    }

    /// Build a cache that is degraded from the start. For wiring without a
    /// `REDIS_URL` and for tests.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            conn: None,
            degraded_logged: AtomicBool::new(false),
        }
    }

    /// Whether a backing connection was established.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&self) -> Option<ConnectionManager> {
        self.conn.clone()
    }

    fn note_degraded(&self, op: &str, err: &redis::RedisError) {
        if !self.degraded_logged.swap(true, Ordering::Relaxed) {
            tracing::warn!(op, error = %err, "Redis degraded, cache operations fall back to misses");
        }
    }

    fn note_recovered(&self) {
        if self.degraded_logged.swap(false, Ordering::Relaxed) {
            tracing::info!("Redis recovered, quote cache active again");
        }
    }
}

#[async_trait]
impl QuoteCachePort for RedisQuoteCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => {
                self.note_recovered();
                value
            }
            Err(e) => {
                self.note_degraded("get", &e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let Some(mut conn) = self.connection() else {
            return false;
        };
        // SETEX takes whole seconds; never round a positive TTL down to zero.
        let ttl_secs = ttl.as_secs().max(1);
        match conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
            Ok(()) => {
                self.note_recovered();
                true
            }
            Err(e) => {
                self.note_degraded("set", &e);
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        let Some(mut conn) = self.connection() else {
            return false;
        };
        match conn.del::<_, ()>(key).await {
            Ok(()) => {
                self.note_recovered();
                true
            }
            Err(e) => {
                self.note_degraded("delete", &e);
                false
            }
        }
    }

    async fn flush_all(&self) -> bool {
        let Some(mut conn) = self.connection() else {
            return false;
        };
        match redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await {
            Ok(()) => {
                self.note_recovered();
                true
            }
            Err(e) => {
                self.note_degraded("flush_all", &e);
                false
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
