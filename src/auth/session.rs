use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session ttl out of range: {0:?}")]
    InvalidTtl(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// TTL key-value store binding session ids to company ids
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError>;

    /// `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Number of live entries removed (0 or 1)
    async fn delete(&self, key: &str) -> Result<u64, SessionStoreError>;
}

/// Process-local session store
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let deadline = Instant::now()
            .checked_add(ttl)
            .ok_or(SessionStoreError::InvalidTtl(ttl))?;
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let mut entries = self.entries.write().await;
        if let Some((value, deadline)) = entries.get(key) {
            if *deadline > Instant::now() {
                return Ok(Some(value.clone()));
            }
        }
        entries.remove(key);
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<u64, SessionStoreError> {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some((_, deadline)) if deadline > Instant::now() => Ok(1),
            _ => Ok(0),
        }
    }
}

/// Session store backed by the `sessions` table
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop rows whose TTL has passed
    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!(removed, "Purged expired sessions");
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let ttl_delta = chrono::Duration::from_std(ttl).map_err(|_| SessionStoreError::InvalidTtl(ttl))?;
        let expires_at = Utc::now() + ttl_delta;

        sqlx::query(
            "INSERT INTO sessions (key, value, expires_at) VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        self.purge_expired().await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM sessions WHERE key = $1 AND expires_at > now()")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn delete(&self, key: &str) -> Result<u64, SessionStoreError> {
        let removed = sqlx::query("DELETE FROM sessions WHERE key = $1 AND expires_at > now()")
            .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = MemorySessionStore::new();
        store.set("abc", "7", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("abc").await.unwrap().as_deref(), Some("7"));
        assert_eq!(store.delete("abc").await.unwrap(), 1);
        assert_eq!(store.delete("abc").await.unwrap(), 0);
        assert!(store.get("abc").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemorySessionStore::new();
        store.set("abc", "7", Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(store.get("abc").await.unwrap().is_none());
        assert_eq!(store.delete("abc").await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_evicted() {
        let store = MemorySessionStore::new();
        for i in 0..1000 {
            store.set(&format!("k{i}"), "7", Duration::from_secs(1)).await.unwrap();
        }
        assert_eq!(store.len().await, 1000);

        tokio::time::advance(Duration::from_secs(10)).await;
        for i in 0..1000 {
            assert!(store.get(&format!("k{i}")).await.unwrap().is_none());
        }
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn set_sweeps_keys_nobody_reads_again() {
        let store = MemorySessionStore::new();
        for i in 0..10 {
            store.set(&format!("old{i}"), "7", Duration::from_secs(1)).await.unwrap();
        }

        tokio::time::advance(Duration::from_secs(2)).await;
        store.set("fresh", "8", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("fresh").await.unwrap().as_deref(), Some("8"));
    }
}
