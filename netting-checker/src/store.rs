use crate::errors::Result;
use crate::models::StatusLogRecord;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

/// Key-value store holding the per-transaction sets and status markers.
///
/// Part sets are written by upstream producers; the checker only reads them.
/// Errors are propagated rather than swallowed so the caller can turn them
/// into a failure outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SetStore: Send + Sync {
    /// Members of the first set absent from every following set
    async fn set_difference(&self, keys: &[String]) -> Result<Vec<String>>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Raw value under `key`, undecoded. Any value counts as present,
    /// whoever wrote it.
    async fn get_marker(&self, key: &str) -> Result<Option<String>>;

    async fn set_record(&self, key: &str, record: &StatusLogRecord) -> Result<()>;

    /// Write the record only if the key does not exist yet.
    /// Returns true when this call created the key.
    async fn set_record_if_absent(&self, key: &str, record: &StatusLogRecord) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisSetStore {
    redis: ConnectionManager,
    marker_ttl: Option<u64>,
}

impl RedisSetStore {
    pub fn new(redis: ConnectionManager, marker_ttl: Option<u64>) -> Self {
        RedisSetStore { redis, marker_ttl }
    }

    pub async fn connect(url: &str, marker_ttl: Option<u64>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self::new(redis, marker_ttl))
    }

    /// SET with optional NX and EX flags. Returns whether the value was written.
    async fn write_record(&self, key: &str, record: &StatusLogRecord, only_if_absent: bool) -> Result<bool> {
        let json = serde_json::to_string(record)?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(json);
        if only_if_absent {
            cmd.arg("NX");
        }
        if let Some(ttl) = self.marker_ttl {
            cmd.arg("EX").arg(ttl);
        }

        // Nil reply means NX refused the write
        let reply: Option<String> = cmd.query_async(&mut self.redis.clone()).await?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl SetStore for RedisSetStore {
    async fn set_difference(&self, keys: &[String]) -> Result<Vec<String>> {
        let remaining: Vec<String> = self.redis.clone().sdiff(keys).await?;
        debug!("SDIFF {:?} -> {} members", keys, remaining.len());
        Ok(remaining)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let members: Vec<String> = self.redis.clone().smembers(key).await?;
        Ok(members)
    }

    async fn get_marker(&self, key: &str) -> Result<Option<String>> {
        let marker: Option<String> = self.redis.clone().get(key).await?;
        Ok(marker)
    }

    async fn set_record(&self, key: &str, record: &StatusLogRecord) -> Result<()> {
        self.write_record(key, record, false).await?;
        Ok(())
    }

    async fn set_record_if_absent(&self, key: &str, record: &StatusLogRecord) -> Result<bool> {
        self.write_record(key, record, true).await
    }

    async fn ping(&self) -> Result<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.redis.clone()).await?;
        Ok(())
    }
}
