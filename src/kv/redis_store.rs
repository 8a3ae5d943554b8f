use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::errors::KvError;

use super::KvStore;

/// Redis-backed KV store façade, grounded on
/// `reecen9696-atomiq-bet-settlement`'s `RedisBetRepository`: hashes for
/// per-key field maps, sets for index membership, strings with optional TTL
/// for everything else.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url).map_err(|e| KvError::Transport(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| KvError::Transport(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl From<redis::RedisError> for KvError {
    fn from(e: redis::RedisError) -> Self {
        KvError::Transport(e.to_string())
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn hash_get_all(&self, key: &str) -> Result<Option<Vec<(String, String)>>, KvError> {
        let mut conn = self.conn.clone();
        let fields: Vec<(String, String)> = conn.hgetall(key).await?;
        if fields.is_empty() {
            // redis returns an empty map for a missing key, indistinguishable
            // from a hash with no fields; this service never writes empty
            // hashes, so empty means "absent".
            Ok(None)
        } else {
            Ok(Some(fields))
        }
    }

    async fn hash_set_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        let owned: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        pipe.hset_multiple(key, &owned).ignore();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hash_exists(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(key, member).await?;
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.srem(key, member).await?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_string_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut out = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            out.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(out)
    }
}
