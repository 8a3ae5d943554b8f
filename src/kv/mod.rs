//! KV store façade (C2). A narrow async trait over hash/set/string/TTL
//! operations, with a Redis-backed implementation and an in-memory test
//! double, grounded on the `BetRepository`/`RedisBetRepository` split in
//! `reecen9696-atomiq-bet-settlement`.

pub mod bet_repository;
pub mod keys;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use crate::errors::KvError;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn hash_get_all(&self, key: &str) -> Result<Option<Vec<(String, String)>>, KvError>;
    async fn hash_set_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), KvError>;
    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<(), KvError>;
    async fn hash_exists(&self, key: &str) -> Result<bool, KvError>;

    async fn set_add(&self, key: &str, member: &str) -> Result<(), KvError>;
    async fn set_remove(&self, key: &str, member: &str) -> Result<(), KvError>;
    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvError>;

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError>;
    async fn set_string(&self, key: &str, value: &str) -> Result<(), KvError>;
    async fn set_string_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<(), KvError>;
    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Glob-style key scan, used by the notification retrieval endpoint
    /// (`notif:*:<walletAddr>:*`, spec.md §4.6).
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, KvError>;
}

pub use bet_repository::BetRepository;
pub use memory::InMemoryKvStore;
pub use redis_store::RedisKvStore;
