use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::KvError;

use super::KvStore;

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    strings: HashMap<String, String>,
}

/// `Mutex<HashMap>`-backed `KvStore` double for unit tests — no TTL
/// expiry is simulated (tests assert presence/absence directly).
#[derive(Default)]
pub struct InMemoryKvStore {
    inner: Mutex<Inner>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn hash_get_all(&self, key: &str) -> Result<Option<Vec<(String, String)>>, KvError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .hashes
            .get(key)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
    }

    async fn hash_set_multiple(&self, key: &str, fields: &[(&str, String)]) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.hashes.entry(key.to_string()).or_default();
        for (f, v) in fields {
            entry.insert((*f).to_string(), v.clone());
        }
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: String) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hash_exists(&self, key: &str) -> Result<bool, KvError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.hashes.contains_key(key))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(s) = inner.sets.get_mut(key) {
            s.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.strings.get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn set_string_with_ttl(
        &self,
        key: &str,
        value: &str,
        _ttl_seconds: u64,
    ) -> Result<(), KvError> {
        self.set_string(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut inner = self.inner.lock().unwrap();
        inner.hashes.remove(key);
        inner.sets.remove(key);
        inner.strings.remove(key);
        Ok(())
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        // Only supports the simple `prefix:*:mid:*`/`prefix*` globs this
        // service actually issues.
        let parts: Vec<&str> = pattern.split('*').collect();
        let inner = self.inner.lock().unwrap();
        let matches = |key: &str| -> bool {
            let mut rest = key;
            for (idx, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    continue;
                }
                if idx == 0 {
                    if !rest.starts_with(part) {
                        return false;
                    }
                    rest = &rest[part.len()..];
                } else if let Some(pos) = rest.find(part) {
                    rest = &rest[pos + part.len()..];
                } else {
                    return false;
                }
            }
            true
        };
        Ok(inner
            .strings
            .keys()
            .filter(|k| matches(k))
            .cloned()
            .collect())
    }
}
