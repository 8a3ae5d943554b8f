//! In-memory mirror of the KV `confirmed:false` set (spec.md §4.6). The
//! spend watcher iterates this, not KV directly; a dedicated mutex guards
//! it, same pattern as the seed window's ring.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use crate::errors::KvError;
use crate::kv::keys::NOT_CONFIRMED_SET;
use crate::kv::KvStore;

#[derive(Default)]
pub struct NotConfirmedSet {
    inner: Mutex<HashSet<String>>,
}

impl NotConfirmedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the mirror from KV at service start (spec.md §4.6 "startup sync").
    pub async fn sync_from_kv(&self, kv: &Arc<dyn KvStore>) -> Result<(), KvError> {
        let entries = kv.set_members(NOT_CONFIRMED_SET).await?;
        let mut inner = self.inner.lock().unwrap();
        inner.clear();
        inner.extend(entries);
        Ok(())
    }

    pub fn insert(&self, entry: String) {
        self.inner.lock().unwrap().insert(entry);
    }

    pub fn remove(&self, entry: &str) {
        self.inner.lock().unwrap().remove(entry);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKvStore;

    #[tokio::test]
    async fn startup_sync_populates_mirror_from_kv() {
        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::new());
        kv.set_add(NOT_CONFIRMED_SET, "roulette:BOX1:P").await.unwrap();
        kv.set_add(NOT_CONFIRMED_SET, "roulette:BOX2:P").await.unwrap();

        let mirror = NotConfirmedSet::new();
        mirror.sync_from_kv(&kv).await.unwrap();
        assert_eq!(mirror.len(), 2);

        mirror.remove("roulette:BOX1:P");
        assert_eq!(mirror.snapshot(), vec!["roulette:BOX2:P".to_string()]);
    }
}
