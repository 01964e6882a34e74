use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::sync::RwLock;

use super::SessionStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    revision: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MemoryStore {
            values: RwLock::new(values),
            revision: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.revision.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        if self.values.write().await.remove(key).is_some() {
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn revision(&self) -> anyhow::Result<u64> {
        Ok(self.revision.load(Ordering::SeqCst))
    }
}
