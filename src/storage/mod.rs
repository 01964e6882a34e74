// Persistence for the session keys; an in-memory map and a JSON file

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn remove(&self, key: &str) -> anyhow::Result<()>;
    /// Changes whenever the stored contents change, including writes from other processes.
    async fn revision(&self) -> anyhow::Result<u64>;
}
