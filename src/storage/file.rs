use std::{
    collections::{BTreeMap, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tokio::sync::Mutex;

use super::SessionStore;

/// Session keys kept as a flat JSON object on disk.
///
/// Every read goes to the file so writes from another process are picked up.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> anyhow::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(BTreeMap::new());
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(values) => Ok(values),
            Err(e) => {
                // the next write replaces it, so a truncated file never locks the user out
                tracing::warn!(path = %self.path.display(), error = %e, "session file is not a JSON object, treating it as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    /// Write to a uniquely named sibling and rename it over the session file.
    async fn save(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let body = serde_json::to_string_pretty(values)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create a temp file in {}", dir.display()))?;
            tmp.write_all(body.as_bytes())
                .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
            tmp.persist(&path)
                .with_context(|| format!("Failed to replace {}", path.display()))?;
            Ok(())
        })
        .await
        .context("session file writer panicked")?
    }
}

#[async_trait::async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.save(&values).await?;
        }
        Ok(())
    }

    async fn revision(&self) -> anyhow::Result<u64> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(0);
        };
        let mut hasher = DefaultHasher::new();
        raw.hash(&mut hasher);
        Ok(hasher.finish())
    }
}
