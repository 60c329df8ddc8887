use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::domain::{DomainError, FetchResponse};
use crate::ports::CacheStore;

/// In-memory cache store: generation tag -> request key -> response.
#[derive(Default)]
pub struct MemoryCacheStore {
    generations: RwLock<HashMap<String, HashMap<String, FetchResponse>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(
        &self,
        generation: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, DomainError> {
        Ok(self
            .generations
            .read()
            .get(generation)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(
        &self,
        generation: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<(), DomainError> {
        self.generations
            .write()
            .entry(generation.to_string())
            .or_default()
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn generations(&self) -> Result<Vec<String>, DomainError> {
        let mut names: Vec<String> = self.generations.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_generation(&self, generation: &str) -> Result<(), DomainError> {
        self.generations.write().remove(generation);
        Ok(())
    }
}

/// Filesystem-backed cache store.
///
/// Layout: `<root>/<generation>/<sha256(key)>.json`, one JSON-encoded
/// response per file. Writes go to a temp file first and are renamed
/// into place, so a concurrent read sees the old or the new entry,
/// never a torn one.
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    pub fn new(root: PathBuf) -> Result<Self, DomainError> {
        std::fs::create_dir_all(&root)?;
        info!(root = ?root, "DiskCacheStore initialized");
        Ok(Self { root })
    }

    fn entry_path(&self, generation: &str, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.root.join(generation).join(format!("{}.json", digest))
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn get(
        &self,
        generation: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, DomainError> {
        let path = self.entry_path(generation, key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let response = serde_json::from_slice(&bytes)?;
                Ok(Some(response))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        generation: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<(), DomainError> {
        let path = self.entry_path(generation, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec(response)?;
        let temp = path.with_extension("tmp");
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &path).await?;
        debug!(generation = generation, key = key, "cache entry written");
        Ok(())
    }

    async fn generations(&self) -> Result<Vec<String>, DomainError> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_generation(&self, generation: &str) -> Result<(), DomainError> {
        let path = self.root.join(generation);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FetchResponse {
        FetchResponse::new(200, "text/html", b"<html>shell</html>".to_vec())
    }

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let store = MemoryCacheStore::new();
        assert!(store.get("v1", "GET /index.html").await.unwrap().is_none());

        store.put("v1", "GET /index.html", &sample()).await.unwrap();
        let cached = store.get("v1", "GET /index.html").await.unwrap().unwrap();
        assert_eq!(cached.body, sample().body);
        assert_eq!(cached.status, 200);
    }

    #[tokio::test]
    async fn test_memory_generation_isolation() {
        let store = MemoryCacheStore::new();
        store.put("v1", "GET /a", &sample()).await.unwrap();
        assert!(store.get("v2", "GET /a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_delete_generation() {
        let store = MemoryCacheStore::new();
        store.put("v1", "GET /a", &sample()).await.unwrap();
        store.put("v2", "GET /a", &sample()).await.unwrap();
        store.delete_generation("v1").await.unwrap();
        assert_eq!(store.generations().await.unwrap(), vec!["v2".to_string()]);
        assert!(store.get("v1", "GET /a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();

        store
            .put("v1", "GET http://localhost:8080/index.html", &sample())
            .await
            .unwrap();
        let cached = store
            .get("v1", "GET http://localhost:8080/index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.body, sample().body);
        assert_eq!(cached.content_type, "text/html");
    }

    #[tokio::test]
    async fn test_disk_miss_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.get("v1", "GET /missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_generations_and_purge() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskCacheStore::new(dir.path().to_path_buf()).unwrap();
        store.put("v1", "GET /a", &sample()).await.unwrap();
        store.put("v2", "GET /a", &sample()).await.unwrap();
        assert_eq!(
            store.generations().await.unwrap(),
            vec!["v1".to_string(), "v2".to_string()]
        );

        store.delete_generation("v1").await.unwrap();
        assert_eq!(store.generations().await.unwrap(), vec!["v2".to_string()]);
        // Deleting a missing generation is a no-op.
        store.delete_generation("v1").await.unwrap();
    }
}
