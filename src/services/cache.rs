// src/services/cache.rs

//! Read-through cache for feed metadata.
//!
//! The cache only saves work: a miss, an expired entry and a broken backend
//! all fall back to loading the feed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PackageRecord;
use crate::services::MetadataLoader;
use crate::utils::fs::{load_json, save_json};
use crate::utils::hash::cache_key;

/// Key-value store for feed metadata.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    /// Cached records for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<PackageRecord>>>;

    /// Store records under `key` for `ttl_secs` seconds.
    async fn put(&self, key: &str, records: &[PackageRecord], ttl_secs: u64) -> Result<()>;

    /// Whether a live entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// On-disk cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    expires_at: DateTime<Utc>,
    records: Vec<PackageRecord>,
}

/// Cache storing one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    root_dir: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.root_dir.join(format!("{file_name}.json"))
    }
}

#[async_trait]
impl MetadataCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<PackageRecord>>> {
        let entry: Option<CacheEntry> = load_json(&self.path(key)).await?;
        Ok(entry
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.records))
    }

    async fn put(&self, key: &str, records: &[PackageRecord], ttl_secs: u64) -> Result<()> {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::cache(format!("TTL out of range: {ttl_secs}")))?;
        let entry = CacheEntry {
            expires_at: Utc::now() + ttl,
            records: records.to_vec(),
        };
        save_json(&self.path(key), &entry).await
    }
}

/// Loader that consults a cache before delegating to another loader.
pub struct CachedLoader<L, C> {
    inner: L,
    cache: C,
    ttl_secs: u64,
}

impl<L, C> CachedLoader<L, C> {
    pub fn new(inner: L, cache: C, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait]
impl<L, C> MetadataLoader for CachedLoader<L, C>
where
    L: MetadataLoader,
    C: MetadataCache,
{
    async fn load(&self, url: &str) -> Result<Vec<PackageRecord>> {
        let key = cache_key(url);

        match self.cache.get(&key).await {
            Ok(Some(records)) => {
                log::debug!("Cache hit for {} ({} packages)", url, records.len());
                return Ok(records);
            }
            Ok(None) => log::debug!("Cache miss for {}", url),
            Err(e) => log::debug!("Cache unavailable for {}: {}", url, e),
        }

        let records = self.inner.load(url).await?;

        if let Err(e) = self.cache.put(&key, &records, self.ttl_secs).await {
            log::debug!("Failed to cache metadata for {}: {}", url, e);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingLoader {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataLoader for CountingLoader {
        async fn load(&self, _url: &str) -> Result<Vec<PackageRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PackageRecord::new("bash", "0", "5.1", "1", "x86_64")])
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl MetadataCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<PackageRecord>>> {
            Err(AppError::cache("connection refused"))
        }

        async fn put(&self, _key: &str, _records: &[PackageRecord], _ttl: u64) -> Result<()> {
            Err(AppError::cache("connection refused"))
        }
    }

    fn counting() -> CountingLoader {
        CountingLoader {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_put_get_exists() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let records = vec![PackageRecord::new("bash", "0", "5.1", "1", "x86_64")];

        assert!(!cache.exists("repo:abc").await.unwrap());
        cache.put("repo:abc", &records, 60).await.unwrap();
        assert!(cache.exists("repo:abc").await.unwrap());
        assert_eq!(cache.get("repo:abc").await.unwrap(), Some(records));
        assert!(tmp.path().join("repo_abc.json").exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let records = vec![PackageRecord::new("bash", "0", "5.1", "1", "x86_64")];

        cache.put("repo:old", &records, 0).await.unwrap();
        assert_eq!(cache.get("repo:old").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cached_loader_loads_once() {
        let tmp = TempDir::new().unwrap();
        let loader = CachedLoader::new(counting(), FileCache::new(tmp.path()), 60);

        let first = loader.load("http://example.com/os/").await.unwrap();
        let second = loader.load("http://example.com/os/").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_broken_cache_falls_back_to_loader() {
        let loader = CachedLoader::new(counting(), BrokenCache, 60);

        let records = loader.load("http://example.com/os/").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_falls_back_to_loader() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path());
        let key = cache_key("http://example.com/os/");
        tokio::fs::write(cache.path(&key), b"{ not json").await.unwrap();

        let loader = CachedLoader::new(counting(), cache, 60);
        let records = loader.load("http://example.com/os/").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(loader.inner.calls.load(Ordering::SeqCst), 1);
    }
}
