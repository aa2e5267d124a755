use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config;
use crate::package::PackageName;
use crate::version::error::CacheError;

/// Distinguishes temporary files of concurrent writes within one process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Key of a cache record: the encoded package name plus the dist tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(package: &PackageName, dist_tag: &str) -> Self {
        Self(format!("{}@{}", package.encoded(), dist_tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the record; bytes outside `[A-Za-z0-9._@-]` are
    /// percent-encoded so distinct keys never share a file
    fn file_name(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for byte in self.0.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'@' | b'-' => {
                    stem.push(byte as char)
                }
                _ => stem.push_str(&format!("%{:02X}", byte)),
            }
        }
        format!("{}.json", stem)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted state of the last check for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// Time of the last permitted check in milliseconds since the UNIX epoch
    pub last_check: i64,
    /// Latest version seen at that check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

impl CacheRecord {
    pub fn checked_at(last_check: i64) -> Self {
        Self {
            last_check,
            latest: None,
        }
    }

    pub fn with_latest(mut self, latest: impl Into<String>) -> Self {
        self.latest = Some(latest.into());
        self
    }
}

/// Key-value store for cache records
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError>;

    /// Overwrites the record for `key`
    async fn set(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError>;
}

/// Stores each record as a small JSON file in a shared directory
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl Default for FileCache {
    /// Uses `<temp dir>/update-check`
    fn default() -> Self {
        Self::new(config::cache_dir())
    }
}

#[async_trait::async_trait]
impl CacheStorage for FileCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.path_for(key);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_slice(&content)?;
        Ok(Some(record))
    }

    async fn set(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let content = serde_json::to_vec(record)?;

        // Write next to the target and rename so readers never see a partial record
        let tmp_path = path.with_extension(format!(
            "json.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        tokio::fs::write(&tmp_path, &content).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("Saved cache record for {} at {:?}", key, path);
        Ok(())
    }
}

/// In-memory record store, useful for tests and short-lived processes
#[derive(Default)]
pub struct MemoryCache {
    records: Mutex<HashMap<CacheKey, CacheRecord>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, CacheRecord>>, CacheError> {
        self.records.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheRecord>, CacheError> {
        Ok(self.lock_records()?.get(key).cloned())
    }

    async fn set(&self, key: &CacheKey, record: &CacheRecord) -> Result<(), CacheError> {
        self.lock_records()?.insert(key.clone(), record.clone());
        Ok(())
    }
}
