//! Registry test utilities

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use update_check::UpdateChecker;
use update_check::package::PackageName;
use update_check::version::cache::FileCache;
use update_check::version::clock::ManualClock;
use update_check::version::error::RegistryError;
use update_check::version::registry::Registry;

/// Registry returning fixed versions and counting every fetch
#[derive(Default)]
pub struct CountingRegistry {
    versions: HashMap<String, String>,
    calls: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest(mut self, package: &str, version: &str) -> Self {
        self.versions
            .insert(package.to_string(), version.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for CountingRegistry {
    async fn fetch_latest(
        &self,
        package: &PackageName,
        dist_tag: &str,
    ) -> Result<String, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.versions
            .get(&package.full_name())
            .cloned()
            .ok_or_else(|| RegistryError::DistTagNotFound {
                package: package.full_name(),
                dist_tag: dist_tag.to_string(),
            })
    }
}

/// Create a checker over `registry` with a file cache in a fresh temp dir
pub fn create_test_checker(
    registry: Arc<dyn Registry>,
    clock: Arc<ManualClock>,
) -> (TempDir, UpdateChecker) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(FileCache::new(temp_dir.path().join("update-check")));
    let checker = UpdateChecker::new(registry, storage, clock);

    (temp_dir, checker)
}
