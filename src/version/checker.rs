//! Update check orchestration: gate, fetch, compare

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{CheckConfig, DEFAULT_DIST_TAG};
use crate::package::PackageDescriptor;
use crate::version::cache::{CacheKey, CacheRecord, CacheStorage, FileCache};
use crate::version::clock::{Clock, SystemClock};
use crate::version::compare::is_newer;
use crate::version::error::CheckError;
use crate::version::gate::{CacheGate, GateDecision};
use crate::version::registries::NpmRegistry;
use crate::version::registry::Registry;

/// A newer version than the installed one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Version published under the requested dist tag
    pub latest: String,
    /// Whether `latest` comes from the local cache instead of the registry
    pub from_cache: bool,
}

/// Checks a registry for newer versions, at most once per interval
pub struct UpdateChecker {
    registry: Arc<dyn Registry>,
    storage: Arc<dyn CacheStorage>,
    gate: CacheGate,
}

impl UpdateChecker {
    pub fn new(
        registry: Arc<dyn Registry>,
        storage: Arc<dyn CacheStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            gate: CacheGate::new(storage.clone(), clock),
            storage,
        }
    }

    /// Checker backed by the npm registry from the environment, a file cache
    /// in the temp dir and the system clock
    pub fn from_env() -> Result<Self, CheckError> {
        Ok(Self::new(
            Arc::new(NpmRegistry::from_env()?),
            Arc::new(FileCache::default()),
            Arc::new(SystemClock),
        ))
    }

    /// Returns the newer version if one is published, or `None` when the
    /// installed version is current or the check is not due yet.
    pub async fn check(
        &self,
        package: &PackageDescriptor,
        config: &CheckConfig,
    ) -> Result<Option<UpdateInfo>, CheckError> {
        let name = package.validate()?;

        if name.is_scoped()
            && let Some(dist_tag) = config.dist_tag.as_deref()
            && dist_tag != DEFAULT_DIST_TAG
        {
            return Err(CheckError::ScopedDistTag {
                name: name.full_name(),
                dist_tag: dist_tag.to_string(),
            });
        }

        let dist_tag = config.effective_dist_tag();
        let key = CacheKey::new(&name, dist_tag);

        let checked_at = match self.gate.evaluate(&key, config.interval).await {
            GateDecision::Proceed { checked_at } => checked_at,
            GateDecision::Skip { cached_latest } => {
                if !config.use_cached_latest {
                    return Ok(None);
                }
                return Ok(cached_latest
                    .filter(|latest| is_newer(&package.version, latest))
                    .map(|latest| UpdateInfo {
                        latest,
                        from_cache: true,
                    }));
            }
        };

        let latest = self.registry.fetch_latest(&name, dist_tag).await?;
        debug!("Registry reports {}@{} = {}", name, dist_tag, latest);

        let record = CacheRecord::checked_at(checked_at).with_latest(latest.clone());
        if let Err(e) = self.storage.set(&key, &record).await {
            warn!("Failed to cache latest version for {}: {}", key, e);
        }

        if !is_newer(&package.version, &latest) {
            return Ok(None);
        }

        info!(
            "Update available for {}: {} -> {}",
            name, package.version, latest
        );
        Ok(Some(UpdateInfo {
            latest,
            from_cache: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageName;
    use crate::version::cache::MemoryCache;
    use crate::version::clock::ManualClock;
    use crate::version::error::RegistryError;
    use crate::version::registry::MockRegistry;
    use reqwest::StatusCode;
    use rstest::rstest;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn registry_returning(version: &'static str, times: usize) -> MockRegistry {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_latest()
            .times(times)
            .returning(move |_, _| Ok(version.to_string()));
        registry
    }

    fn checker_with(registry: MockRegistry, storage: Arc<MemoryCache>) -> UpdateChecker {
        UpdateChecker::new(
            Arc::new(registry),
            storage,
            Arc::new(ManualClock::new(10_000)),
        )
    }

    fn config() -> CheckConfig {
        CheckConfig::default().with_interval(HOUR_MS)
    }

    #[rstest]
    #[case("1.0.0", "1.2.0", Some("1.2.0"))]
    #[case("2.0.0", "1.9.9", None)]
    #[case("1.2.0", "1.2.0", None)]
    #[case("1.0.9", "1.0.10", Some("1.0.10"))]
    #[tokio::test]
    async fn check_reports_only_strictly_newer_versions(
        #[case] current: &str,
        #[case] remote: &'static str,
        #[case] expected: Option<&str>,
    ) {
        let checker = checker_with(registry_returning(remote, 1), Arc::new(MemoryCache::new()));

        let result = checker
            .check(&PackageDescriptor::new("lodash", current), &config())
            .await
            .unwrap();

        assert_eq!(
            result,
            expected.map(|latest| UpdateInfo {
                latest: latest.to_string(),
                from_cache: false,
            })
        );
    }

    #[tokio::test]
    async fn check_returns_none_without_fetching_when_gate_denies() {
        let storage = Arc::new(MemoryCache::new());
        let key = CacheKey::new(&PackageName::parse("lodash").unwrap(), "latest");
        storage
            .set(&key, &CacheRecord::checked_at(9_000).with_latest("9.9.9"))
            .await
            .unwrap();
        let checker = checker_with(registry_returning("9.9.9", 0), storage);

        let result = checker
            .check(&PackageDescriptor::new("lodash", "1.0.0"), &config())
            .await
            .unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn check_reports_cached_latest_when_enabled_and_gate_denies() {
        let storage = Arc::new(MemoryCache::new());
        let checker = checker_with(registry_returning("1.5.0", 1), storage);
        let package = PackageDescriptor::new("lodash", "1.0.0");
        let config = config().with_cached_latest(true);

        let first = checker.check(&package, &config).await.unwrap();
        let second = checker.check(&package, &config).await.unwrap();

        assert_eq!(
            first,
            Some(UpdateInfo {
                latest: "1.5.0".to_string(),
                from_cache: false
            })
        );
        assert_eq!(
            second,
            Some(UpdateInfo {
                latest: "1.5.0".to_string(),
                from_cache: true
            })
        );
    }

    #[tokio::test]
    async fn check_persists_fetched_version_with_gate_timestamp() {
        let storage = Arc::new(MemoryCache::new());
        let checker = checker_with(registry_returning("2.0.0", 1), storage.clone());

        checker
            .check(&PackageDescriptor::new("@acme/cli", "1.0.0"), &config())
            .await
            .unwrap();

        let key = CacheKey::new(
            &PackageName::parse("@acme/cli").unwrap(),
            "latest",
        );
        assert_eq!(
            storage.get(&key).await.unwrap(),
            Some(CacheRecord::checked_at(10_000).with_latest("2.0.0"))
        );
    }

    #[tokio::test]
    async fn check_passes_name_and_dist_tag_to_registry() {
        let mut registry = MockRegistry::new();
        registry
            .expect_fetch_latest()
            .withf(|package, dist_tag| {
                package.full_name() == "next" && dist_tag.to_string() == "canary"
            })
            .times(1)
            .returning(|_, _| Ok("15.0.0-canary.1".to_string()));
        let checker = checker_with(registry, Arc::new(MemoryCache::new()));

        let result = checker
            .check(
                &PackageDescriptor::new("next", "14.2.0"),
                &config().with_dist_tag("canary"),
            )
            .await
            .unwrap();

        assert_eq!(result.map(|info| info.latest), Some("15.0.0-canary.1".to_string()));
    }

    #[rstest]
    #[case("beta")]
    #[case("next")]
    #[tokio::test]
    async fn check_rejects_dist_tag_for_scoped_package_before_any_io(#[case] dist_tag: &str) {
        let storage = Arc::new(MemoryCache::new());
        let checker = checker_with(registry_returning("9.9.9", 0), storage.clone());

        let err = checker
            .check(
                &PackageDescriptor::new("@scope/pkg", "1.0.0"),
                &config().with_dist_tag(dist_tag),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::ScopedDistTag { .. }));
        assert!(err.is_config_error());
        let key = CacheKey::new(
            &PackageName::parse("@scope/pkg").unwrap(),
            dist_tag,
        );
        assert_eq!(storage.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn check_allows_explicit_latest_for_scoped_package() {
        let checker = checker_with(registry_returning("1.1.0", 1), Arc::new(MemoryCache::new()));

        let result = checker
            .check(
                &PackageDescriptor::new("@scope/pkg", "1.0.0"),
                &config().with_dist_tag("latest"),
            )
            .await
            .unwrap();

        assert!(result.is_some());
    }

    #[rstest]
    #[case("", "1.0.0")]
    #[case("lodash", "")]
    #[case("@scope", "1.0.0")]
    #[tokio::test]
    async fn check_rejects_invalid_descriptor(#[case] name: &str, #[case] version: &str) {
        let checker = checker_with(registry_returning("1.0.0", 0), Arc::new(MemoryCache::new()));

        let err = checker
            .check(&PackageDescriptor::new(name, version), &config())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::InvalidPackage(_)));
    }

    #[tokio::test]
    async fn check_propagates_registry_status_errors() {
        let mut registry = MockRegistry::new();
        registry.expect_fetch_latest().times(1).returning(|_, _| {
            Err(RegistryError::Status {
                status: StatusCode::FORBIDDEN,
                url: "https://registry.npmjs.org/private/latest".to_string(),
            })
        });
        let checker = checker_with(registry, Arc::new(MemoryCache::new()));

        let err = checker
            .check(&PackageDescriptor::new("private", "1.0.0"), &config())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(!err.is_config_error());
    }
}
