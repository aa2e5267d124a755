//! Registry trait for fetching the latest published version of a package

#[cfg(test)]
use mockall::automock;

use crate::package::PackageName;
use crate::version::error::RegistryError;

/// Trait for fetching the version a registry publishes under a dist tag
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches the version currently pointed to by `dist_tag`
    ///
    /// # Arguments
    /// * `package` - The validated package name (e.g., "@types/node")
    /// * `dist_tag` - The distribution tag (e.g., "latest")
    ///
    /// # Returns
    /// * `Ok(String)` - The published version string
    /// * `Err(RegistryError)` - If the request or the response is invalid
    async fn fetch_latest(
        &self,
        package: &PackageName,
        dist_tag: &str,
    ) -> Result<String, RegistryError>;
}
