//! Check whether a newer version of a package is published on the npm
//! registry, at most once per interval.
//!
//! ```no_run
//! # async fn run() -> Result<(), update_check::CheckError> {
//! use update_check::{CheckConfig, PackageDescriptor, check_for_update};
//!
//! let package = PackageDescriptor::new("my-cli", "1.2.0");
//! if let Some(update) = check_for_update(&package, Some(CheckConfig::default())).await? {
//!     eprintln!("Update available: {} -> {}", package.version, update.latest);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod package;
pub mod version;

pub use config::{CheckConfig, RegistryConfig, RegistryLocation};
pub use package::{PackageDescriptor, PackageName};
pub use version::checker::{UpdateChecker, UpdateInfo};
pub use version::compare::{compare_versions, is_newer};
pub use version::error::{CacheError, CheckError, RegistryError};

/// Checks the registry configured in the environment for a newer version of
/// `package`, caching the last check time in the temp dir.
pub async fn check_for_update(
    package: &PackageDescriptor,
    config: Option<CheckConfig>,
) -> Result<Option<UpdateInfo>, CheckError> {
    // Reject bad input before building an HTTP client
    package.validate()?;

    let checker = UpdateChecker::from_env()?;
    checker.check(package, &config.unwrap_or_default()).await
}
