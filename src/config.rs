use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default interval between two registry checks in milliseconds (24 hours)
pub const DEFAULT_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Registry-related constants
// =============================================================================

/// Distribution tag used when none is configured
pub const DEFAULT_DIST_TAG: &str = "latest";

/// Default base URL for the npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Name of the directory holding cache records inside the temp dir
pub const CACHE_DIR_NAME: &str = "update-check";

/// Update check configuration
///
/// Deserializes from the same camelCase keys the JavaScript tooling uses
/// (`interval`, `distTag`), so a config object can be passed through as-is.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    /// Minimum time between two registry checks in milliseconds
    pub interval: u64,
    /// Distribution tag to compare against; `None` means [`DEFAULT_DIST_TAG`]
    pub dist_tag: Option<String>,
    /// Report the last fetched version while the check is skipped
    pub use_cached_latest: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MS,
            dist_tag: None,
            use_cached_latest: false,
        }
    }
}

impl CheckConfig {
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval = interval_ms;
        self
    }

    pub fn with_dist_tag(mut self, dist_tag: impl Into<String>) -> Self {
        self.dist_tag = Some(dist_tag.into());
        self
    }

    pub fn with_cached_latest(mut self, enabled: bool) -> Self {
        self.use_cached_latest = enabled;
        self
    }

    /// The dist tag to query, falling back to [`DEFAULT_DIST_TAG`].
    pub fn effective_dist_tag(&self) -> &str {
        self.dist_tag.as_deref().unwrap_or(DEFAULT_DIST_TAG)
    }
}

/// Location and credential of a single registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryLocation {
    pub base_url: String,
    pub token: Option<String>,
}

impl RegistryLocation {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl Default for RegistryLocation {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL)
    }
}

/// Registry locations keyed by package scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    pub default: RegistryLocation,
    /// Scope (including the leading `@`) -> location
    pub scoped: HashMap<String, RegistryLocation>,
}

impl RegistryConfig {
    /// Reads registry settings from the process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_env() -> Self {
        Self::from_vars(utf8_vars(std::env::vars_os()))
    }

    /// Builds the configuration from npm-style environment variables:
    ///
    /// - `npm_config_registry`: default registry
    /// - `npm_config_@scope:registry`: registry for one scope
    /// - `npm_config_//host/path/:_authToken`: bearer token for the registry
    ///   at that host and path
    /// - `NPM_TOKEN`: bearer token for the default registry when no
    ///   host-specific token matches it
    ///
    /// The `npm_config_` prefix is matched case-insensitively.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        let mut fallback_token = None;
        let mut auth_tokens = HashMap::new();

        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            if value.is_empty() {
                continue;
            }

            if key == "NPM_TOKEN" {
                fallback_token = Some(value.to_string());
                continue;
            }

            let Some(setting) = strip_npm_config_prefix(key) else {
                continue;
            };

            if setting.eq_ignore_ascii_case("registry") {
                config.default.base_url = value.trim_end_matches('/').to_string();
            } else if let Some(registry) = setting
                .strip_suffix(":_authToken")
                .filter(|registry| registry.starts_with("//"))
            {
                auth_tokens.insert(registry.trim_end_matches('/').to_string(), value.to_string());
            } else if let Some(scope) = setting
                .strip_suffix(":registry")
                .filter(|scope| scope.starts_with('@') && scope.len() > 1)
            {
                config
                    .scoped
                    .insert(scope.to_string(), RegistryLocation::new(value));
            }
        }

        config.default.token = registry_token(&auth_tokens, &config.default.base_url)
            .or(fallback_token);
        for location in config.scoped.values_mut() {
            location.token = registry_token(&auth_tokens, &location.base_url);
        }

        config
    }

    /// Resolves the registry serving packages of `scope`.
    pub fn locate(&self, scope: Option<&str>) -> &RegistryLocation {
        scope
            .and_then(|scope| self.scoped.get(scope))
            .unwrap_or(&self.default)
    }
}

/// Keeps the environment entries that are valid UTF-8.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn strip_npm_config_prefix(key: &str) -> Option<&str> {
    const PREFIX: &str = "npm_config_";
    key.get(..PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(PREFIX))
        .map(|_| &key[PREFIX.len()..])
}

/// Looks up the token configured for `base_url`, keyed npm-style by the URL
/// without its scheme (`https://npm.example.com/` -> `//npm.example.com`).
fn registry_token(auth_tokens: &HashMap<String, String>, base_url: &str) -> Option<String> {
    let without_scheme = base_url
        .split_once("//")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let key = format!("//{}", without_scheme.trim_end_matches('/'));
    auth_tokens.get(&key).cloned()
}

/// Returns the directory holding cache records: `<temp dir>/update-check`.
pub fn cache_dir() -> PathBuf {
    cache_dir_in(std::env::temp_dir())
}

fn cache_dir_in(temp_dir: PathBuf) -> PathBuf {
    temp_dir.join(CACHE_DIR_NAME)
}
