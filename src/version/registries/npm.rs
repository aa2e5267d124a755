//! npm registry API implementation

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{FETCH_TIMEOUT_MS, RegistryConfig};
use crate::package::{PackageName, encode_path_segment};
use crate::version::error::RegistryError;
use crate::version::registry::Registry;

/// Response of `GET /{name}/{tag}`
#[derive(Debug, Deserialize)]
struct TagResponse {
    version: Option<String>,
}

/// The subset of a full package document needed to resolve a dist tag
#[derive(Debug, Deserialize)]
struct PackumentResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
}

/// Registry implementation for the npm registry API
///
/// Unscoped packages are resolved through the dist tag endpoint
/// (`/{name}/{tag}`). Scoped packages do not support that endpoint, so their
/// full document is fetched and the tag looked up in `dist-tags`.
pub struct NpmRegistry {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl NpmRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("update-check/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(FETCH_TIMEOUT_MS))
            .build()?;

        Ok(Self { client, config })
    }

    /// Creates a registry client configured from npm environment variables
    pub fn from_env() -> Result<Self, RegistryError> {
        Self::new(RegistryConfig::from_env())
    }

    fn url_for(base_url: &str, package: &PackageName, dist_tag: &str) -> String {
        if package.is_scoped() {
            format!("{}/{}", base_url, package.encoded())
        } else {
            format!(
                "{}/{}/{}",
                base_url,
                package.encoded(),
                encode_path_segment(dist_tag)
            )
        }
    }

    async fn get_json(&self, url: &str, token: Option<&str>) -> Result<Vec<u8>, RegistryError> {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("npm registry returned status {}: {}", status, url);
            return Err(RegistryError::Status {
                status,
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("<none>")
            .to_string();
        if !content_type.starts_with("application/json") {
            warn!("npm registry returned {} for {}", content_type, url);
            return Err(RegistryError::UnexpectedContentType(content_type));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl Registry for NpmRegistry {
    async fn fetch_latest(
        &self,
        package: &PackageName,
        dist_tag: &str,
    ) -> Result<String, RegistryError> {
        let location = self.config.locate(package.scope());
        let url = Self::url_for(&location.base_url, package, dist_tag);
        let body = self.get_json(&url, location.token.as_deref()).await?;

        let parse_error = |e: serde_json::Error| {
            warn!("Failed to parse npm registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        };

        if package.is_scoped() {
            let packument: PackumentResponse = serde_json::from_slice(&body).map_err(parse_error)?;
            return packument
                .dist_tags
                .get(dist_tag)
                .cloned()
                .ok_or_else(|| RegistryError::DistTagNotFound {
                    package: package.full_name(),
                    dist_tag: dist_tag.to_string(),
                });
        }

        let tagged: TagResponse = serde_json::from_slice(&body).map_err(parse_error)?;
        tagged.version.ok_or_else(|| {
            RegistryError::InvalidResponse(format!("no version field in response for {}", package))
        })
    }
}
