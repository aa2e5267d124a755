use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed with code {status}: {url}")]
    Status { status: StatusCode, url: String },

    #[error("Expected application/json but received {0}")]
    UnexpectedContentType(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Distribution tag {dist_tag} is not available for {package}")]
    DistTagNotFound { package: String, dist_tag: String },
}

impl RegistryError {
    /// HTTP status of a rejected request, if that is what failed
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    #[error("Scoped package {name} only supports the latest dist tag, got {dist_tag}")]
    ScopedDistTag { name: String, dist_tag: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CheckError {
    /// HTTP status of the failed registry request, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Registry(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the error comes from the caller's input rather than I/O
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidPackage(_) | Self::ScopedDistTag { .. })
    }
}
