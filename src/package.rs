//! Package descriptor and name handling

use serde::Deserialize;

use crate::version::error::CheckError;

/// The package whose updates are checked: its name and installed version
///
/// Deserializes from `package.json` content; unrelated fields are ignored.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
}

impl PackageDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parses a `package.json` document.
    pub fn from_manifest(manifest: &str) -> Result<Self, CheckError> {
        let descriptor: Self = serde_json::from_str(manifest)
            .map_err(|e| CheckError::InvalidPackage(format!("invalid manifest: {}", e)))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Checks that name and version are usable and returns the parsed name.
    pub fn validate(&self) -> Result<PackageName, CheckError> {
        if self.version.trim().is_empty() {
            return Err(CheckError::InvalidPackage(format!(
                "package {:?} has an empty version",
                self.name
            )));
        }
        PackageName::parse(&self.name)
    }
}

/// A validated package name, split into scope and bare name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageName {
    scope: Option<String>,
    name: String,
}

impl PackageName {
    /// Parses `name` or `@scope/name`.
    pub fn parse(full: &str) -> Result<Self, CheckError> {
        let invalid = |reason: &str| CheckError::InvalidPackage(format!("{:?}: {}", full, reason));

        if full.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if full.chars().any(char::is_whitespace) {
            return Err(invalid("name contains whitespace"));
        }

        if let Some(rest) = full.strip_prefix('@') {
            let Some((scope, name)) = rest.split_once('/') else {
                return Err(invalid("scoped name must look like @scope/name"));
            };
            if scope.is_empty() || name.is_empty() || name.contains('/') {
                return Err(invalid("scoped name must look like @scope/name"));
            }
            return Ok(Self {
                scope: Some(format!("@{}", scope)),
                name: name.to_string(),
            });
        }

        if full.contains('/') {
            return Err(invalid("unscoped name must not contain '/'"));
        }

        Ok(Self {
            scope: None,
            name: full.to_string(),
        })
    }

    /// The scope including its leading `@`, if any
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The name without scope
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    /// The full `@scope/name` form
    pub fn full_name(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}/{}", scope, self.name),
            None => self.name.clone(),
        }
    }

    /// Encodes the name as a single registry path segment
    /// (`@types/node` -> `@types%2Fnode`).
    pub fn encoded(&self) -> String {
        encode_path_segment(&self.full_name())
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Percent-encodes everything outside the URI unreserved set, keeping a
/// leading `@` literal so scoped names stay readable.
pub fn encode_path_segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());

    for (i, byte) in value.bytes().enumerate() {
        match byte {
            b'@' if i == 0 => encoded.push('@'),
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*'
            | b'\'' | b'(' | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    encoded
}
