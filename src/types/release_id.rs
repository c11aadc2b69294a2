// ABOUTME: Release reference parsing and validation.
// ABOUTME: Handles formats like name-v1.0, project/name-v1.@ and project/name-latest.

use std::fmt;
use thiserror::Error;

/// Project used when a release reference does not name one.
pub const DEFAULT_PROJECT: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseIdError {
    #[error("release reference cannot be empty")]
    Empty,

    #[error("invalid character in release reference '{reference}': '{found}'")]
    InvalidChar { reference: String, found: char },

    #[error("release reference '{0}' is missing a version (expected name-v<version> or name-latest)")]
    MissingVersion(String),

    #[error("invalid release reference format: {0}")]
    InvalidFormat(String),
}

/// A reference to a release: project, name and an optional version.
///
/// A missing version means "latest". Versions may end in `@` to track the newest
/// release below a prefix, e.g. `1.@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseId {
    project: String,
    name: String,
    version: Option<String>,
}

impl ReleaseId {
    pub fn new(project: &str, name: &str, version: Option<&str>) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
            version: version.map(str::to_string),
        }
    }

    pub fn parse(input: &str) -> Result<Self, ReleaseIdError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ReleaseIdError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric() && !matches!(c, '/' | '.' | '-' | '_' | '@') {
                return Err(ReleaseIdError::InvalidChar {
                    reference: input.to_string(),
                    found: c,
                });
            }
        }

        let (project, rest) = match input.split_once('/') {
            Some((project, rest)) => (project, rest),
            None => (DEFAULT_PROJECT, input),
        };
        if project.is_empty() || rest.contains('/') {
            return Err(ReleaseIdError::InvalidFormat(input.to_string()));
        }

        if let Some(name) = rest.strip_suffix("-latest") {
            return Self::checked(input, project, name, None);
        }

        let (name, version) = rest
            .rmatch_indices("-v")
            .find_map(|(idx, _)| {
                let version = &rest[idx + 2..];
                version
                    .starts_with(|c: char| c.is_ascii_digit() || c == '@')
                    .then(|| (&rest[..idx], version))
            })
            .ok_or_else(|| ReleaseIdError::MissingVersion(input.to_string()))?;

        Self::checked(input, project, name, Some(version))
    }

    fn checked(
        input: &str,
        project: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<Self, ReleaseIdError> {
        if name.is_empty() {
            return Err(ReleaseIdError::InvalidFormat(input.to_string()));
        }
        Ok(Self::new(project, name, version))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The concrete version, or `None` for `latest`.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `project/name`, used as the identity of a release across versions.
    pub fn versionless(&self) -> String {
        format!("{}/{}", self.project, self.name)
    }

    /// Replace the version, keeping project and name.
    pub fn with_version(&self, version: &str) -> Self {
        Self::new(&self.project, &self.name, Some(version))
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}-v{}", self.project, self.name, version),
            None => write!(f, "{}/{}-latest", self.project, self.name),
        }
    }
}
