// ABOUTME: Name validation for projects, environments, deployments and stages.
// ABOUTME: Each kind has its own character rules; ':' is reserved for deployment paths.

use std::fmt;
use thiserror::Error;

const MAX_NAME_LENGTH: usize = 128;

/// The kind of entity a name belongs to. Determines which characters are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Project,
    Environment,
    Deployment,
    Stage,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NameKind::Project => "project",
            NameKind::Environment => "environment",
            NameKind::Deployment => "deployment",
            NameKind::Stage => "stage",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("{kind} name cannot be empty")]
    Empty { kind: NameKind },

    #[error("{kind} name exceeds maximum length of {MAX_NAME_LENGTH} characters")]
    TooLong { kind: NameKind },

    #[error("{kind} name '{name}' cannot start with '{found}'")]
    InvalidStart {
        kind: NameKind,
        name: String,
        found: char,
    },

    #[error("invalid character in {kind} name '{name}': '{found}'")]
    InvalidChar {
        kind: NameKind,
        name: String,
        found: char,
    },
}

impl NameKind {
    /// Check `value` against the naming rule for this kind.
    ///
    /// Projects, environments and stages must start with a letter and may contain
    /// letters, digits, `-` and `_`. Deployment names additionally allow `.` and `/`
    /// (dependency deployments are named after versionless release ids such as
    /// `_/archive`) and may start with a digit or `_`.
    pub fn validate(self, value: &str) -> Result<(), NameError> {
        let mut chars = value.chars();
        let first = chars.next().ok_or(NameError::Empty { kind: self })?;

        if value.len() > MAX_NAME_LENGTH {
            return Err(NameError::TooLong { kind: self });
        }

        let valid_start = match self {
            NameKind::Deployment => first.is_ascii_alphanumeric() || first == '_',
            _ => first.is_ascii_alphabetic(),
        };
        if !valid_start {
            return Err(NameError::InvalidStart {
                kind: self,
                name: value.to_string(),
                found: first,
            });
        }

        for c in chars {
            if !self.allows(c) {
                return Err(NameError::InvalidChar {
                    kind: self,
                    name: value.to_string(),
                    found: c,
                });
            }
        }

        Ok(())
    }

    fn allows(self, c: char) -> bool {
        let base = c.is_ascii_alphanumeric() || c == '-' || c == '_';
        match self {
            NameKind::Deployment => base || c == '.' || c == '/',
            _ => base,
        }
    }
}
