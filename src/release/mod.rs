// ABOUTME: Release metadata consumed by the state compiler and the resolvers that load it.
// ABOUTME: Metadata is read-only here; it is produced by whatever packages releases.

mod metadata;
mod resolver;

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ReleaseIdError;

pub use metadata::{ConsumerConfig, DependencyConfig, ReleaseMetadata, VariableSpec};
pub use resolver::{DependencyResolver, DirectoryResolver, compare_versions};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("release '{0}' could not be found")]
    NotFound(String),

    #[error(transparent)]
    InvalidReference(#[from] ReleaseIdError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid release metadata: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid release metadata: {0}")]
    Json(#[from] serde_json::Error),
}
