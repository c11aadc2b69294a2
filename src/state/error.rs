// ABOUTME: Error types for the deployment state model and provider graph.
// ABOUTME: Covers name validation, lookups, graph construction and status transitions.

use thiserror::Error;

use super::backend::BackendError;
use super::status::StatusCode;
use crate::types::NameError;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("project name is required")]
    MissingProjectName,

    #[error("invalid project name: {0}")]
    InvalidProjectName(NameError),

    #[error("invalid environment name: {0}")]
    InvalidEnvironmentName(NameError),

    #[error("invalid deployment name: {0}")]
    InvalidDeploymentName(NameError),

    #[error("invalid stage name: {0}")]
    InvalidStageName(NameError),

    #[error("environment '{0}' not found")]
    EnvironmentNotFound(String),

    #[error("deployment '{0}' not found")]
    DeploymentNotFound(String),

    /// A segment of a colon-separated deployment path does not exist.
    #[error("deployment path '{path}' could not be resolved: no deployment '{segment}'")]
    DeploymentPathNotFound { path: String, segment: String },

    #[error(
        "deployment '{consumer}' uses provider '{provider}', which does not exist in environment '{environment}'"
    )]
    ProviderNotFound {
        consumer: String,
        provider: String,
        environment: String,
    },

    #[error("deployment '{0}' is configured as its own provider")]
    SelfProvider(String),

    #[error("circular provider dependency: {}", .0.join(" -> "))]
    CircularProviderDependency(Vec<String>),

    #[error("illegal status transition from {from} to {to}")]
    IllegalStatusTransition { from: StatusCode, to: StatusCode },

    #[error("project has no state backend configured")]
    NoBackend,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("invalid state document: {0}")]
    Json(#[from] serde_json::Error),
}
