// ABOUTME: Persistence contract for deployment state and a local JSON file implementation.
// ABOUTME: The core only ever asks a backend to persist one deployment's mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use super::deployment::DeploymentState;
use super::error::StateError;
use super::project::ProjectState;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage for project state.
pub trait Backend: Send + Sync {
    /// Persist a mutation of `deployment`, which belongs to `project`.
    fn save(&self, project: &ProjectState, deployment: &DeploymentState)
    -> Result<(), BackendError>;
}

/// Stores the whole project as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    path: PathBuf,
}

impl LocalBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the project stored at `path`, or start a fresh one named
    /// `project_name` if the file does not exist yet. The returned project
    /// saves back to the same file.
    pub fn open(path: impl Into<PathBuf>, project_name: &str) -> Result<ProjectState, StateError> {
        let backend = Self::new(path);
        let mut project = if backend.path.exists() {
            let content = std::fs::read_to_string(&backend.path).map_err(|source| {
                BackendError::Read {
                    path: backend.path.clone(),
                    source,
                }
            })?;
            ProjectState::from_json(&content)?
        } else {
            tracing::debug!(
                "No state file at {}, starting project {}",
                backend.path.display(),
                project_name
            );
            ProjectState::new(project_name)?
        };
        project.set_backend(Arc::new(backend));
        Ok(project)
    }

    fn write(&self, content: &str) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write to a sibling temp file and rename so a crash never leaves a
        // truncated state file behind.
        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut file, content.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Backend for LocalBackend {
    fn save(
        &self,
        project: &ProjectState,
        deployment: &DeploymentState,
    ) -> Result<(), BackendError> {
        let content = serde_json::to_string_pretty(project)?;
        self.write(&content).map_err(|source| BackendError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(
            "Saved deployment {} to {}",
            deployment.deployment_path(),
            self.path.display()
        );
        Ok(())
    }
}
