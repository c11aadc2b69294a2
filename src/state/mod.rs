// ABOUTME: Persisted deployment state: project, environments, deployments and stages.
// ABOUTME: Also hosts the status machine, the provider graph and the storage backend.

mod backend;
mod deployment;
mod environment;
mod error;
mod graph;
mod project;
mod stage;
mod status;

use std::collections::BTreeMap;

pub use backend::{Backend, BackendError, LocalBackend};
pub use deployment::DeploymentState;
pub use environment::{DEPLOY_STAGE, EnvironmentState};
pub use error::StateError;
pub use graph::{DagNode, DeploymentDag};
pub use project::ProjectState;
pub use stage::StageState;
pub use status::{Status, StatusCode, status_transition_allowed};

/// Free-form key/value inputs and outputs.
pub type Inputs = BTreeMap<String, serde_json::Value>;
