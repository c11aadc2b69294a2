// ABOUTME: Root of the persisted state: a named project with its environments.
// ABOUTME: Holds the pluggable backend that deployment saves are delegated to.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::Backend;
use super::deployment::DeploymentState;
use super::environment::EnvironmentState;
use super::error::StateError;
use crate::types::{DeploymentAddress, NameKind};

#[derive(Clone, Serialize, Deserialize)]
pub struct ProjectState {
    name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    environments: BTreeMap<String, EnvironmentState>,

    #[serde(skip)]
    backend: Option<Arc<dyn Backend>>,
}

impl std::fmt::Debug for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectState")
            .field("name", &self.name)
            .field("environments", &self.environments)
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}

impl ProjectState {
    pub fn new(name: &str) -> Result<Self, StateError> {
        let mut project = Self {
            name: name.to_string(),
            environments: BTreeMap::new(),
            backend: None,
        };
        project.validate_and_fix()?;
        Ok(project)
    }

    /// Load a project from its JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let mut project: ProjectState = serde_json::from_str(json)?;
        project.validate_and_fix()?;
        Ok(project)
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every name depth-first and re-parent every environment and
    /// deployment to this project.
    pub fn validate_and_fix(&mut self) -> Result<(), StateError> {
        if self.name.is_empty() {
            return Err(StateError::MissingProjectName);
        }
        NameKind::Project
            .validate(&self.name)
            .map_err(StateError::InvalidProjectName)?;
        for environment in self.environments.values_mut() {
            environment.attach(&self.name)?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backend = Some(backend);
    }

    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentState> {
        self.environments.get(name)
    }

    pub fn environment_mut(&mut self, name: &str) -> Option<&mut EnvironmentState> {
        self.environments.get_mut(name)
    }

    pub fn get_or_create_environment(
        &mut self,
        name: &str,
    ) -> Result<&mut EnvironmentState, StateError> {
        if !self.environments.contains_key(name) {
            let environment = EnvironmentState::new(&self.name, name)?;
            self.environments.insert(name.to_string(), environment);
        }
        self.environments
            .get_mut(name)
            .ok_or_else(|| StateError::EnvironmentNotFound(name.to_string()))
    }

    /// Persist the deployment at `address` in `environment`.
    pub fn save(&self, environment: &str, address: &DeploymentAddress) -> Result<(), StateError> {
        let deployment = self
            .environment(environment)
            .ok_or_else(|| StateError::EnvironmentNotFound(environment.to_string()))?
            .deployment(address)?;
        self.save_deployment(deployment)
    }

    pub(crate) fn save_deployment(&self, deployment: &DeploymentState) -> Result<(), StateError> {
        let backend = self.backend.as_ref().ok_or(StateError::NoBackend)?;
        backend.save(self, deployment)?;
        Ok(())
    }
}
