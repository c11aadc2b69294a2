// ABOUTME: A named logical environment (dev, staging, ...) inside a project.
// ABOUTME: Owns default inputs and root deployments; resolves deployment paths and providers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::deployment::DeploymentState;
use super::error::StateError;
use super::Inputs;
use crate::types::{DeploymentAddress, NameKind, PATH_SEPARATOR};

/// Stage whose committed `provides` list advertises interfaces.
pub const DEPLOY_STAGE: &str = "deploy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentState {
    name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    inputs: Inputs,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    deployments: BTreeMap<String, DeploymentState>,

    #[serde(skip)]
    project: String,
}

impl EnvironmentState {
    pub fn new(project: &str, name: &str) -> Result<Self, StateError> {
        NameKind::Environment
            .validate(name)
            .map_err(StateError::InvalidEnvironmentName)?;
        Ok(Self {
            name: name.to_string(),
            inputs: Inputs::new(),
            deployments: BTreeMap::new(),
            project: project.to_string(),
        })
    }

    /// Validate names recursively and re-parent everything to `project`.
    pub(crate) fn attach(&mut self, project: &str) -> Result<(), StateError> {
        NameKind::Environment
            .validate(&self.name)
            .map_err(StateError::InvalidEnvironmentName)?;
        self.project = project.to_string();
        for (name, deployment) in self.deployments.iter_mut() {
            deployment.attach(project, &self.name, DeploymentAddress::root(name))?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_name(&self) -> &str {
        &self.project
    }

    /// Project-wide default inputs for every deployment in this environment.
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn set_input(&mut self, key: &str, value: serde_json::Value) {
        self.inputs.insert(key.to_string(), value);
    }

    /// Root deployments in name order.
    pub fn deployments(&self) -> impl Iterator<Item = &DeploymentState> {
        self.deployments.values()
    }

    pub fn deployment_names(&self) -> impl Iterator<Item = &str> {
        self.deployments.keys().map(String::as_str)
    }

    pub fn get_deployment_state(&self, name: &str) -> Option<&DeploymentState> {
        self.deployments.get(name)
    }

    pub fn get_or_create_deployment_state(
        &mut self,
        name: &str,
    ) -> Result<&mut DeploymentState, StateError> {
        if !self.deployments.contains_key(name) {
            let mut deployment = DeploymentState::new(name, None)?;
            deployment.attach(&self.project, &self.name, DeploymentAddress::root(name))?;
            tracing::debug!("Created deployment {} in environment {}", name, self.name);
            self.deployments.insert(name.to_string(), deployment);
        }
        self.deployments
            .get_mut(name)
            .ok_or_else(|| StateError::DeploymentNotFound(name.to_string()))
    }

    /// Remove a root deployment and everything nested below it.
    pub fn delete_deployment(&mut self, name: &str) -> Result<DeploymentState, StateError> {
        self.deployments
            .remove(name)
            .ok_or_else(|| StateError::DeploymentNotFound(name.to_string()))
    }

    /// The deployments from the root down to `address`, each paired with the stage
    /// that leads to the next one (`None` for the addressed deployment itself).
    pub fn lineage<'s, 'a>(
        &'s self,
        address: &'a DeploymentAddress,
    ) -> Result<Vec<(&'s DeploymentState, Option<&'a str>)>, StateError> {
        let not_found = |segment: &str| StateError::DeploymentPathNotFound {
            path: address.to_string(),
            segment: segment.to_string(),
        };

        let mut current = self
            .deployments
            .get(address.root_name())
            .ok_or_else(|| not_found(address.root_name()))?;
        let mut lineage = Vec::with_capacity(address.depth() + 1);

        for (stage, name) in address.hops() {
            lineage.push((current, Some(stage)));
            current = current
                .stage(stage)
                .and_then(|s| s.deployment(name))
                .ok_or_else(|| not_found(name))?;
        }
        lineage.push((current, None));
        Ok(lineage)
    }

    pub fn deployment(&self, address: &DeploymentAddress) -> Result<&DeploymentState, StateError> {
        let lineage = self.lineage(address)?;
        lineage
            .last()
            .map(|(deployment, _)| *deployment)
            .ok_or_else(|| StateError::DeploymentNotFound(address.to_string()))
    }

    pub fn deployment_mut(
        &mut self,
        address: &DeploymentAddress,
    ) -> Result<&mut DeploymentState, StateError> {
        let not_found = |segment: &str| StateError::DeploymentPathNotFound {
            path: address.to_string(),
            segment: segment.to_string(),
        };

        let mut current = self
            .deployments
            .get_mut(address.root_name())
            .ok_or_else(|| not_found(address.root_name()))?;
        for (stage, name) in address.hops() {
            current = current
                .stage_mut(stage)
                .and_then(|s| s.deployment_mut(name))
                .ok_or_else(|| not_found(name))?;
        }
        Ok(current)
    }

    /// Resolve a colon-separated deployment path.
    ///
    /// The first segment names a root deployment. The second is looked up under
    /// `stage` of the root; any further segments are looked up under the deploy
    /// stage of their parent.
    pub fn resolve_deployment_path(
        &self,
        path: &str,
        stage: &str,
    ) -> Result<DeploymentAddress, StateError> {
        let not_found = |segment: &str| StateError::DeploymentPathNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut segments = path.split(PATH_SEPARATOR);
        let root = segments.next().unwrap_or(path);
        let mut current = self.deployments.get(root).ok_or_else(|| not_found(root))?;
        let mut address = DeploymentAddress::root(root);
        let mut stage = stage;

        for segment in segments {
            current = current
                .stage(stage)
                .and_then(|s| s.deployment(segment))
                .ok_or_else(|| not_found(segment))?;
            address = address.child(stage, segment);
            stage = DEPLOY_STAGE;
        }
        Ok(address)
    }

    /// Interface name -> root deployments whose deploy stage currently provides it.
    pub fn get_providers(&self) -> BTreeMap<String, Vec<String>> {
        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, deployment) in &self.deployments {
            if let Some(stage) = deployment.stage(DEPLOY_STAGE) {
                for interface in stage.provides() {
                    result
                        .entry(interface.clone())
                        .or_default()
                        .push(name.clone());
                }
            }
        }
        result
    }

    pub fn get_providers_of_type(&self, interface: &str) -> Vec<String> {
        self.get_providers().remove(interface).unwrap_or_default()
    }
}
