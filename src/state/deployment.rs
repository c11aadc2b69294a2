// ABOUTME: State of one (possibly nested) deployment of a release.
// ABOUTME: Resolves inherited inputs and provider wiring by walking its ancestors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::environment::EnvironmentState;
use super::error::StateError;
use super::project::ProjectState;
use super::stage::StageState;
use super::status::Status;
use super::Inputs;
use crate::types::{DeploymentAddress, NameKind};

/// Where a deployment lives. Never persisted; rebuilt when the owning project
/// is loaded or the deployment is created.
#[derive(Debug, Clone, Default, PartialEq)]
struct Location {
    project: String,
    environment: String,
    address: DeploymentAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentState {
    name: String,

    #[serde(default)]
    release: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    stages: BTreeMap<String, StageState>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    inputs: Inputs,

    #[serde(skip)]
    location: Location,
}

impl DeploymentState {
    /// Create a detached deployment. `release` defaults to the deployment name.
    pub fn new(name: &str, release: Option<&str>) -> Result<Self, StateError> {
        NameKind::Deployment
            .validate(name)
            .map_err(StateError::InvalidDeploymentName)?;
        Ok(Self {
            name: name.to_string(),
            release: release.unwrap_or(name).to_string(),
            stages: BTreeMap::new(),
            inputs: Inputs::new(),
            location: Location {
                address: DeploymentAddress::root(name),
                ..Location::default()
            },
        })
    }

    /// Validate this deployment and everything nested below it, and record
    /// where each of them lives.
    pub(crate) fn attach(
        &mut self,
        project: &str,
        environment: &str,
        address: DeploymentAddress,
    ) -> Result<(), StateError> {
        NameKind::Deployment
            .validate(&self.name)
            .map_err(StateError::InvalidDeploymentName)?;
        if self.release.is_empty() {
            self.release = self.name.clone();
        }

        for (stage_name, stage) in self.stages.iter_mut() {
            NameKind::Stage
                .validate(stage_name)
                .map_err(StateError::InvalidStageName)?;
            for child in stage.deployments_mut() {
                let child_address = address.child(stage_name, child.name());
                child.attach(project, environment, child_address)?;
            }
        }

        self.location = Location {
            project: project.to_string(),
            environment: environment.to_string(),
            address,
        };
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versionless release id used to resolve concrete versions.
    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn project_name(&self) -> &str {
        &self.location.project
    }

    pub fn environment_name(&self) -> &str {
        &self.location.environment
    }

    pub fn address(&self) -> &DeploymentAddress {
        &self.location.address
    }

    /// Colon-joined names from the environment's root deployment down to this one.
    pub fn deployment_path(&self) -> String {
        self.location.address.to_string()
    }

    pub fn root_deployment_name(&self) -> &str {
        self.location.address.root_name()
    }

    pub fn is_root(&self) -> bool {
        self.location.address.is_root()
    }

    /// This deployment's own input overrides.
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn set_input(&mut self, key: &str, value: serde_json::Value) {
        self.inputs.insert(key.to_string(), value);
    }

    pub fn stages(&self) -> &BTreeMap<String, StageState> {
        &self.stages
    }

    pub fn stage(&self, stage: &str) -> Option<&StageState> {
        self.stages.get(stage)
    }

    pub fn stage_mut(&mut self, stage: &str) -> Option<&mut StageState> {
        self.stages.get_mut(stage)
    }

    pub fn get_stage_or_create_new(&mut self, stage: &str) -> &mut StageState {
        self.stages.entry(stage.to_string()).or_default()
    }

    /// Get or create the dependency deployment `name` under `stage`.
    pub fn get_or_create_dependency(
        &mut self,
        stage: &str,
        name: &str,
        release: &str,
    ) -> Result<&mut DeploymentState, StateError> {
        NameKind::Stage
            .validate(stage)
            .map_err(StateError::InvalidStageName)?;

        let mut dependency = DeploymentState::new(name, Some(release))?;
        dependency.location = Location {
            project: self.location.project.clone(),
            environment: self.location.environment.clone(),
            address: self.location.address.child(stage, name),
        };

        Ok(self
            .get_stage_or_create_new(stage)
            .get_or_insert_deployment(dependency))
    }

    pub fn calculated_inputs(&self, stage: &str) -> Option<&Inputs> {
        self.stage(stage).map(StageState::calculated_inputs)
    }

    pub fn calculated_outputs(&self, stage: &str) -> Option<&Inputs> {
        self.stage(stage).map(StageState::calculated_outputs)
    }

    /// The committed version for `stage`, empty if none.
    pub fn version(&self, stage: &str) -> &str {
        self.stage(stage).map(StageState::version).unwrap_or("")
    }

    /// Release reference for the version committed in `stage`, or the latest
    /// release if nothing has been committed yet.
    pub fn release_reference(&self, stage: &str) -> String {
        match self.version(stage) {
            "" => format!("{}-latest", self.release),
            version => format!("{}-v{}", self.release, version),
        }
    }

    pub fn is_deployed(&self, stage: &str, version: &str) -> bool {
        self.stage(stage).is_some_and(|s| s.is_deployed(version))
    }

    pub fn commit_version(&mut self, stage: &str, version: &str, provides: Vec<String>) {
        self.get_stage_or_create_new(stage)
            .commit_version(version, provides);
    }

    pub fn status(&self, stage: &str) -> Option<&Status> {
        self.stage(stage).map(StageState::status)
    }

    /// Validated status update for `stage`, creating the stage if needed.
    pub fn update_status(&mut self, stage: &str, status: Status) -> Result<(), StateError> {
        self.get_stage_or_create_new(stage).set_status(status)
    }

    /// Inputs visible before running `stage`.
    ///
    /// Applied root to leaf so the closest value wins: environment defaults, then
    /// for every deployment on the path its own inputs followed by the user
    /// inputs of the stage leading down (or of `stage` itself for this one).
    pub fn pre_step_inputs(
        &self,
        env: &EnvironmentState,
        stage: &str,
    ) -> Result<Inputs, StateError> {
        let mut result = env.inputs().clone();
        for (deployment, via) in env.lineage(self.address())? {
            result.extend(deployment.inputs.clone());
            if let Some(stage_state) = deployment.stage(via.unwrap_or(stage)) {
                result.extend(stage_state.user_inputs().clone());
            }
        }
        Ok(result)
    }

    /// Provider wiring for `stage`. This deployment's own entries win; unset
    /// variables fall through to the nearest ancestor stage that defines them.
    pub fn providers(
        &self,
        env: &EnvironmentState,
        stage: &str,
    ) -> Result<BTreeMap<String, String>, StateError> {
        let mut result = BTreeMap::new();
        for (deployment, via) in env.lineage(self.address())?.into_iter().rev() {
            if let Some(stage_state) = deployment.stage(via.unwrap_or(stage)) {
                for (variable, provider) in stage_state.providers() {
                    result
                        .entry(variable.clone())
                        .or_insert_with(|| provider.clone());
                }
            }
        }
        Ok(result)
    }

    /// Persist this deployment through the project's backend.
    pub fn save(&self, project: &ProjectState) -> Result<(), StateError> {
        project.save_deployment(self)
    }
}
