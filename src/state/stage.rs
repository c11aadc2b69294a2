// ABOUTME: State of one lifecycle stage (e.g. build or deploy) of a deployment.
// ABOUTME: Holds user and calculated variables, provider wiring, version, status and nested deployments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::deployment::DeploymentState;
use super::error::StateError;
use super::status::{Status, StatusCode, status_transition_allowed};
use super::Inputs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStageState")]
pub struct StageState {
    #[serde(rename = "inputs", skip_serializing_if = "BTreeMap::is_empty")]
    user_inputs: Inputs,

    #[serde(rename = "calculated_inputs", skip_serializing_if = "BTreeMap::is_empty")]
    inputs: Inputs,

    #[serde(rename = "calculated_outputs", skip_serializing_if = "BTreeMap::is_empty")]
    outputs: Inputs,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    deployments: BTreeMap<String, DeploymentState>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    providers: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    provides: Vec<String>,

    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,

    status: Status,
}

/// Persisted shape. Status is optional here so documents written before stages
/// tracked a status can still be loaded.
#[derive(Deserialize)]
struct RawStageState {
    #[serde(default)]
    inputs: Inputs,
    #[serde(default)]
    calculated_inputs: Inputs,
    #[serde(default)]
    calculated_outputs: Inputs,
    #[serde(default)]
    deployments: BTreeMap<String, DeploymentState>,
    #[serde(default)]
    providers: BTreeMap<String, String>,
    #[serde(default)]
    provides: Vec<String>,
    #[serde(default)]
    version: String,
    #[serde(default)]
    status: Option<Status>,
}

impl From<RawStageState> for StageState {
    fn from(raw: RawStageState) -> Self {
        // A committed version without a recorded status can only mean a
        // successful run.
        let status = raw.status.unwrap_or_else(|| {
            if raw.version.is_empty() {
                Status::new(StatusCode::Empty)
            } else {
                Status::new(StatusCode::Ok)
            }
        });
        Self {
            user_inputs: raw.inputs,
            inputs: raw.calculated_inputs,
            outputs: raw.calculated_outputs,
            deployments: raw.deployments,
            providers: raw.providers,
            provides: raw.provides,
            version: raw.version,
            status,
        }
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::new()
    }
}

impl StageState {
    pub fn new() -> Self {
        Self {
            user_inputs: Inputs::new(),
            inputs: Inputs::new(),
            outputs: Inputs::new(),
            deployments: BTreeMap::new(),
            providers: BTreeMap::new(),
            provides: Vec::new(),
            version: String::new(),
            status: Status::new(StatusCode::Empty),
        }
    }

    /// Inputs supplied by the caller for this stage.
    pub fn user_inputs(&self) -> &Inputs {
        &self.user_inputs
    }

    pub fn set_user_input(&mut self, key: &str, value: serde_json::Value) {
        self.user_inputs.insert(key.to_string(), value);
    }

    /// Inputs calculated during the last run of this stage.
    pub fn calculated_inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn set_calculated_inputs(&mut self, inputs: Inputs) {
        self.inputs = inputs;
    }

    /// Outputs calculated during the last run of this stage.
    pub fn calculated_outputs(&self) -> &Inputs {
        &self.outputs
    }

    pub fn set_calculated_outputs(&mut self, outputs: Inputs) {
        self.outputs = outputs;
    }

    /// Consumer variable name -> provider deployment path.
    pub fn providers(&self) -> &BTreeMap<String, String> {
        &self.providers
    }

    pub fn set_provider(&mut self, variable: &str, deployment: &str) {
        self.providers
            .insert(variable.to_string(), deployment.to_string());
    }

    /// Interfaces advertised by the committed release.
    pub fn provides(&self) -> &[String] {
        &self.provides
    }

    /// The committed release version, empty if nothing was committed yet.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// True when the committed version is exactly `version`. A stage that never
    /// committed holds the empty version.
    pub fn is_deployed(&self, version: &str) -> bool {
        self.version == version
    }

    /// Record a successfully run release version and what it provides.
    pub fn commit_version(&mut self, version: &str, provides: Vec<String>) {
        self.version = version.to_string();
        self.provides = provides;
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Replace the status, rejecting transitions the state machine does not allow.
    pub fn set_status(&mut self, status: Status) -> Result<(), StateError> {
        if !status_transition_allowed(self.status.code, status.code) {
            return Err(StateError::IllegalStatusTransition {
                from: self.status.code,
                to: status.code,
            });
        }
        self.status = status;
        Ok(())
    }

    /// Move to `code`, stamping a fresh status.
    pub fn transition(&mut self, code: StatusCode) -> Result<(), StateError> {
        self.set_status(Status::new(code))
    }

    /// Dependency deployments instantiated while running this stage.
    pub fn deployments(&self) -> &BTreeMap<String, DeploymentState> {
        &self.deployments
    }

    pub fn deployment(&self, name: &str) -> Option<&DeploymentState> {
        self.deployments.get(name)
    }

    pub fn deployment_mut(&mut self, name: &str) -> Option<&mut DeploymentState> {
        self.deployments.get_mut(name)
    }

    /// Insert a nested deployment unless one with that name already exists.
    /// The caller is responsible for attaching it to its location.
    pub(crate) fn get_or_insert_deployment(
        &mut self,
        deployment: DeploymentState,
    ) -> &mut DeploymentState {
        self.deployments
            .entry(deployment.name().to_string())
            .or_insert(deployment)
    }

    pub(crate) fn deployments_mut(&mut self) -> impl Iterator<Item = &mut DeploymentState> {
        self.deployments.values_mut()
    }
}
