// ABOUTME: Binds deployment state, release metadata and provider wiring into a script environment.
// ABOUTME: The compiled dict is what expressions in a stage may reference.

mod error;
mod providers;

use std::collections::BTreeMap;

use snafu::ResultExt;

use crate::diagnostics::{Diagnostics, Warning};
use crate::expr::{Script, ScriptEnvironment};
use crate::release::{DependencyResolver, ReleaseMetadata, VariableSpec};
use crate::state::{DEPLOY_STAGE, DeploymentState, EnvironmentState, Inputs};
use crate::types::DeploymentAddress;

pub use error::{CompileError, CompileErrorKind};
pub use providers::configure_providers;

use error::{ResolveSnafu, StateSnafu};

/// Global under which a deployment finds its own compiled state.
pub const THIS: &str = "this";

pub struct StateCompiler<'a> {
    resolver: &'a dyn DependencyResolver,
    dependency_inputs_are_available: bool,
    diagnostics: Diagnostics,
}

impl<'a> StateCompiler<'a> {
    pub fn new(resolver: &'a dyn DependencyResolver) -> Self {
        Self {
            resolver,
            dependency_inputs_are_available: true,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Whether the compiled deployment's own calculated variables may be
    /// exposed. Off while resolving dependencies ahead of a stage, when those
    /// values are not computed yet.
    pub fn with_dependency_inputs(mut self, available: bool) -> Self {
        self.dependency_inputs_are_available = available;
        self
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Compile everything `stage` of the deployment at `address` may reference.
    ///
    /// Dependencies declared by `metadata` are created as nested deployments
    /// under `stage` if they do not exist yet.
    pub fn compile(
        &mut self,
        env: &mut EnvironmentState,
        address: &DeploymentAddress,
        metadata: &ReleaseMetadata,
        stage: &str,
    ) -> Result<Script, CompileError> {
        self.compile_globals(env, address, metadata, stage)
            .map(Script::Dict)
    }

    /// Compile and wrap the result in an evaluation environment with the
    /// builtin library available.
    pub fn compile_environment(
        &mut self,
        env: &mut EnvironmentState,
        address: &DeploymentAddress,
        metadata: &ReleaseMetadata,
        stage: &str,
    ) -> Result<ScriptEnvironment, CompileError> {
        self.compile_globals(env, address, metadata, stage)
            .map(ScriptEnvironment::with_globals)
    }

    fn compile_globals(
        &mut self,
        env: &mut EnvironmentState,
        address: &DeploymentAddress,
        metadata: &ReleaseMetadata,
        stage: &str,
    ) -> Result<BTreeMap<String, Script>, CompileError> {
        let path = address.to_string();
        let mut globals: BTreeMap<String, Script> = BTreeMap::new();

        let this = {
            let deployment = env.deployment(address).context(StateSnafu { deployment: &path })?;
            let include = self.dependency_inputs_are_available;
            self.compile_state(env, deployment, metadata, stage, include)
        };
        globals.insert(THIS.to_string(), this);

        for dependency in metadata.get_depends(stage) {
            let dependency_metadata = self
                .resolver
                .dependency_metadata(dependency.reference())
                .context(ResolveSnafu {
                    deployment: &path,
                    reference: dependency.reference(),
                })?;

            let dependency_address = env
                .deployment_mut(address)
                .and_then(|parent| {
                    parent.get_or_create_dependency(
                        stage,
                        dependency.deployment_name(),
                        &dependency.release().versionless(),
                    )
                })
                .map(|child| child.address().clone())
                .context(StateSnafu { deployment: &path })?;

            let dependency_state = env
                .deployment(&dependency_address)
                .context(StateSnafu { deployment: &path })?;
            let compiled =
                self.compile_state(env, dependency_state, &dependency_metadata, DEPLOY_STAGE, true);
            globals.insert(dependency.variable().to_string(), compiled.clone());
            globals.insert(dependency.reference().to_string(), compiled);
        }

        let env: &EnvironmentState = env;
        let deployment = env.deployment(address).context(StateSnafu { deployment: &path })?;
        let wiring = deployment
            .providers(env, stage)
            .context(StateSnafu { deployment: &path })?;
        for consumer in metadata.get_consumes(stage) {
            let Some(provider_path) = wiring.get(&consumer.variable) else {
                return error::MissingProviderSnafu {
                    deployment: &path,
                    interface: &consumer.name,
                    variable: &consumer.variable,
                }
                .fail();
            };

            let provider = env
                .resolve_deployment_path(provider_path, stage)
                .and_then(|provider_address| env.deployment(&provider_address))
                .context(StateSnafu { deployment: &path })?;

            let reference = provider.release_reference(DEPLOY_STAGE);
            let provider_metadata = self
                .resolver
                .dependency_metadata(&reference)
                .context(ResolveSnafu {
                    deployment: &path,
                    reference: &reference,
                })?;
            let compiled =
                self.compile_state(env, provider, &provider_metadata, DEPLOY_STAGE, true);
            globals.insert(consumer.variable.clone(), compiled);
        }

        for (alias, target) in &metadata.variable_context {
            match globals.get(target) {
                Some(value) => {
                    let value = value.clone();
                    globals.insert(alias.clone(), value);
                }
                None => self.diagnostics.warn(Warning::unbound_alias(alias, target)),
            }
        }

        Ok(globals)
    }

    /// The projection of one deployment that scripts see.
    ///
    /// Calculated inputs and outputs are only included with `include_variables`,
    /// and only for ids the release declares in scope for `stage`.
    pub fn compile_state(
        &mut self,
        env: &EnvironmentState,
        deployment: &DeploymentState,
        metadata: &ReleaseMetadata,
        stage: &str,
        include_variables: bool,
    ) -> Script {
        let mut result: BTreeMap<String, Script> = BTreeMap::new();
        let fields = [
            ("name", metadata.name.clone()),
            ("version", metadata.version.clone()),
            ("branch", metadata.branch.clone()),
            ("revision", metadata.revision.clone()),
            ("description", metadata.description.clone()),
            ("logo", metadata.logo.clone()),
            ("license", metadata.license.clone()),
            ("release", metadata.versionless_release_id()),
            ("id", metadata.qualified_release_id()),
            ("project", deployment.project_name().to_string()),
            ("environment", env.name().to_string()),
            ("deployment", deployment.deployment_path()),
        ];
        for (key, value) in fields {
            result.insert(key.to_string(), Script::String(value));
        }

        if include_variables {
            let empty = Inputs::new();
            let inputs = deployment.calculated_inputs(stage).unwrap_or(&empty);
            let outputs = deployment.calculated_outputs(stage).unwrap_or(&empty);
            let declared_inputs: Vec<&VariableSpec> = metadata.get_inputs(stage).collect();
            let declared_outputs: Vec<&VariableSpec> = metadata.get_outputs(stage).collect();

            let inputs = self.declared_only(deployment, inputs, &declared_inputs);
            let outputs = self.declared_only(deployment, outputs, &declared_outputs);
            result.insert("inputs".to_string(), inputs);
            result.insert("outputs".to_string(), outputs);
        }

        Script::Dict(result)
    }

    fn declared_only(
        &mut self,
        deployment: &DeploymentState,
        calculated: &Inputs,
        declared: &[&VariableSpec],
    ) -> Script {
        let mut result = BTreeMap::new();
        for (key, value) in calculated {
            if declared.iter().any(|v| &v.id == key) {
                result.insert(key.clone(), Script::from_json(value));
            } else {
                self.diagnostics
                    .warn(Warning::undeclared_variable(&deployment.deployment_path(), key));
            }
        }
        Script::Dict(result)
    }
}
