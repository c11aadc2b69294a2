// ABOUTME: Loads what every state command needs: config, project state and release resolver.
// ABOUTME: Also resolves deployment paths given on the command line.

use std::collections::BTreeMap;
use std::path::Path;

use escape::config::Config;
use escape::error::{Error, Result};
use escape::release::{DependencyResolver, DirectoryResolver, ReleaseMetadata};
use escape::state::{EnvironmentState, LocalBackend, ProjectState, StateError};
use escape::types::{DeploymentAddress, PATH_SEPARATOR};

pub struct Workspace {
    pub project: ProjectState,
    pub resolver: DirectoryResolver,
    pub environment: String,
}

impl Workspace {
    /// Discover the config in `dir`, open its state file and make sure the
    /// selected environment exists with the configured inputs applied.
    pub fn open(dir: &Path, environment: Option<&str>) -> Result<Self> {
        let config = Config::discover(dir)?;
        let mut project = LocalBackend::open(config.state_path(), &config.project)?;
        let resolver = DirectoryResolver::new(config.releases_dir());
        let environment = environment.unwrap_or(&config.environment).to_string();

        let inputs = config.resolved_inputs()?;
        let env = project.get_or_create_environment(&environment)?;
        for (key, value) in inputs {
            env.set_input(&key, value);
        }

        tracing::debug!(
            "Opened project {} (environment {}) from {}",
            project.name(),
            environment,
            config.state_path().display()
        );
        Ok(Self {
            project,
            resolver,
            environment,
        })
    }

    pub fn env(&self) -> Result<&EnvironmentState> {
        self.project
            .environment(&self.environment)
            .ok_or_else(|| StateError::EnvironmentNotFound(self.environment.clone()).into())
    }

    pub fn env_mut(&mut self) -> Result<&mut EnvironmentState> {
        Ok(self.project.get_or_create_environment(&self.environment)?)
    }

    /// Resolve `path`, creating the root deployment when the path names one
    /// that does not exist yet.
    pub fn address(&mut self, path: &str, stage: &str) -> Result<DeploymentAddress> {
        let env = self.env_mut()?;
        if !path.contains(PATH_SEPARATOR) {
            env.get_or_create_deployment_state(path)?;
        }
        Ok(env.resolve_deployment_path(path, stage)?)
    }

    /// Metadata for the release the deployment at `address` runs in `stage`.
    pub fn metadata(&self, address: &DeploymentAddress, stage: &str) -> Result<ReleaseMetadata> {
        let reference = self.env()?.deployment(address)?.release_reference(stage);
        Ok(self.resolver.dependency_metadata(&reference)?)
    }

    pub fn save(&self, address: &DeploymentAddress) -> Result<()> {
        Ok(self.project.save(&self.environment, address)?)
    }
}

/// Parse repeated `VARIABLE=DEPLOYMENT` arguments.
pub fn parse_provider_overrides(values: &[String]) -> Result<BTreeMap<String, String>> {
    values
        .iter()
        .map(|value| match value.split_once('=') {
            Some((variable, deployment)) if !variable.is_empty() && !deployment.is_empty() => {
                Ok((variable.to_string(), deployment.to_string()))
            }
            _ => Err(Error::InvalidProviderOverride(value.clone())),
        })
        .collect()
}
