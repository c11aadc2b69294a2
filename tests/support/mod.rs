// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory release resolver, a recording backend and state fixtures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};

use escape::release::{DependencyResolver, ReleaseMetadata, ResolveError};
use escape::state::{Backend, BackendError, DeploymentState, EnvironmentState, ProjectState};
use escape::types::ReleaseId;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("escape=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Resolves releases from a fixed set of metadata, keyed by release name.
#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryResolver {
    releases: BTreeMap<String, Vec<ReleaseMetadata>>,
}

#[allow(dead_code)]
impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metadata: ReleaseMetadata) -> Self {
        self.releases
            .entry(metadata.name.clone())
            .or_default()
            .push(metadata);
        self
    }
}

impl DependencyResolver for MemoryResolver {
    fn dependency_metadata(&self, reference: &str) -> Result<ReleaseMetadata, ResolveError> {
        let id = ReleaseId::parse(reference)?;
        let versions = self
            .releases
            .get(id.name())
            .ok_or_else(|| ResolveError::NotFound(reference.to_string()))?;
        let found = match id.version() {
            Some(version) if !version.ends_with('@') => {
                versions.iter().find(|m| m.version == version)
            }
            _ => versions.last(),
        };
        found
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(reference.to_string()))
    }
}

/// Backend that remembers which deployments were saved.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingBackend {
    saved: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingBackend {
    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

impl Backend for RecordingBackend {
    fn save(
        &self,
        _project: &ProjectState,
        deployment: &DeploymentState,
    ) -> Result<(), BackendError> {
        self.saved
            .lock()
            .unwrap()
            .push(deployment.deployment_path());
        Ok(())
    }
}

/// A project with one environment and a recording backend attached.
#[allow(dead_code)]
pub fn project_with_backend(env: &str) -> (ProjectState, Arc<RecordingBackend>) {
    let mut project = ProjectState::new("my-project").unwrap();
    project.get_or_create_environment(env).unwrap();
    let backend = Arc::new(RecordingBackend::default());
    project.set_backend(backend.clone());
    (project, backend)
}

/// An environment whose deploy stages are wired as `(consumer, variable, provider)`.
#[allow(dead_code)]
pub fn wired_environment(deployments: &[&str], wiring: &[(&str, &str, &str)]) -> EnvironmentState {
    let mut env = EnvironmentState::new("my-project", "dev").unwrap();
    for name in deployments {
        env.get_or_create_deployment_state(name)
            .unwrap()
            .get_stage_or_create_new("deploy");
    }
    for (consumer, variable, provider) in wiring {
        env.get_or_create_deployment_state(consumer)
            .unwrap()
            .get_stage_or_create_new("deploy")
            .set_provider(variable, provider);
    }
    env
}

/// Commit `version` for the deploy stage of root deployment `name`.
#[allow(dead_code)]
pub fn commit(env: &mut EnvironmentState, name: &str, version: &str, provides: &[&str]) {
    let deployment = env.get_or_create_deployment_state(name).unwrap();
    deployment.commit_version(
        "deploy",
        version,
        provides.iter().map(|p| p.to_string()).collect(),
    );
}
