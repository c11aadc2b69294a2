// ABOUTME: Compiled release descriptor: identity, declared variables, dependencies and interfaces.
// ABOUTME: Accepts bare-string shorthands for variables, dependencies and consumers.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::ResolveError;
use crate::types::{DEFAULT_PROJECT, ReleaseId, ReleaseIdError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReleaseMetadata {
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub project: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub branch: String,

    #[serde(default)]
    pub revision: String,

    #[serde(default)]
    pub logo: String,

    #[serde(default)]
    pub license: String,

    #[serde(default)]
    pub inputs: Vec<VariableSpec>,

    #[serde(default)]
    pub outputs: Vec<VariableSpec>,

    #[serde(default)]
    pub depends: Vec<DependencyConfig>,

    #[serde(default)]
    pub consumes: Vec<ConsumerConfig>,

    #[serde(default)]
    pub provides: Vec<String>,

    /// Deprecated alias table: alias -> name of an already bound variable.
    #[serde(default)]
    pub variable_context: BTreeMap<String, String>,
}

impl ReleaseMetadata {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            ..Self::default()
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ResolveError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn project(&self) -> &str {
        if self.project.is_empty() {
            DEFAULT_PROJECT
        } else {
            &self.project
        }
    }

    pub fn release_id(&self) -> ReleaseId {
        ReleaseId::new(self.project(), &self.name, Some(&self.version))
    }

    /// `project/name-v<version>`
    pub fn qualified_release_id(&self) -> String {
        self.release_id().to_string()
    }

    /// `project/name`
    pub fn versionless_release_id(&self) -> String {
        self.release_id().versionless()
    }

    pub fn get_inputs(&self, stage: &str) -> impl Iterator<Item = &VariableSpec> {
        self.inputs.iter().filter(move |v| in_scope(&v.scopes, stage))
    }

    pub fn get_outputs(&self, stage: &str) -> impl Iterator<Item = &VariableSpec> {
        self.outputs.iter().filter(move |v| in_scope(&v.scopes, stage))
    }

    pub fn get_consumes(&self, stage: &str) -> impl Iterator<Item = &ConsumerConfig> {
        self.consumes.iter().filter(move |c| in_scope(&c.scopes, stage))
    }

    pub fn get_depends(&self, stage: &str) -> impl Iterator<Item = &DependencyConfig> {
        self.depends.iter().filter(move |d| in_scope(&d.scopes, stage))
    }

    pub fn provides_interface(&self, interface: &str) -> bool {
        self.provides.iter().any(|p| p == interface)
    }
}

/// An empty scope list applies to every stage.
fn in_scope(scopes: &[String], stage: &str) -> bool {
    scopes.is_empty() || scopes.iter().any(|s| s == stage)
}

/// A declared input or output variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "VariableEntry")]
pub struct VariableSpec {
    pub id: String,
    pub scopes: Vec<String>,
    pub default: Option<serde_json::Value>,
    pub description: String,
}

impl VariableSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            scopes: Vec::new(),
            default: None,
            description: String::new(),
        }
    }

    pub fn in_scope(&self, stage: &str) -> bool {
        in_scope(&self.scopes, stage)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VariableEntry {
    Simple(String),
    Detailed {
        id: String,
        #[serde(default)]
        scopes: Vec<String>,
        #[serde(default)]
        default: Option<serde_json::Value>,
        #[serde(default)]
        description: String,
    },
}

impl From<VariableEntry> for VariableSpec {
    fn from(entry: VariableEntry) -> Self {
        match entry {
            VariableEntry::Simple(id) => VariableSpec::new(&id),
            VariableEntry::Detailed {
                id,
                scopes,
                default,
                description,
            } => VariableSpec {
                id,
                scopes,
                default,
                description,
            },
        }
    }
}

/// A declared dependency on another release.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "DependencyEntry")]
pub struct DependencyConfig {
    reference: String,
    release: ReleaseId,
    variable: String,
    deployment_name: String,
    scopes: Vec<String>,
}

impl DependencyConfig {
    /// Parse `reference`. The variable defaults to the release name and the
    /// deployment name to the versionless release id.
    pub fn new(reference: &str) -> Result<Self, ReleaseIdError> {
        let release = ReleaseId::parse(reference)?;
        Ok(Self {
            reference: reference.to_string(),
            variable: release.name().to_string(),
            deployment_name: release.versionless(),
            release,
            scopes: Vec::new(),
        })
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = variable.to_string();
        self
    }

    pub fn with_deployment_name(mut self, deployment_name: &str) -> Self {
        self.deployment_name = deployment_name.to_string();
        self
    }

    /// The reference exactly as written in the metadata.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn release(&self) -> &ReleaseId {
        &self.release
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn deployment_name(&self) -> &str {
        &self.deployment_name
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyEntry {
    Simple(String),
    Detailed {
        release_id: String,
        #[serde(default)]
        variable: Option<String>,
        #[serde(default)]
        deployment_name: Option<String>,
        #[serde(default)]
        scopes: Vec<String>,
    },
}

impl TryFrom<DependencyEntry> for DependencyConfig {
    type Error = ReleaseIdError;

    fn try_from(entry: DependencyEntry) -> Result<Self, Self::Error> {
        match entry {
            DependencyEntry::Simple(reference) => DependencyConfig::new(&reference),
            DependencyEntry::Detailed {
                release_id,
                variable,
                deployment_name,
                scopes,
            } => {
                let mut dependency = DependencyConfig::new(&release_id)?;
                if let Some(variable) = variable {
                    dependency.variable = variable;
                }
                if let Some(deployment_name) = deployment_name {
                    dependency.deployment_name = deployment_name;
                }
                dependency.scopes = scopes;
                Ok(dependency)
            }
        }
    }
}

/// A required interface, bound under `variable` once a provider is wired.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ConsumerEntry")]
pub struct ConsumerConfig {
    pub name: String,
    pub variable: String,
    pub scopes: Vec<String>,
}

impl ConsumerConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variable: name.to_string(),
            scopes: Vec::new(),
        }
    }

    pub fn with_variable(mut self, variable: &str) -> Self {
        self.variable = variable.to_string();
        self
    }

    /// True when the consumer binds the interface under a different name.
    pub fn is_renamed(&self) -> bool {
        self.variable != self.name
    }

    pub fn in_scope(&self, stage: &str) -> bool {
        in_scope(&self.scopes, stage)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConsumerEntry {
    Simple(String),
    Detailed {
        name: String,
        #[serde(default)]
        variable: Option<String>,
        #[serde(default)]
        scopes: Vec<String>,
    },
}

impl From<ConsumerEntry> for ConsumerConfig {
    fn from(entry: ConsumerEntry) -> Self {
        match entry {
            ConsumerEntry::Simple(name) => ConsumerConfig::new(&name),
            ConsumerEntry::Detailed {
                name,
                variable,
                scopes,
            } => ConsumerConfig {
                variable: variable.unwrap_or_else(|| name.clone()),
                name,
                scopes,
            },
        }
    }
}
