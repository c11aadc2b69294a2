// ABOUTME: Configuration types and parsing for escape.yml.
// ABOUTME: Handles YAML parsing, path defaults and environment input interpolation.

mod deserialize;
mod init;
mod input_value;

pub use init::init_config;
pub use input_value::{InputValue, resolve_inputs};

use crate::error::{Error, Result};
use crate::state::Inputs;
use deserialize::{deserialize_environment_name, deserialize_project_name};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "escape.yml";
pub const CONFIG_FILENAME_ALT: &str = "escape.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".escape/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_project_name")]
    pub project: String,

    #[serde(default = "default_state_path")]
    pub state: PathBuf,

    #[serde(default = "default_releases_dir")]
    pub releases: PathBuf,

    #[serde(
        default = "default_environment",
        deserialize_with = "deserialize_environment_name"
    )]
    pub environment: String,

    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    root: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".escape/state.json")
}

fn default_releases_dir() -> PathBuf {
    PathBuf::from("releases")
}

fn default_environment() -> String {
    "dev".to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                let mut config = Self::load(path)?;
                config.root = dir.to_path_buf();
                return Ok(config);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Location of the JSON state file.
    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.state)
    }

    /// Directory holding release metadata files.
    pub fn releases_dir(&self) -> PathBuf {
        self.root.join(&self.releases)
    }

    /// Configured environment inputs with every `env` reference resolved.
    pub fn resolved_inputs(&self) -> Result<Inputs> {
        resolve_inputs(&self.inputs)
    }

    pub fn template(project: &str) -> Self {
        Config {
            project: project.to_string(),
            state: default_state_path(),
            releases: default_releases_dir(),
            environment: default_environment(),
            inputs: BTreeMap::new(),
            root: PathBuf::new(),
        }
    }
}
