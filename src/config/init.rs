// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates escape.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::NameKind;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, project: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let project = project.unwrap_or("my-project");
    NameKind::Project
        .validate(project)
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let yaml = generate_template_yaml(&Config::template(project));
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"project: {}
state: {}
releases: {}
environment: {}

# Default inputs for every deployment in the environment.
# Values may reference process environment variables:
#   token: {{ env: DEPLOY_TOKEN, default: "none" }}
inputs: {{}}
"#,
        config.project,
        config.state.display(),
        config.releases.display(),
        config.environment
    )
}
