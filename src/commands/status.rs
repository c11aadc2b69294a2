// ABOUTME: Status command implementation.
// ABOUTME: Shows a stage's status and applies validated status transitions.

use std::path::Path;

use super::workspace::Workspace;
use escape::error::{Error, Result};
use escape::output::Output;
use escape::state::{Status, StatusCode};

pub fn status(
    dir: &Path,
    deployment: &str,
    environment: Option<&str>,
    stage: &str,
    set: Option<&str>,
    output: Output,
) -> Result<()> {
    let mut workspace = Workspace::open(dir, environment)?;
    let address = workspace.address(deployment, stage)?;

    if let Some(code) = set {
        let code: StatusCode = code.parse().map_err(Error::InvalidArgument)?;
        workspace
            .env_mut()?
            .deployment_mut(&address)?
            .update_status(stage, Status::new(code))?;
        workspace.save(&address)?;
        output.progress(&format!("{address} ({stage}) is now {code}"));
    }

    let state = workspace.env()?.deployment(&address)?;
    let current = state.status(stage).cloned().unwrap_or_default();
    let version = state.version(stage);
    let text = if version.is_empty() {
        format!("{address} ({stage}): {}", current.code)
    } else {
        format!("{address} ({stage}): {} at version {version}", current.code)
    };
    output.result(&text, &serde_json::to_value(&current)?);
    Ok(())
}
