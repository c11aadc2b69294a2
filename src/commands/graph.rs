// ABOUTME: Order and providers commands.
// ABOUTME: Report the provider graph of an environment.

use std::path::Path;

use super::workspace::Workspace;
use escape::error::Result;
use escape::output::Output;

/// Print root deployments in the order `stage` must run them.
pub fn order(dir: &Path, environment: Option<&str>, stage: &str, output: Output) -> Result<()> {
    let workspace = Workspace::open(dir, environment)?;
    let env = workspace.env()?;
    let names: Vec<String> = env
        .get_deployment_state_topological_sort(stage)?
        .into_iter()
        .map(|deployment| deployment.name().to_string())
        .collect();

    let text = if names.is_empty() {
        format!("No deployments with stage '{stage}' in {}", env.name())
    } else {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{:>3}. {name}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    };
    output.result(&text, &serde_json::json!(names));
    Ok(())
}

/// Print every interface with the deployments currently providing it.
pub fn providers(dir: &Path, environment: Option<&str>, output: Output) -> Result<()> {
    let workspace = Workspace::open(dir, environment)?;
    let providers = workspace.env()?.get_providers();

    let text = providers
        .iter()
        .map(|(interface, deployments)| format!("{interface}: {}", deployments.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    output.result(&text, &serde_json::json!(providers));
    Ok(())
}
