// ABOUTME: Compile and eval commands.
// ABOUTME: Wire providers, compile a deployment's environment and evaluate expressions in it.

use std::path::Path;

use super::workspace::{Workspace, parse_provider_overrides};
use escape::compiler::{StateCompiler, configure_providers};
use escape::diagnostics::Diagnostics;
use escape::error::Result;
use escape::output::Output;

pub struct CompileArgs<'a> {
    pub deployment: &'a str,
    pub environment: Option<&'a str>,
    pub stage: &'a str,
    pub providers: &'a [String],
}

/// Configure providers, compile, persist the deployment and print the result.
pub fn compile(dir: &Path, args: CompileArgs<'_>, mut output: Output) -> Result<()> {
    output.start_timer();
    let overrides = parse_provider_overrides(args.providers)?;
    let mut workspace = Workspace::open(dir, args.environment)?;
    let address = workspace.address(args.deployment, args.stage)?;
    let metadata = workspace.metadata(&address, args.stage)?;

    let env = workspace.project.get_or_create_environment(&workspace.environment)?;
    let wired = configure_providers(env, &address, &metadata, args.stage, &overrides)?;
    for (variable, provider) in &wired {
        output.progress(&format!("  → {variable} provided by {provider}"));
    }

    let mut compiler = StateCompiler::new(&workspace.resolver);
    let compiled = compiler.compile(env, &address, &metadata, args.stage)?;
    let diagnostics = compiler.into_diagnostics();

    workspace.save(&address)?;
    report(&diagnostics, &output);

    let value = compiled.to_json()?;
    let text = serde_json::to_string_pretty(&value)?;
    output.result(&text, &value);
    Ok(())
}

/// Evaluate `expression` in the compiled environment of `deployment`.
pub fn eval(
    dir: &Path,
    deployment: &str,
    expression: &str,
    environment: Option<&str>,
    stage: &str,
    output: Output,
) -> Result<()> {
    let mut workspace = Workspace::open(dir, environment)?;
    let address = workspace.address(deployment, stage)?;
    let metadata = workspace.metadata(&address, stage)?;

    let env = workspace.project.get_or_create_environment(&workspace.environment)?;
    let mut compiler = StateCompiler::new(&workspace.resolver);
    let script_env = compiler.compile_environment(env, &address, &metadata, stage)?;
    report(compiler.diagnostics(), &output);

    let value = script_env.eval_str(expression)?.to_json()?;
    let text = match &value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    output.result(&text, &value);
    Ok(())
}

fn report(diagnostics: &Diagnostics, output: &Output) {
    for warning in diagnostics.warnings() {
        output.warning(&warning.message);
    }
}
