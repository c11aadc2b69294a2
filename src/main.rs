// ABOUTME: Entry point for the escape CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use escape::config;
use escape::error::Result;
use escape::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli.command, mode) {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(command: Commands, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match command {
        Commands::Init { project, force } => {
            config::init_config(&cwd, project.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Order { environment, stage } => {
            commands::order(&cwd, environment.as_deref(), &stage, output)
        }
        Commands::Providers { environment } => {
            commands::providers(&cwd, environment.as_deref(), output)
        }
        Commands::Compile {
            deployment,
            environment,
            stage,
            providers,
        } => commands::compile(
            &cwd,
            commands::CompileArgs {
                deployment: &deployment,
                environment: environment.as_deref(),
                stage: &stage,
                providers: &providers,
            },
            output,
        ),
        Commands::Eval {
            deployment,
            expression,
            environment,
            stage,
        } => commands::eval(
            &cwd,
            &deployment,
            &expression,
            environment.as_deref(),
            &stage,
            output,
        ),
        Commands::Status {
            deployment,
            environment,
            stage,
            set,
        } => commands::status(
            &cwd,
            &deployment,
            environment.as_deref(),
            &stage,
            set.as_deref(),
            output,
        ),
    }
}
