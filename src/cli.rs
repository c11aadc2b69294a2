// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "escape")]
#[command(about = "Release orchestration: deployment order, provider wiring and state compilation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new escape.yml configuration file
    Init {
        /// Project name
        #[arg(short, long)]
        project: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Print the order in which deployments must run
    Order {
        /// Environment (defaults to the configured one)
        #[arg(short, long)]
        environment: Option<String>,

        /// Stage to order
        #[arg(short, long, default_value = "deploy")]
        stage: String,
    },

    /// List interfaces and the deployments providing them
    Providers {
        /// Environment (defaults to the configured one)
        #[arg(short, long)]
        environment: Option<String>,
    },

    /// Wire providers and print the compiled environment of a deployment
    Compile {
        /// Deployment path, e.g. webapp or webapp:_/database
        deployment: String,

        /// Environment (defaults to the configured one)
        #[arg(short, long)]
        environment: Option<String>,

        /// Stage to compile
        #[arg(short, long, default_value = "deploy")]
        stage: String,

        /// Provider override, VARIABLE=DEPLOYMENT (repeatable)
        #[arg(short, long = "provider", value_name = "VAR=DEPL")]
        providers: Vec<String>,
    },

    /// Evaluate an expression against a deployment's compiled environment
    Eval {
        /// Deployment path
        deployment: String,

        /// Expression, e.g. '$this.inputs.domain.upper()'
        expression: String,

        /// Environment (defaults to the configured one)
        #[arg(short, long)]
        environment: Option<String>,

        /// Stage to compile
        #[arg(short, long, default_value = "deploy")]
        stage: String,
    },

    /// Show or change the status of a deployment stage
    Status {
        /// Deployment path
        deployment: String,

        /// Environment (defaults to the configured one)
        #[arg(short, long)]
        environment: Option<String>,

        /// Stage
        #[arg(short, long, default_value = "deploy")]
        stage: String,

        /// New status code, e.g. pending or running_pre_step
        #[arg(long)]
        set: Option<String>,
    },
}
