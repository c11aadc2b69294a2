// ABOUTME: Compiler error types with SNAFU pattern.
// ABOUTME: Wraps state and resolution failures with the deployment they happened in.

use snafu::Snafu;

use crate::release::ResolveError;
use crate::state::StateError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
    #[snafu(display("deployment '{deployment}': {source}"))]
    State {
        deployment: String,
        source: StateError,
    },

    #[snafu(display("deployment '{deployment}': could not resolve release '{reference}': {source}"))]
    Resolve {
        deployment: String,
        reference: String,
        source: ResolveError,
    },

    #[snafu(display("{}", missing_provider_message(deployment, interface, variable)))]
    MissingProvider {
        deployment: String,
        interface: String,
        variable: String,
    },

    #[snafu(display(
        "deployment '{deployment}' consumes '{interface}', which is provided by several deployments ({}); pick one with --provider {variable}=<deployment>",
        candidates.join(", ")
    ))]
    AmbiguousProvider {
        deployment: String,
        interface: String,
        variable: String,
        candidates: Vec<String>,
    },
}

fn missing_provider_message(deployment: &str, interface: &str, variable: &str) -> String {
    if variable == interface {
        format!(
            "deployment '{deployment}' consumes interface '{interface}', but no provider is configured; \
             set one with --provider {variable}=<deployment>"
        )
    } else {
        format!(
            "deployment '{deployment}' has no provider for variable '{variable}' (interface '{interface}'); \
             set one with --provider {variable}=<deployment>"
        )
    }
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Invalid or missing deployment state.
    State,
    /// Release metadata could not be fetched.
    Resolution,
    /// A consumer has no provider wired.
    MissingProvider,
    /// More than one deployment could serve a consumer.
    AmbiguousProvider,
}

impl CompileError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> CompileErrorKind {
        match self {
            CompileError::State { .. } => CompileErrorKind::State,
            CompileError::Resolve { .. } => CompileErrorKind::Resolution,
            CompileError::MissingProvider { .. } => CompileErrorKind::MissingProvider,
            CompileError::AmbiguousProvider { .. } => CompileErrorKind::AmbiguousProvider,
        }
    }
}
