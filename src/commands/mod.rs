// ABOUTME: Command module aggregator for the escape CLI.
// ABOUTME: Re-exports order, providers, compile, eval and status command handlers.

mod compile;
mod graph;
mod status;
mod workspace;

pub use compile::{CompileArgs, compile, eval};
pub use graph::{order, providers};
pub use status::status;
