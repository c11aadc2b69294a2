// ABOUTME: Side-effect-free expression language embedded in release metadata.
// ABOUTME: Exports script atoms, the evaluation environment, the parser and builtins.

mod env;
mod error;
mod parser;
mod script;
mod stdlib;

pub use env::{GLOBALS_KEY, ScriptEnvironment};
pub use error::{ParseError, ScriptError};
pub use parser::{MAX_NESTING, parse_script};
pub use script::{Apply, Lambda, NativeFunction, Script};
pub use stdlib::{BUILTIN_PREFIX, builtin_name};
