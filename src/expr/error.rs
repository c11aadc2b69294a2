// ABOUTME: Error types for parsing and evaluating expressions.
// ABOUTME: Covers arity, type, lookup and bounds failures.

use thiserror::Error;

/// A script string that could not be parsed completely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse '{input}' at position {position}: {message}")]
pub struct ParseError {
    pub input: String,
    pub position: usize,
    pub message: String,
}

/// Errors raised while evaluating a script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// A builtin, lambda or lookup was applied to the wrong number of arguments.
    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    /// A value had the wrong atom type for the role it was used in.
    #[error("{role}: expected {expected}, got {got}")]
    TypeMismatch {
        role: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("key '{key}' not found (known keys: {})", .known.join(", "))]
    UnknownKey { key: String, known: Vec<String> },

    #[error("variable '{name}' not found in environment (known: {})", .known.join(", "))]
    UnknownVariable { name: String, known: Vec<String> },

    #[error("index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("unsupported string operation '{0}' (supported: file)")]
    UnsupportedStringOperation(String),

    #[error("cannot apply a value of type {0}")]
    NotCallable(&'static str),

    /// Functions, lambdas and unevaluated applications have no plain value.
    #[error("a {0} cannot be converted to a plain value")]
    NotAValue(&'static str),

    /// A builtin failed for a reason specific to its operation.
    #[error("{function} failed: {message}")]
    Builtin { function: String, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ScriptError {
    pub(crate) fn arity(function: &str, expected: impl ToString, got: usize) -> Self {
        ScriptError::Arity {
            function: function.to_string(),
            expected: expected.to_string(),
            got,
        }
    }

    pub(crate) fn builtin(function: &str, message: impl ToString) -> Self {
        ScriptError::Builtin {
            function: function.to_string(),
            message: message.to_string(),
        }
    }
}
