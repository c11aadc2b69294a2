// ABOUTME: Evaluation environment mapping names to script values.
// ABOUTME: The "$" key holds the globals dict, including every builtin under "__name".

use std::collections::BTreeMap;

use super::error::ScriptError;
use super::parser::parse_script;
use super::script::Script;
use super::stdlib;

/// Environment key that holds the globals dict.
pub const GLOBALS_KEY: &str = "$";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptEnvironment {
    bindings: BTreeMap<String, Script>,
}

impl ScriptEnvironment {
    /// An environment whose globals are just the builtin library.
    pub fn new() -> Self {
        Self::with_globals(BTreeMap::new())
    }

    /// An environment whose globals are the builtins plus `globals`.
    /// User bindings shadow builtins of the same name.
    pub fn with_globals(globals: BTreeMap<String, Script>) -> Self {
        let mut all = stdlib::builtins();
        all.extend(globals);
        Self::from_globals(all)
    }

    /// Build an environment from a compiled dict value, e.g. the output of the
    /// state compiler.
    pub fn from_dict(dict: Script) -> Result<Self, ScriptError> {
        match dict {
            Script::Dict(globals) => Ok(Self::with_globals(globals)),
            other => Err(ScriptError::TypeMismatch {
                role: "environment globals".to_string(),
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }

    /// Wrap an already complete globals dict without adding builtins.
    pub(crate) fn from_globals(globals: BTreeMap<String, Script>) -> Self {
        let mut bindings = BTreeMap::new();
        bindings.insert(GLOBALS_KEY.to_string(), Script::Dict(globals));
        Self { bindings }
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.bindings.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Bind a global, shadowing any existing binding with that name.
    pub fn set_global(&mut self, name: &str, value: Script) {
        let mut globals = self.globals();
        globals.insert(name.to_string(), value);
        self.bindings
            .insert(GLOBALS_KEY.to_string(), Script::Dict(globals));
    }

    /// A copy of the globals dict.
    pub fn globals(&self) -> BTreeMap<String, Script> {
        match self.bindings.get(GLOBALS_KEY) {
            Some(Script::Dict(globals)) => globals.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// Parse and evaluate `source` in this environment.
    pub fn eval_str(&self, source: &str) -> Result<Script, ScriptError> {
        parse_script(source)?.eval(self)
    }
}
