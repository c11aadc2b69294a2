// ABOUTME: Immutable script atoms and the evaluator that dispatches over them.
// ABOUTME: Apply and lambda nodes stay unevaluated until an environment is supplied.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use super::env::ScriptEnvironment;
use super::error::ScriptError;

type NativeFn = dyn Fn(&ScriptEnvironment, &[Script]) -> Result<Script, ScriptError> + Send + Sync;

/// A host-provided callable. Two functions are equal when their names are.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&ScriptEnvironment, &[Script]) -> Result<Script, ScriptError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, env: &ScriptEnvironment, args: &[Script]) -> Result<Script, ScriptError> {
        (self.func)(env, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A closure over the globals: parameter names plus an unevaluated body.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    params: Vec<String>,
    body: Box<Script>,
}

impl Lambda {
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &Script {
        &self.body
    }

    fn call(&self, env: &ScriptEnvironment, args: Vec<Script>) -> Result<Script, ScriptError> {
        if args.len() != self.params.len() {
            return Err(ScriptError::arity("lambda", self.params.len(), args.len()));
        }
        let mut globals = env.globals();
        for (param, arg) in self.params.iter().zip(args) {
            globals.insert(param.clone(), arg);
        }
        self.body.eval(&ScriptEnvironment::from_globals(globals))
    }
}

/// A deferred application of a target to arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    target: Box<Script>,
    args: Vec<Script>,
}

impl Apply {
    pub fn target(&self) -> &Script {
        &self.target
    }

    pub fn args(&self) -> &[Script] {
        &self.args
    }

    fn eval(&self, env: &ScriptEnvironment) -> Result<Script, ScriptError> {
        let target = self.target.eval(env)?;
        let args = self
            .args
            .iter()
            .map(|arg| arg.eval(env))
            .collect::<Result<Vec<_>, _>>()?;

        match target {
            Script::Function(func) => func.call(env, &args),
            Script::Dict(map) => {
                let key = single_string_arg("dict lookup", &args)?;
                match map.get(key) {
                    Some(value) => value.eval(env),
                    None => Err(ScriptError::UnknownKey {
                        key: key.to_string(),
                        known: map.keys().cloned().collect(),
                    }),
                }
            }
            Script::String(value) => match single_string_arg("string operation", &args)? {
                "file" => write_temp_file(&value),
                op => Err(ScriptError::UnsupportedStringOperation(op.to_string())),
            },
            Script::Lambda(lambda) => lambda.call(env, args),
            other => Err(ScriptError::NotCallable(other.type_name())),
        }
    }
}

fn single_string_arg<'a>(role: &str, args: &'a [Script]) -> Result<&'a str, ScriptError> {
    match args {
        [arg] => arg.expect_string(role),
        _ => Err(ScriptError::arity(role, 1, args.len())),
    }
}

fn write_temp_file(contents: &str) -> Result<Script, ScriptError> {
    let io_err = |e: std::io::Error| ScriptError::builtin("file", e);
    let mut file = tempfile::NamedTempFile::new().map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)?;
    let (_, path) = file.keep().map_err(|e| io_err(e.error))?;
    Ok(Script::String(path.display().to_string()))
}

/// A script value. Literal atoms evaluate to themselves; lists evaluate their
/// elements; dict values are only evaluated when looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    String(String),
    Bool(bool),
    Integer(i64),
    List(Vec<Script>),
    Dict(BTreeMap<String, Script>),
    Function(NativeFunction),
    Lambda(Lambda),
    Apply(Apply),
}

impl Script {
    pub fn string(value: impl Into<String>) -> Self {
        Script::String(value.into())
    }

    pub fn function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&ScriptEnvironment, &[Script]) -> Result<Script, ScriptError> + Send + Sync + 'static,
    {
        Script::Function(NativeFunction::new(name, func))
    }

    pub fn lambda(params: Vec<String>, body: Script) -> Self {
        Script::Lambda(Lambda {
            params,
            body: Box::new(body),
        })
    }

    pub fn apply(target: Script, args: Vec<Script>) -> Self {
        Script::Apply(Apply {
            target: Box::new(target),
            args,
        })
    }

    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Script)>,
    {
        Script::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Script::String(_) => "string",
            Script::Bool(_) => "bool",
            Script::Integer(_) => "integer",
            Script::List(_) => "list",
            Script::Dict(_) => "dict",
            Script::Function(_) => "function",
            Script::Lambda(_) => "lambda",
            Script::Apply(_) => "apply",
        }
    }

    pub fn eval(&self, env: &ScriptEnvironment) -> Result<Script, ScriptError> {
        match self {
            Script::List(items) => items
                .iter()
                .map(|item| item.eval(env))
                .collect::<Result<Vec<_>, _>>()
                .map(Script::List),
            Script::Apply(apply) => apply.eval(env),
            other => Ok(other.clone()),
        }
    }

    pub fn expect_string(&self, role: &str) -> Result<&str, ScriptError> {
        match self {
            Script::String(s) => Ok(s),
            other => Err(self.mismatch(role, "string", other)),
        }
    }

    pub fn expect_integer(&self, role: &str) -> Result<i64, ScriptError> {
        match self {
            Script::Integer(i) => Ok(*i),
            other => Err(self.mismatch(role, "integer", other)),
        }
    }

    pub fn expect_bool(&self, role: &str) -> Result<bool, ScriptError> {
        match self {
            Script::Bool(b) => Ok(*b),
            other => Err(self.mismatch(role, "bool", other)),
        }
    }

    pub fn expect_list(&self, role: &str) -> Result<&[Script], ScriptError> {
        match self {
            Script::List(items) => Ok(items),
            other => Err(self.mismatch(role, "list", other)),
        }
    }

    pub fn expect_dict(&self, role: &str) -> Result<&BTreeMap<String, Script>, ScriptError> {
        match self {
            Script::Dict(map) => Ok(map),
            other => Err(self.mismatch(role, "dict", other)),
        }
    }

    fn mismatch(&self, role: &str, expected: &'static str, got: &Script) -> ScriptError {
        ScriptError::TypeMismatch {
            role: role.to_string(),
            expected,
            got: got.type_name(),
        }
    }

    /// Lift a JSON-like value into a script.
    ///
    /// Integral numbers become integers; other numbers are kept as their decimal
    /// string form. `null` becomes the empty string.
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Script::String(String::new()),
            Value::Bool(b) => Script::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Script::Integer(i),
                None => Script::String(n.to_string()),
            },
            Value::String(s) => Script::String(s.clone()),
            Value::Array(items) => Script::List(items.iter().map(Script::from_json).collect()),
            Value::Object(map) => Script::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Script::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert an evaluated script back into a plain JSON-like value.
    pub fn to_json(&self) -> Result<serde_json::Value, ScriptError> {
        use serde_json::Value;
        Ok(match self {
            Script::String(s) => Value::String(s.clone()),
            Script::Bool(b) => Value::Bool(*b),
            Script::Integer(i) => Value::from(*i),
            Script::List(items) => Value::Array(
                items
                    .iter()
                    .map(Script::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Script::Dict(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Result<serde_json::Map<_, _>, _>>()?,
            ),
            other => return Err(ScriptError::NotAValue(other.type_name())),
        })
    }
}

impl From<&str> for Script {
    fn from(value: &str) -> Self {
        Script::String(value.to_string())
    }
}

impl From<String> for Script {
    fn from(value: String) -> Self {
        Script::String(value)
    }
}

impl From<bool> for Script {
    fn from(value: bool) -> Self {
        Script::Bool(value)
    }
}

impl From<i64> for Script {
    fn from(value: i64) -> Self {
        Script::Integer(value)
    }
}

impl From<Vec<Script>> for Script {
    fn from(value: Vec<Script>) -> Self {
        Script::List(value)
    }
}
