// ABOUTME: Environment input values with interpolation support.
// ABOUTME: Handles JSON-like literals and references to process environment variables.

use crate::error::{Error, Result};
use crate::state::Inputs;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<serde_json::Value>,
    },
    Literal(serde_json::Value),
}

impl InputValue {
    pub fn resolve(&self) -> Result<serde_json::Value> {
        match self {
            InputValue::Literal(v) => Ok(v.clone()),
            InputValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(serde_json::Value::String(val)),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

pub fn resolve_inputs(map: &BTreeMap<String, InputValue>) -> Result<Inputs> {
    map.iter()
        .map(|(k, v)| v.resolve().map(|resolved| (k.clone(), resolved)))
        .collect()
}
