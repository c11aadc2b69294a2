// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates project and environment names as they are read.

use serde::Deserialize;

use crate::types::NameKind;

pub fn deserialize_project_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_name(deserializer, NameKind::Project)
}

pub fn deserialize_environment_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_name(deserializer, NameKind::Environment)
}

fn deserialize_name<'de, D>(deserializer: D, kind: NameKind) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    kind.validate(&s).map_err(serde::de::Error::custom)?;
    Ok(s)
}
