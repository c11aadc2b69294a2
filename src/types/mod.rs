// ABOUTME: Validated names and addressing types shared by the state model and compiler.
// ABOUTME: Covers name rules, deployment addresses and release references.

mod address;
mod name;
mod release_id;

pub use address::{DeploymentAddress, PATH_SEPARATOR};
pub use name::{NameError, NameKind};
pub use release_id::{DEFAULT_PROJECT, ReleaseId, ReleaseIdError};
