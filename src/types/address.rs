// ABOUTME: Non-owning handle that locates a deployment inside an environment tree.
// ABOUTME: Records the root deployment plus each (stage, child) hop down to the target.

use std::fmt;

/// Separator used when rendering a deployment path, e.g. `web:_/archive`.
pub const PATH_SEPARATOR: char = ':';

/// Location of a (possibly nested) deployment within an environment.
///
/// Nested deployments live under a stage of their parent, so every hop below the
/// root records the parent stage it goes through. The rendered path only shows
/// deployment names; the stages are kept so inheritance walks can find the exact
/// ancestor stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeploymentAddress {
    root: String,
    nested: Vec<Hop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Hop {
    stage: String,
    name: String,
}

impl DeploymentAddress {
    /// Address of a root deployment.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            root: name.into(),
            nested: Vec::new(),
        }
    }

    /// Address of a deployment nested under `stage` of this one.
    pub fn child(&self, stage: &str, name: &str) -> Self {
        let mut nested = self.nested.clone();
        nested.push(Hop {
            stage: stage.to_string(),
            name: name.to_string(),
        });
        Self {
            root: self.root.clone(),
            nested,
        }
    }

    /// Name of the root deployment this address starts from.
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Name of the addressed deployment itself.
    pub fn name(&self) -> &str {
        self.nested.last().map(|hop| hop.name.as_str()).unwrap_or(&self.root)
    }

    pub fn is_root(&self) -> bool {
        self.nested.is_empty()
    }

    /// Number of hops below the root deployment.
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    /// The parent address and the parent stage this deployment lives under.
    pub fn parent(&self) -> Option<(DeploymentAddress, &str)> {
        let (last, rest) = self.nested.split_last()?;
        let parent = Self {
            root: self.root.clone(),
            nested: rest.to_vec(),
        };
        Some((parent, last.stage.as_str()))
    }

    /// The (stage, name) hops below the root, outermost first.
    pub fn hops(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nested
            .iter()
            .map(|hop| (hop.stage.as_str(), hop.name.as_str()))
    }
}

impl fmt::Display for DeploymentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for hop in &self.nested {
            write!(f, "{PATH_SEPARATOR}{}", hop.name)?;
        }
        Ok(())
    }
}
