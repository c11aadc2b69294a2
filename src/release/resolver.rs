// ABOUTME: Lookup of release metadata by reference, and a directory-backed implementation.
// ABOUTME: Files are named <name>-v<version>.yml|.yaml|.json; latest picks the highest version.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::{ReleaseMetadata, ResolveError};
use crate::types::ReleaseId;

const EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Fetches release metadata for a release reference such as
/// `archive-full-v0.1`, `acme/db-v1.@` or `acme/db-latest`.
pub trait DependencyResolver {
    fn dependency_metadata(&self, reference: &str) -> Result<ReleaseMetadata, ResolveError>;
}

/// Resolves releases from metadata files in a single directory.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    dir: PathBuf,
}

impl DirectoryResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every (version, path) pair available for release `name`.
    fn versions_of(&self, name: &str) -> Result<Vec<(String, PathBuf)>, ResolveError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ResolveError::Read {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let prefix = format!("{name}-v");
        let mut versions = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| ResolveError::Read {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            let has_known_extension = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e));
            if !has_known_extension {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(version) = stem.strip_prefix(&prefix) {
                versions.push((version.to_string(), path.clone()));
            }
        }
        Ok(versions)
    }

    fn load(path: &Path) -> Result<ReleaseMetadata, ResolveError> {
        let content = std::fs::read_to_string(path).map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if path.extension().is_some_and(|e| e == "json") {
            ReleaseMetadata::from_json(&content)
        } else {
            ReleaseMetadata::from_yaml(&content)
        }
    }
}

impl DependencyResolver for DirectoryResolver {
    fn dependency_metadata(&self, reference: &str) -> Result<ReleaseMetadata, ResolveError> {
        let id = ReleaseId::parse(reference)?;
        let candidates = self.versions_of(id.name())?;

        // `None` for latest; `1.@` matches any version starting with `1.`.
        let wanted = id.version();
        let best = candidates
            .into_iter()
            .filter(|(version, _)| match wanted {
                None => true,
                Some(w) => match w.strip_suffix('@') {
                    Some(prefix) => version.starts_with(prefix),
                    None => version == w,
                },
            })
            .max_by(|(a, _), (b, _)| compare_versions(a, b));

        let (version, path) = best.ok_or_else(|| ResolveError::NotFound(reference.to_string()))?;
        tracing::debug!(
            "Resolved {} to version {} ({})",
            reference,
            version,
            path.display()
        );
        Self::load(&path)
    }
}

/// Dotted version ordering: numeric parts compare numerically, anything else
/// lexically, and a longer version wins a tie on the common prefix.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
