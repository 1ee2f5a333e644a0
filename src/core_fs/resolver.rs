use crate::core_fs::error::PathError;
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Maps client-supplied paths onto the served root.
///
/// The traversal filter is purely textual: it runs before canonicalization,
/// so a symlink inside the root that points elsewhere is followed. The
/// substrings `./` and `../` and the exact inputs `..` and `/..` are refused
/// outright; anything else must still land under the root once `..`
/// components are applied lexically.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: String,
}

impl PathResolver {
    /// `root` must already be canonical (see `Config::validate`).
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns true when `input` trips the traversal filter.
    pub fn is_traversal(input: &str) -> bool {
        input.contains("./") || input.contains("../") || input == ".." || input == "/.."
    }

    /// True when `path` stays at or below the root with `.` and `..` applied
    /// lexically. Symlinks are not consulted.
    fn stays_under_root(&self, path: &str) -> bool {
        let mut normalized = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::CurDir => {}
                other => normalized.push(other.as_os_str()),
            }
        }
        normalized.starts_with(&self.root)
    }

    /// Resolves `input` against `cwd` (relative) or the root (leading `/`)
    /// and canonicalizes the result.
    pub async fn resolve(&self, input: &str, cwd: &str) -> Result<PathBuf, PathError> {
        if Self::is_traversal(input) {
            debug!("Rejected path {:?} (cwd {:?})", input, cwd);
            return Err(PathError::TraversalRejected(input.to_string()));
        }

        let joined = if input.starts_with('/') {
            format!("{}{}", self.root, input)
        } else {
            format!("{}/{}", cwd, input)
        };

        if !self.stays_under_root(&joined) {
            debug!("Rejected path {:?} leaving root (cwd {:?})", input, cwd);
            return Err(PathError::TraversalRejected(input.to_string()));
        }

        tokio::fs::canonicalize(&joined)
            .await
            .map_err(|source| PathError::NotFound {
                path: input.to_string(),
                source,
            })
    }
}
