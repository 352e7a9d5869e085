//! Mapping of public request paths onto files below a served directory.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::catalog::url_path;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("path escapes the served directory: {0}")]
    Traversal(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One child of a browsed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Path relative to the served root, `/`-separated.
    pub path: String,
    pub is_dir: bool,
}

/// Resolves request paths against a single root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Finds the file or directory named by `request`.
    ///
    /// If the literal path is missing, its last extension is stripped and the
    /// lookup retried once, so `sub/b.jpeg.jpg` finds `sub/b.jpeg`. Paths with
    /// `..` or a root are rejected before touching the filesystem, and the
    /// result must canonicalize to somewhere inside the root.
    pub fn resolve(&self, request: &str) -> Result<PathBuf, ResolveError> {
        let relative = sanitize(request)?;
        let candidate = self.root.join(&relative);

        let found = if candidate.exists() {
            candidate
        } else {
            let stripped = candidate.with_extension("");
            if stripped == candidate || !stripped.exists() {
                return Err(ResolveError::NotFound(request.to_string()));
            }
            tracing::debug!(
                request,
                resolved = %stripped.display(),
                "Resolved request by stripping extension"
            );
            stripped
        };

        self.contain(found, request)
    }

    /// Lists the direct children of the directory named by `request`, sorted by name.
    ///
    /// An empty `request` lists the root itself.
    pub fn list(&self, request: &str) -> Result<Vec<DirectoryEntry>, ResolveError> {
        let dir = if sanitize(request)?.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.resolve(request)?
        };
        if !dir.is_dir() {
            return Err(ResolveError::NotFound(request.to_string()));
        }

        let canonical_root = self.root.canonicalize()?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let relative = path
                .strip_prefix(&canonical_root)
                .or_else(|_| path.strip_prefix(&self.root))
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

            entries.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: url_path(&relative),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(entries)
    }

    fn contain(&self, path: PathBuf, request: &str) -> Result<PathBuf, ResolveError> {
        let root = self.root.canonicalize()?;
        let resolved = path.canonicalize()?;
        if !resolved.starts_with(&root) {
            tracing::warn!(request, resolved = %resolved.display(), "Rejected path outside root");
            return Err(ResolveError::Traversal(request.to_string()));
        }
        Ok(resolved)
    }
}

/// Turns a request path into a relative path made only of normal components.
fn sanitize(request: &str) -> Result<PathBuf, ResolveError> {
    let mut relative = PathBuf::new();
    for component in Path::new(request.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                tracing::warn!(request, "Rejected path traversal attempt");
                return Err(ResolveError::Traversal(request.to_string()));
            }
        }
    }
    Ok(relative)
}
