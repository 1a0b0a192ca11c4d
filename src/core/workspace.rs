//! Workspace directory holding one working copy per stack.
//!
//! A workspace is either a directory the caller owns (created if absent and
//! left in place) or a temporary directory owned by the handle and removed
//! when the handle is dropped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::catalog::validate_name;
use crate::util::fs::ensure_dir;

#[derive(Debug)]
enum Root {
    Persistent(PathBuf),
    Temporary(TempDir),
}

/// Handle to the directory stacks are checked out into.
#[derive(Debug)]
pub struct Workspace {
    root: Root,
}

impl Workspace {
    /// Use `path` as the workspace, creating it if needed.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_dir(&path)?;
        Ok(Workspace {
            root: Root::Persistent(path),
        })
    }

    /// Create a fresh temporary workspace.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("stackwalk-")
            .tempdir()
            .context("failed to create temporary workspace")?;
        tracing::debug!("Using temporary workspace {}", dir.path().display());
        Ok(Workspace {
            root: Root::Temporary(dir),
        })
    }

    /// Use `path` if given, otherwise a temporary directory.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Workspace::at(path),
            None => Workspace::temporary(),
        }
    }

    pub fn root(&self) -> &Path {
        match &self.root {
            Root::Persistent(path) => path,
            Root::Temporary(dir) => dir.path(),
        }
    }

    /// Whether the directory is removed when this handle is dropped.
    pub fn is_temporary(&self) -> bool {
        matches!(self.root, Root::Temporary(_))
    }

    /// Working copy path for a stack. Distinct names never share a path.
    ///
    /// Names that would resolve outside the workspace root are rejected.
    pub fn working_copy(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root().join(name))
    }
}
