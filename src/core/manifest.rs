//! Stack manifest schema and parsing.
//!
//! A stack's manifest declares its project name and the names of the stacks
//! it needs at build time and at run time. The default on-disk format is
//! `stack.toml`:
//!
//! ```toml
//! [stack]
//! name = "ros_comm"
//! version = "1.9.41"
//! build-depends = ["genmsg", "cpp_common"]
//! buildtool-depends = ["catkin"]
//! depends = ["roscpp_core"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default manifest file name inside a checkout.
pub const MANIFEST_NAME: &str = "stack.toml";

/// A declared dependency. Only the name matters for closure computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DependencyRef {
    pub name: String,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>) -> Self {
        DependencyRef { name: name.into() }
    }
}

impl From<String> for DependencyRef {
    fn from(name: String) -> Self {
        DependencyRef { name }
    }
}

impl From<DependencyRef> for String {
    fn from(dep: DependencyRef) -> Self {
        dep.name
    }
}

/// Parsed manifest of one stack at one release tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared project name (may differ from the catalog key)
    #[serde(rename = "name")]
    pub project_name: String,

    /// Declared version, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Build-time dependencies
    #[serde(default, rename = "build-depends")]
    pub build_depends: Vec<DependencyRef>,

    /// Build tools (needed at build time as well)
    #[serde(default, rename = "buildtool-depends")]
    pub buildtool_depends: Vec<DependencyRef>,

    /// Run-time dependencies
    #[serde(default)]
    pub depends: Vec<DependencyRef>,
}

impl Manifest {
    pub fn new(project_name: impl Into<String>) -> Self {
        Manifest {
            project_name: project_name.into(),
            version: None,
            build_depends: Vec::new(),
            buildtool_depends: Vec::new(),
            depends: Vec::new(),
        }
    }

    pub fn with_build_depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_depends
            .extend(names.into_iter().map(DependencyRef::new));
        self
    }

    pub fn with_buildtool_depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buildtool_depends
            .extend(names.into_iter().map(DependencyRef::new));
        self
    }

    pub fn with_depends<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(names.into_iter().map(DependencyRef::new));
        self
    }

    /// Names needed at build time, in declaration order.
    pub fn build_dependency_names(&self) -> Vec<String> {
        self.build_depends
            .iter()
            .chain(&self.buildtool_depends)
            .map(|d| d.name.clone())
            .collect()
    }

    /// Names needed at run time, in declaration order.
    pub fn runtime_dependency_names(&self) -> Vec<String> {
        self.depends.iter().map(|d| d.name.clone()).collect()
    }

    /// Parse manifest TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            toml::from_str(contents).map_err(|e| ManifestError::Invalid(e.to_string()))?;
        let manifest = raw.stack;

        if manifest.project_name.trim().is_empty() {
            return Err(ManifestError::Invalid("stack name is empty".to_string()));
        }

        Ok(manifest)
    }
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    stack: Manifest,
}

/// Manifest read/parse failure.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// Reads manifests out of a checkout.
pub trait ManifestParser: Send + Sync {
    /// Manifest file name relative to the checkout root.
    fn file_name(&self) -> &str;

    /// Parse the manifest at `path`.
    fn parse(&self, path: &Path) -> Result<Manifest, ManifestError>;
}

/// Parser for `stack.toml`-style manifests.
#[derive(Debug, Clone)]
pub struct TomlManifestParser {
    file_name: String,
}

impl TomlManifestParser {
    pub fn new(file_name: impl Into<String>) -> Self {
        TomlManifestParser {
            file_name: file_name.into(),
        }
    }
}

impl Default for TomlManifestParser {
    fn default() -> Self {
        TomlManifestParser::new(MANIFEST_NAME)
    }
}

impl ManifestParser for TomlManifestParser {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn parse(&self, path: &Path) -> Result<Manifest, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Manifest::from_toml_str(&contents)
    }
}
