//! Dependency tables built from fetched manifests.
//!
//! Three aligned mappings keyed by manifest-source key (the manifest's
//! declared project name, or the catalog key for placeholders):
//! canonical package name, raw build-dependency names and raw
//! runtime-dependency names. Raw names may point outside the catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::manifest::Manifest;
use crate::core::naming::NamingRule;

/// Tables whose key sets disagree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TablesError {
    #[error("`{key}` has dependency lists but no package entry")]
    MissingPackage { key: String },

    #[error("package `{key}` has no {kind} dependency list")]
    MissingList { key: String, kind: &'static str },
}

/// The per-package declared-dependency graph, before closure.
///
/// Invariant: `packages`, `build_dependencies` and `runtime_dependencies`
/// share exactly the same key set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTables")]
pub struct DependencyTables {
    packages: BTreeMap<String, String>,
    build_dependencies: BTreeMap<String, Vec<String>>,
    runtime_dependencies: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawTables {
    packages: BTreeMap<String, String>,
    #[serde(default)]
    build_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    runtime_dependencies: BTreeMap<String, Vec<String>>,
}

impl TryFrom<RawTables> for DependencyTables {
    type Error = TablesError;

    fn try_from(raw: RawTables) -> Result<Self, Self::Error> {
        for key in raw
            .build_dependencies
            .keys()
            .chain(raw.runtime_dependencies.keys())
        {
            if !raw.packages.contains_key(key) {
                return Err(TablesError::MissingPackage { key: key.clone() });
            }
        }
        for key in raw.packages.keys() {
            if !raw.build_dependencies.contains_key(key) {
                return Err(TablesError::MissingList {
                    key: key.clone(),
                    kind: "build",
                });
            }
            if !raw.runtime_dependencies.contains_key(key) {
                return Err(TablesError::MissingList {
                    key: key.clone(),
                    kind: "runtime",
                });
            }
        }

        Ok(DependencyTables {
            packages: raw.packages,
            build_dependencies: raw.build_dependencies,
            runtime_dependencies: raw.runtime_dependencies,
        })
    }
}

impl DependencyTables {
    pub fn new() -> Self {
        DependencyTables::default()
    }

    /// Build the tables from manifests keyed by catalog name.
    ///
    /// A `None` manifest is a placeholder: its canonical name comes from the
    /// catalog key and it declares no dependencies.
    pub fn build(naming: &dyn NamingRule, manifests: &BTreeMap<String, Option<Manifest>>) -> Self {
        let mut tables = DependencyTables::new();

        for (name, manifest) in manifests {
            match manifest {
                None => {
                    tables.insert(
                        name.clone(),
                        naming.placeholder_name(name),
                        Vec::new(),
                        Vec::new(),
                    );
                }
                Some(manifest) => {
                    let key = manifest.project_name.clone();
                    if key != *name {
                        tracing::debug!("Stack `{}` declares project name `{}`", name, key);
                    }
                    if tables.contains(&key) {
                        tracing::warn!(
                            "Project `{}` declared by more than one stack, `{}` wins",
                            key,
                            name
                        );
                    }
                    tables.insert(
                        key,
                        naming.package_name(&manifest.project_name),
                        manifest.build_dependency_names(),
                        manifest.runtime_dependency_names(),
                    );
                }
            }
        }

        tables
    }

    /// Add or replace one package in all three tables.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        canonical: impl Into<String>,
        build: Vec<String>,
        runtime: Vec<String>,
    ) {
        let key = key.into();
        self.packages.insert(key.clone(), canonical.into());
        self.build_dependencies.insert(key.clone(), build);
        self.runtime_dependencies.insert(key, runtime);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.packages.contains_key(key)
    }

    /// Canonical name of a catalog key.
    pub fn canonical(&self, key: &str) -> Option<&str> {
        self.packages.get(key).map(String::as_str)
    }

    pub fn build_dependencies(&self, key: &str) -> &[String] {
        self.build_dependencies
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn runtime_dependencies(&self, key: &str) -> &[String] {
        self.runtime_dependencies
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Catalog keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
