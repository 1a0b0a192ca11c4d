//! Release catalog: which repository and release version each stack comes from.
//!
//! The catalog is read from a TOML (or JSON) file of the form:
//!
//! ```toml
//! [repositories.common_msgs]
//! url = "https://github.com/ros-gbp/common_msgs-release.git"
//! version = "1.9.11-0"
//! ```
//!
//! Entries without a `version` are kept in the catalog but never fetched.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// One known stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog key of the stack
    pub name: String,

    /// Repository location
    pub url: String,

    /// Full release version (e.g. `1.2.3-0`), if released
    pub version: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: Option<&str>) -> Self {
        CatalogEntry {
            name: name.into(),
            url: url.into(),
            version: version.map(str::to_string),
        }
    }
}

/// Raw repository entry as deserialized from the catalog file.
#[derive(Debug, Deserialize, Serialize)]
struct RawRepository {
    url: String,

    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawCatalog {
    #[serde(default)]
    repositories: BTreeMap<String, RawRepository>,
}

/// All stacks known to a release, keyed and iterated by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Load a catalog file. `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let raw: RawCatalog = if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse catalog: {}", path.display()))?
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse catalog: {}", path.display()))?
        };

        Self::from_raw(raw).with_context(|| format!("invalid catalog: {}", path.display()))
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawCatalog = toml::from_str(contents).context("failed to parse catalog")?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self> {
        let mut catalog = Catalog::new();
        for (name, repo) in raw.repositories {
            validate_name(&name)?;
            validate_url(&repo.url).with_context(|| format!("repository `{}`", name))?;
            let version = repo.version.filter(|v| !v.trim().is_empty());
            catalog.insert(CatalogEntry {
                name,
                url: repo.url,
                version,
            });
        }
        Ok(catalog)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CatalogEntry> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogEntry>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for entry in iter {
            catalog.insert(entry);
        }
        catalog
    }
}

/// Check that a stack name is usable as a working-copy directory name.
///
/// The name must be exactly one normal path component: no separators, no
/// `.` or `..`.
pub fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == name,
        _ => false,
    };

    if !single || name.contains('\\') {
        bail!("invalid stack name `{}`: must be a plain directory name", name);
    }
    Ok(())
}

/// Accept scheme URLs (`https://`, `ssh://`, `file://`) and scp-like
/// `user@host:path` remotes.
fn validate_url(url: &str) -> Result<()> {
    if Url::parse(url).is_ok() {
        return Ok(());
    }

    if let Some((user_host, path)) = url.split_once(':') {
        if user_host.contains('@') && !path.is_empty() && !user_host.contains('/') {
            return Ok(());
        }
    }

    bail!("invalid repository url: {}", url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_toml_str(
            r#"
[repositories.ros_comm]
url = "https://github.com/ros-gbp/ros_comm-release.git"
version = "1.9.41-0"

[repositories.unreleased]
url = "git@github.com:ros/unreleased.git"
"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let entry = catalog.get("ros_comm").unwrap();
        assert_eq!(entry.version.as_deref(), Some("1.9.41-0"));
        assert!(catalog.get("unreleased").unwrap().version.is_none());

        let names: Vec<_> = catalog.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ros_comm", "unreleased"]);
    }

    #[test]
    fn test_blank_version_is_unreleased() {
        let catalog = Catalog::from_toml_str(
            "[repositories.foo]\nurl = \"https://example.com/foo.git\"\nversion = \"\"\n",
        )
        .unwrap();
        assert!(catalog.get("foo").unwrap().version.is_none());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Catalog::from_toml_str("[repositories.foo]\nurl = \"not a url\"\n").unwrap_err();
        assert!(format!("{:#}", err).contains("invalid repository url"));
    }

    #[test]
    fn test_path_like_names_rejected() {
        for name in ["..", ".", "a/../../x", "nested/name", "back\\\\slash", ""] {
            let toml = format!(
                "[repositories.\"{}\"]\nurl = \"https://example.com/x.git\"\n",
                name
            );
            let err = Catalog::from_toml_str(&toml).unwrap_err();
            assert!(
                format!("{:#}", err).contains("invalid stack name"),
                "accepted {:?}",
                name
            );
        }

        assert!(validate_name("common_msgs").is_ok());
        assert!(validate_name("ros-comm.v2").is_ok());
    }

    #[test]
    fn test_load_json_catalog() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"repositories": {"foo": {"url": "file:///srv/foo.git", "version": "0.1.0-2"}}}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(
            catalog.get("foo").unwrap(),
            &CatalogEntry::new("foo", "file:///srv/foo.git", Some("0.1.0-2"))
        );
    }
}
