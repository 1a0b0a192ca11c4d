//! Repository fetcher: working copy at a release tag → parsed manifest.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::manifest::{Manifest, ManifestError, ManifestParser, TomlManifestParser};
use crate::core::Workspace;
use crate::sources::vcs::{GitBackend, VcsBackend};
use crate::util::fs::remove_dir_all_if_exists;

/// Why a single stack could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("impossible to update/checkout `{url}` at `{version}`")]
    CheckoutFailed { url: String, version: String },

    #[error("no {file} found in `{url}` at `{version}`")]
    ManifestNotFound {
        url: String,
        version: String,
        file: String,
    },

    #[error("{file} in `{url}` at `{version}` is invalid: {source}")]
    InvalidManifest {
        url: String,
        version: String,
        file: String,
        #[source]
        source: ManifestError,
    },

    #[error("failed to prepare working copy {}: {message}", path.display())]
    Workspace { path: PathBuf, message: String },
}

impl FetchError {
    /// Checkout worked but the manifest file was not there.
    pub fn is_manifest_missing(&self) -> bool {
        matches!(self, FetchError::ManifestNotFound { .. })
    }
}

/// Fetches stack manifests into a workspace.
pub struct RepositoryFetcher {
    workspace: Workspace,
    backend: Box<dyn VcsBackend>,
    parser: Box<dyn ManifestParser>,
    shallow: bool,
}

impl RepositoryFetcher {
    /// Git-backed fetcher reading `stack.toml`.
    pub fn new(workspace: Workspace) -> Self {
        RepositoryFetcher::with_backend(workspace, Box::new(GitBackend::new()))
    }

    pub fn with_backend(workspace: Workspace, backend: Box<dyn VcsBackend>) -> Self {
        RepositoryFetcher {
            workspace,
            backend,
            parser: Box::new(TomlManifestParser::default()),
            shallow: true,
        }
    }

    pub fn parser(mut self, parser: Box<dyn ManifestParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Bring `workspace/<name>` to `version` of `url` and parse its manifest.
    pub fn fetch(&self, name: &str, url: &str, version: &str) -> Result<Manifest, FetchError> {
        let workdir = self
            .workspace
            .working_copy(name)
            .map_err(|e| FetchError::Workspace {
                path: self.workspace.root().to_path_buf(),
                message: format!("{:#}", e),
            })?;
        let client = self.backend.client(&workdir);

        let mut is_good = false;
        if client.path_exists() {
            if client.get_url().as_deref() == Some(url) {
                tracing::debug!("Updating {} to {}", workdir.display(), version);
                is_good = client.update(version);
            }
            if !is_good {
                tracing::debug!("Discarding working copy {}", workdir.display());
                remove_dir_all_if_exists(&workdir).map_err(|e| FetchError::Workspace {
                    path: workdir.clone(),
                    message: format!("{:#}", e),
                })?;
            }
        }

        if !is_good {
            is_good = client.checkout(url, version, self.shallow);
        }

        if !is_good {
            return Err(FetchError::CheckoutFailed {
                url: url.to_string(),
                version: version.to_string(),
            });
        }

        let file = self.parser.file_name();
        let manifest_path = workdir.join(file);
        if !manifest_path.is_file() {
            return Err(FetchError::ManifestNotFound {
                url: url.to_string(),
                version: version.to_string(),
                file: file.to_string(),
            });
        }

        self.parser
            .parse(&manifest_path)
            .map_err(|source| FetchError::InvalidManifest {
                url: url.to_string(),
                version: version.to_string(),
                file: file.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockVcs;

    fn fetcher(vcs: &MockVcs) -> RepositoryFetcher {
        RepositoryFetcher::with_backend(Workspace::temporary().unwrap(), Box::new(vcs.clone()))
    }

    #[test]
    fn test_fetch_fresh_checkout() {
        let vcs = MockVcs::new();
        vcs.add_manifest(
            "https://example.com/genmsg.git",
            "release/genmsg/0.4.1-0",
            "[stack]\nname = \"genmsg\"\ndepends = [\"catkin\"]\n",
        );

        let fetcher = fetcher(&vcs);
        let manifest = fetcher
            .fetch("genmsg", "https://example.com/genmsg.git", "release/genmsg/0.4.1-0")
            .unwrap();

        assert_eq!(manifest.project_name, "genmsg");
        assert_eq!(vcs.checkouts(), vec!["release/genmsg/0.4.1-0".to_string()]);
        assert!(vcs.updates().is_empty());
    }

    #[test]
    fn test_existing_copy_with_same_url_is_updated() {
        let vcs = MockVcs::new();
        let url = "https://example.com/foo.git";
        vcs.add_manifest(url, "release/foo/1.0.0", "[stack]\nname = \"foo\"\n");
        vcs.add_manifest(url, "release/foo/1.1.0", "[stack]\nname = \"foo\"\nversion = \"1.1.0\"\n");

        let fetcher = fetcher(&vcs);
        fetcher.fetch("foo", url, "release/foo/1.0.0").unwrap();
        let manifest = fetcher.fetch("foo", url, "release/foo/1.1.0").unwrap();

        assert_eq!(manifest.version.as_deref(), Some("1.1.0"));
        assert_eq!(vcs.updates(), vec!["release/foo/1.1.0".to_string()]);
        assert_eq!(vcs.checkouts().len(), 1);
    }

    #[test]
    fn test_existing_copy_with_other_url_is_replaced() {
        let vcs = MockVcs::new();
        vcs.add_manifest("https://old.example.com/foo.git", "v1", "[stack]\nname = \"foo\"\n");
        vcs.add_manifest("https://new.example.com/foo.git", "v1", "[stack]\nname = \"foo_ng\"\n");

        let fetcher = fetcher(&vcs);
        fetcher.fetch("foo", "https://old.example.com/foo.git", "v1").unwrap();
        let manifest = fetcher
            .fetch("foo", "https://new.example.com/foo.git", "v1")
            .unwrap();

        assert_eq!(manifest.project_name, "foo_ng");
        assert!(vcs.updates().is_empty());
        assert_eq!(vcs.checkouts().len(), 2);
    }

    #[test]
    fn test_failed_update_falls_back_to_checkout() {
        let vcs = MockVcs::new();
        let url = "https://example.com/foo.git";
        vcs.add_manifest(url, "v1", "[stack]\nname = \"foo\"\n");
        vcs.add_manifest(url, "v2", "[stack]\nname = \"foo\"\n");

        let fetcher = fetcher(&vcs);
        fetcher.fetch("foo", url, "v1").unwrap();
        vcs.fail_updates(true);
        fetcher.fetch("foo", url, "v2").unwrap();

        assert_eq!(vcs.checkouts(), vec!["v1".to_string(), "v2".to_string()]);
    }

    #[test]
    fn test_checkout_failure() {
        let vcs = MockVcs::new();
        let err = fetcher(&vcs)
            .fetch("foo", "https://example.com/foo.git", "release/foo/1.0.0")
            .unwrap_err();
        assert!(matches!(err, FetchError::CheckoutFailed { .. }));
    }

    #[test]
    fn test_missing_and_invalid_manifest() {
        let vcs = MockVcs::new();
        let url = "https://example.com/foo.git";
        vcs.add_empty(url, "v1");
        vcs.add_manifest(url, "v2", "this is not toml [");

        let fetcher = fetcher(&vcs);
        let missing = fetcher.fetch("foo", url, "v1").unwrap_err();
        assert!(missing.is_manifest_missing());

        let invalid = fetcher.fetch("foo", url, "v2").unwrap_err();
        assert!(matches!(invalid, FetchError::InvalidManifest { .. }));
        assert!(!invalid.is_manifest_missing());
    }

    #[test]
    fn test_name_outside_workspace_never_touched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let project = tmp.path().join("proj");
        std::fs::create_dir_all(&project).unwrap();
        // looks like a working copy of some other remote
        std::fs::write(project.join(".mock-remote"), "https://example.com/proj.git").unwrap();
        std::fs::write(project.join("keep.txt"), "precious").unwrap();

        let vcs = MockVcs::new();
        vcs.add_manifest("https://example.com/x.git", "v1", "[stack]\nname = \"x\"\n");
        let fetcher = RepositoryFetcher::with_backend(
            Workspace::at(project.join("ws")).unwrap(),
            Box::new(vcs.clone()),
        );

        let err = fetcher
            .fetch("..", "https://example.com/x.git", "v1")
            .unwrap_err();

        assert!(matches!(err, FetchError::Workspace { .. }));
        assert!(project.join("keep.txt").exists());
        assert!(vcs.checkouts().is_empty());
    }
}
