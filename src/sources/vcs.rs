//! Version-control client capability.
//!
//! The fetcher only needs four things from a VCS: whether a working copy
//! exists, which remote it tracks, and boolean-success update and checkout.
//! Any backend implementing [`VcsClient`] can be plugged in through
//! [`VcsBackend`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::build::CheckoutBuilder;
use git2::{AutotagOption, FetchOptions, Oid, Repository};

/// Operations on one working copy.
pub trait VcsClient {
    /// Whether a working copy exists at the client's path.
    fn path_exists(&self) -> bool;

    /// Remote URL recorded in the working copy.
    fn get_url(&self) -> Option<String>;

    /// Move the existing working copy to `version`.
    fn update(&self, version: &str) -> bool;

    /// Create a working copy of `url` at `version`.
    fn checkout(&self, url: &str, version: &str, shallow: bool) -> bool;
}

/// Opens clients for working-copy paths.
pub trait VcsBackend: Send + Sync {
    fn client(&self, path: &Path) -> Box<dyn VcsClient>;
}

/// Git backend built on libgit2.
#[derive(Debug, Clone, Default)]
pub struct GitBackend {
    /// Never contact the remote when updating an existing working copy
    offline: bool,
}

impl GitBackend {
    pub fn new() -> Self {
        GitBackend::default()
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

impl VcsBackend for GitBackend {
    fn client(&self, path: &Path) -> Box<dyn VcsClient> {
        Box::new(GitClient {
            path: path.to_path_buf(),
            offline: self.offline,
        })
    }
}

/// A git working copy.
#[derive(Debug, Clone)]
pub struct GitClient {
    path: PathBuf,
    offline: bool,
}

impl GitClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GitClient {
            path: path.into(),
            offline: false,
        }
    }

    fn open(&self) -> Result<Repository> {
        Repository::open(&self.path)
            .with_context(|| format!("failed to open git repository: {}", self.path.display()))
    }

    fn try_update(&self, version: &str) -> Result<()> {
        let repo = self.open()?;
        if !self.offline {
            fetch_version(&repo, version, false)?;
        }
        checkout_version(&repo, version)
    }

    fn try_checkout(&self, url: &str, version: &str, shallow: bool) -> Result<()> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("failed to create directory: {}", self.path.display()))?;

        let repo = Repository::init(&self.path)
            .with_context(|| format!("failed to init git repository: {}", self.path.display()))?;
        repo.remote("origin", url)
            .with_context(|| format!("failed to add remote {}", url))?;

        fetch_version(&repo, version, shallow)?;
        checkout_version(&repo, version)
    }
}

impl VcsClient for GitClient {
    fn path_exists(&self) -> bool {
        self.path.join(".git").exists()
    }

    fn get_url(&self) -> Option<String> {
        let repo = self.open().ok()?;
        let remote = repo.find_remote("origin").ok()?;
        remote.url().map(str::to_string)
    }

    fn update(&self, version: &str) -> bool {
        match self.try_update(version) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("update of {} failed: {:#}", self.path.display(), e);
                false
            }
        }
    }

    fn checkout(&self, url: &str, version: &str, shallow: bool) -> bool {
        match self.try_checkout(url, version, shallow) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("checkout of {} at {} failed: {:#}", url, version, e);
                false
            }
        }
    }
}

/// Refspecs that bring `version` in whether it names a tag or a branch.
fn refspecs(version: &str) -> [String; 2] {
    [
        format!("+refs/tags/{v}:refs/tags/{v}", v = version),
        format!("+refs/heads/{v}:refs/remotes/origin/{v}", v = version),
    ]
}

fn fetch_version(repo: &Repository, version: &str, shallow: bool) -> Result<()> {
    tracing::debug!("Fetching {}", version);

    let mut remote = repo.find_remote("origin")?;
    let mut opts = FetchOptions::new();
    opts.download_tags(AutotagOption::None);
    if shallow {
        opts.depth(1);
    }

    remote
        .fetch(&refspecs(version), Some(&mut opts), None)
        .with_context(|| format!("failed to fetch {}", version))?;

    Ok(())
}

/// Resolve `version` to a commit among local refs.
fn resolve_version(repo: &Repository, version: &str) -> Result<Oid> {
    let candidates = [
        format!("refs/tags/{}", version),
        format!("refs/remotes/origin/{}", version),
        version.to_string(),
    ];

    for candidate in &candidates {
        if let Ok(object) = repo.revparse_single(candidate) {
            let commit = object.peel_to_commit()?;
            return Ok(commit.id());
        }
    }

    anyhow::bail!("version `{}` not found", version)
}

fn checkout_version(repo: &Repository, version: &str) -> Result<()> {
    let oid = resolve_version(repo, version)?;
    let commit = repo.find_commit(oid)?;

    let mut checkout = CheckoutBuilder::new();
    checkout.force().remove_untracked(true);

    repo.checkout_tree(commit.as_object(), Some(&mut checkout))
        .with_context(|| format!("failed to check out {}", version))?;
    repo.set_head_detached(oid)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Create a local repository with one commit tagged `tag`.
    fn tagged_repo(dir: &Path, tag: &str, manifest: &str) -> String {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("stack.toml"), manifest).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("stack.toml")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        let commit = repo
            .commit(Some("HEAD"), &sig, &sig, "release", &tree, &[])
            .unwrap();
        let object = repo.find_object(commit, None).unwrap();
        repo.tag_lightweight(tag, &object, false).unwrap();

        url::Url::from_directory_path(dir).unwrap().to_string()
    }

    #[test]
    fn test_checkout_tag_from_local_remote() {
        let tmp = TempDir::new().unwrap();
        let upstream = tmp.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        let url = tagged_repo(&upstream, "release/foo/1.0.0-0", "[stack]\nname = \"foo\"\n");

        let client = GitClient::new(tmp.path().join("ws").join("foo"));
        assert!(!client.path_exists());
        assert!(client.checkout(&url, "release/foo/1.0.0-0", false));
        assert!(client.path_exists());
        assert_eq!(client.get_url().as_deref(), Some(url.as_str()));
        assert!(tmp.path().join("ws/foo/stack.toml").exists());

        assert!(client.update("release/foo/1.0.0-0"));
        assert!(!client.update("release/foo/9.9.9"));
    }

    #[test]
    fn test_checkout_missing_tag_fails() {
        let tmp = TempDir::new().unwrap();
        let upstream = tmp.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        let url = tagged_repo(&upstream, "release/foo/1.0.0", "[stack]\nname = \"foo\"\n");

        let client = GitClient::new(tmp.path().join("foo"));
        assert!(!client.checkout(&url, "release/foo/2.0.0", false));
    }
}
