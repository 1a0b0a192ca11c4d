//! Test utilities and mocks for stackwalk unit tests.
//!
//! [`MockVcs`] stands in for a git server: repositories are registered by
//! URL and tag, and "checking out" writes the registered manifest into the
//! working copy on disk so the fetcher's filesystem handling is exercised
//! for real.
//!
//! # Example
//!
//! ```rust,ignore
//! let vcs = MockVcs::new();
//! vcs.add_manifest("https://example.com/foo.git", "release/foo/1.0.0", "[stack]\nname = \"foo\"");
//! let fetcher = RepositoryFetcher::with_backend(Workspace::temporary()?, Box::new(vcs.clone()));
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::manifest::MANIFEST_NAME;
use crate::sources::vcs::{VcsBackend, VcsClient};

/// Marker file recording the remote URL of a mock working copy.
const URL_MARKER: &str = ".mock-remote";

#[derive(Debug, Default)]
struct MockState {
    /// url -> tag -> manifest contents (None = tag exists, no manifest)
    repos: HashMap<String, HashMap<String, Option<String>>>,
    checkouts: Vec<String>,
    updates: Vec<String>,
    fail_updates: bool,
}

/// In-memory VCS backend. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    state: Arc<Mutex<MockState>>,
}

impl MockVcs {
    pub fn new() -> Self {
        MockVcs::default()
    }

    /// Register `tag` of `url` with a manifest.
    pub fn add_manifest(&self, url: &str, tag: &str, contents: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .repos
            .entry(url.to_string())
            .or_default()
            .insert(tag.to_string(), Some(contents.to_string()));
    }

    /// Register `tag` of `url` without a manifest file.
    pub fn add_empty(&self, url: &str, tag: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .repos
            .entry(url.to_string())
            .or_default()
            .insert(tag.to_string(), None);
    }

    /// Make every subsequent update report failure.
    pub fn fail_updates(&self, fail: bool) {
        self.state.lock().unwrap().fail_updates = fail;
    }

    /// Versions successfully checked out, in order.
    pub fn checkouts(&self) -> Vec<String> {
        self.state.lock().unwrap().checkouts.clone()
    }

    /// Versions successfully updated to, in order.
    pub fn updates(&self) -> Vec<String> {
        self.state.lock().unwrap().updates.clone()
    }
}

impl VcsBackend for MockVcs {
    fn client(&self, path: &Path) -> Box<dyn VcsClient> {
        Box::new(MockClient {
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
        })
    }
}

struct MockClient {
    path: PathBuf,
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    /// Write the working copy for `url` at `tag`. Returns false for unknown tags.
    fn materialize(&self, state: &MockState, url: &str, tag: &str) -> bool {
        let Some(contents) = state.repos.get(url).and_then(|tags| tags.get(tag)) else {
            return false;
        };

        if std::fs::create_dir_all(&self.path).is_err() {
            return false;
        }
        let manifest = self.path.join(MANIFEST_NAME);
        let written = match contents {
            Some(contents) => std::fs::write(&manifest, contents),
            None => {
                let _ = std::fs::remove_file(&manifest);
                Ok(())
            }
        };

        written.is_ok() && std::fs::write(self.path.join(URL_MARKER), url).is_ok()
    }
}

impl VcsClient for MockClient {
    fn path_exists(&self) -> bool {
        self.path.join(URL_MARKER).exists()
    }

    fn get_url(&self) -> Option<String> {
        std::fs::read_to_string(self.path.join(URL_MARKER)).ok()
    }

    fn update(&self, version: &str) -> bool {
        let Some(url) = self.get_url() else {
            return false;
        };
        let mut state = self.state.lock().unwrap();
        if state.fail_updates || !self.materialize(&state, &url, version) {
            return false;
        }
        state.updates.push(version.to_string());
        true
    }

    fn checkout(&self, url: &str, version: &str, _shallow: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        if !self.materialize(&state, url, version) {
            return false;
        }
        state.checkouts.push(version.to_string());
        true
    }
}
