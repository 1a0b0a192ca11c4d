//! Stack sources.
//!
//! Fetching a stack means bringing a working copy of its release repository
//! to a tag and reading the manifest out of it.

pub mod fetcher;
pub mod vcs;

pub use fetcher::{FetchError, RepositoryFetcher};
pub use vcs::{GitBackend, GitClient, VcsBackend, VcsClient};
