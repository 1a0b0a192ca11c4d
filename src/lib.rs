//! stackwalk - build dependency closures for a catalog of released stacks
//!
//! This crate fetches each stack's release repository at its release tag,
//! reads the stack manifest, and computes which binary packages every stack
//! needs installed to build.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// Provides an in-memory version control backend so fetch and resolve
/// operations can run without a network or a git binary.
#[cfg(test)]
pub mod test_support;

pub use core::{catalog::Catalog, manifest::Manifest, workspace::Workspace};
pub use ops::{walk_dependencies, WalkError, WalkOptions};
pub use resolver::{compute_closure, DependencyMap, DependencyTables};
