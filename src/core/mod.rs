//! Core data structures for stackwalk.
//!
//! This module contains the foundational types used throughout stackwalk:
//! - The release catalog
//! - Stack manifests and their dependency lists
//! - Binary package naming
//! - Workspace management

pub mod catalog;
pub mod manifest;
pub mod naming;
pub mod workspace;

pub use catalog::{Catalog, CatalogEntry};
pub use manifest::{DependencyRef, Manifest, MANIFEST_NAME};
pub use naming::{DistroNaming, NamingRule};
pub use workspace::Workspace;
