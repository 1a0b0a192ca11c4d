//! High-level operations.
//!
//! This module contains the implementation of stackwalk commands.

pub mod fetch;
pub mod walk;

pub use fetch::{
    fallback_tag, fetch_stacks, release_tag, BatchError, FetchFailure, FetchOptions, FetchReport,
};
pub use walk::{walk_dependencies, WalkError, WalkOptions};
