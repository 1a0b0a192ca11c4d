//! Dependency resolution.
//!
//! Turns fetched manifests into dependency tables and computes each
//! package's build dependency closure. Everything here is pure: all I/O
//! happens before resolution.

pub mod closure;
pub mod tables;

pub use closure::{
    compute_closure, ClosureMode, ClosureOptions, DependencyGraph, DependencyMap, EdgeKind,
};
pub use tables::{DependencyTables, TablesError};
