//! Full pipeline: fetch every stack, build the tables, compute closures.

use thiserror::Error;

use crate::core::catalog::Catalog;
use crate::core::naming::DistroNaming;
use crate::ops::fetch::{fetch_stacks, BatchError, FetchOptions};
use crate::resolver::{compute_closure, ClosureOptions, DependencyMap, DependencyTables};
use crate::sources::RepositoryFetcher;

/// Options for [`walk_dependencies`].
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub fetch: FetchOptions,
    pub closure: ClosureOptions,
}

/// Why a walk produced no usable result.
#[derive(Debug, Error)]
pub enum WalkError {
    /// Some stacks could not be fetched. `partial` holds the result computed
    /// from the stacks that were.
    #[error("{error}")]
    Batch {
        #[source]
        error: BatchError,
        partial: DependencyMap,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WalkError {
    /// Partial result, when the failure was a batch fetch failure.
    pub fn partial(&self) -> Option<&DependencyMap> {
        match self {
            WalkError::Batch { partial, .. } => Some(partial),
            WalkError::Other(_) => None,
        }
    }
}

/// Fetch the catalog and compute every stack's build dependencies.
///
/// A batch with any fetch failure is a failure even though the stacks that
/// were fetched still went through closure computation.
pub fn walk_dependencies(
    fetcher: &RepositoryFetcher,
    catalog: &Catalog,
    distro: &str,
    opts: &WalkOptions,
) -> Result<DependencyMap, WalkError> {
    let naming = DistroNaming::new(distro);
    let report = fetch_stacks(fetcher, catalog, &naming, &opts.fetch)?;

    let tables = DependencyTables::build(&naming, &report.manifests);
    let result = compute_closure(&tables, &naming, &opts.closure);

    match report.into_result() {
        Ok(_) => Ok(result),
        Err(error) => Err(WalkError::Batch {
            error,
            partial: result,
        }),
    }
}
