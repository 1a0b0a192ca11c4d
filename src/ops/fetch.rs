//! Batch fetch of every released stack in a catalog.
//!
//! Each stack is fetched at `release/<name>/<full_version>`. When that fails
//! and the version carries a trailing `-<qualifier>` (a packaging increment),
//! the tag without the qualifier is tried once. Stacks that still fail are
//! recorded and the batch carries on; the batch as a whole fails at the end.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;

use crate::core::catalog::{Catalog, CatalogEntry};
use crate::core::manifest::Manifest;
use crate::core::naming::DistroNaming;
use crate::sources::{FetchError, RepositoryFetcher};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Options for [`fetch_stacks`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Fetches to run at once (1 = sequential)
    pub jobs: usize,

    /// Show a progress bar
    pub progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            jobs: 1,
            progress: false,
        }
    }
}

/// A stack that could not be fetched at either tag.
#[derive(Debug)]
pub struct FetchFailure {
    pub name: String,
    pub url: String,
    /// Last tag tried
    pub tag: String,
    pub error: FetchError,
}

/// One or more stacks could not be fetched.
#[derive(Debug, Error)]
#[error("could not fetch one or more stacks: {}", failed_names(.failures))]
pub struct BatchError {
    pub failures: Vec<FetchFailure>,
}

impl BatchError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(format!(
            "could not fetch {} stack(s)",
            self.failures.len()
        ));

        for failure in &self.failures {
            diag = diag.with_context(format!(
                "{} ({} at {}): {}",
                failure.name, failure.url, failure.tag, failure.error
            ));
        }

        let missing_tag = self
            .failures
            .iter()
            .any(|f| matches!(f.error, FetchError::CheckoutFailed { .. }));
        if missing_tag {
            diag = diag
                .with_suggestion(suggestions::MISSING_TAG)
                .with_suggestion(suggestions::FETCH_FAILED);
        }
        if self
            .failures
            .iter()
            .any(|f| matches!(f.error, FetchError::Workspace { .. }))
        {
            diag = diag.with_suggestion(suggestions::STALE_WORKSPACE);
        }

        diag
    }
}

fn failed_names(failures: &[FetchFailure]) -> String {
    failures
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything a batch fetch produced, failures included.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Catalog key → manifest; `None` marks a placeholder
    ///
    /// Unreleased stacks are placeholders too: other stacks may still
    /// depend on them.
    pub manifests: BTreeMap<String, Option<Manifest>>,

    /// Stacks without a release version (also present in `manifests`)
    pub skipped: Vec<String>,

    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn any failure into a [`BatchError`].
    pub fn into_result(self) -> Result<BTreeMap<String, Option<Manifest>>, BatchError> {
        if self.failures.is_empty() {
            Ok(self.manifests)
        } else {
            Err(BatchError {
                failures: self.failures,
            })
        }
    }
}

/// Tag a stack's release is published under.
pub fn release_tag(name: &str, full_version: &str) -> String {
    format!("release/{}/{}", name, full_version)
}

/// `tag` with the trailing `-<qualifier>` of its version removed.
///
/// Only the last path component is considered, so dashes in the stack name
/// never shorten the tag.
pub fn fallback_tag(tag: &str) -> Option<String> {
    // A dash only in the name would yield a tag that never exists.
    let version_start = tag.rfind('/').map(|i| i + 1).unwrap_or(0);
    let dash = tag[version_start..].rfind('-')?;
    Some(tag[..version_start + dash].to_string())
}

enum Outcome {
    Fetched(Manifest),
    Placeholder,
    Skipped,
    Failed(FetchFailure),
}

fn fetch_one(fetcher: &RepositoryFetcher, entry: &CatalogEntry, backports: bool) -> Outcome {
    let Some(version) = entry.version.as_deref() else {
        tracing::warn!(
            "Ignoring '{}' from '{}' since version is None",
            entry.name,
            entry.url
        );
        return Outcome::Skipped;
    };

    let tag = release_tag(&entry.name, version);
    tracing::info!("Get '{}' from '{}' from tag '{}'", entry.name, entry.url, tag);

    let primary = match fetcher.fetch(&entry.name, &entry.url, &tag) {
        Ok(manifest) => return Outcome::Fetched(manifest),
        Err(error) => error,
    };
    let manifest_missing = primary.is_manifest_missing();

    let (tag, error) = match fallback_tag(&tag) {
        Some(short) => {
            tracing::warn!("  trying tag '{}' ({})", short, primary);
            match fetcher.fetch(&entry.name, &entry.url, &short) {
                Ok(manifest) => return Outcome::Fetched(manifest),
                Err(error) => (short, error),
            }
        }
        None => (tag, primary),
    };

    if backports && (manifest_missing || error.is_manifest_missing()) {
        tracing::info!(
            "Processing backport {}, no manifest found in repo {}. Continuing",
            entry.name,
            entry.url
        );
        return Outcome::Placeholder;
    }

    tracing::error!(
        "Could not fetch '{}' from '{}' with version '{}': {}",
        entry.name,
        entry.url,
        tag,
        error
    );
    Outcome::Failed(FetchFailure {
        name: entry.name.clone(),
        url: entry.url.clone(),
        tag,
        error,
    })
}

fn progress_bar(total: usize, enabled: bool) -> ProgressBar {
    if !enabled || total < 2 {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Fetch every stack in `catalog`.
///
/// Per-stack failures never abort the batch; they end up in
/// [`FetchReport::failures`]. The report is ordered by catalog key whatever
/// `jobs` is.
pub fn fetch_stacks(
    fetcher: &RepositoryFetcher,
    catalog: &Catalog,
    naming: &DistroNaming,
    opts: &FetchOptions,
) -> Result<FetchReport> {
    let backports = naming.is_backports();
    let entries: Vec<&CatalogEntry> = catalog.entries().collect();
    let pb = progress_bar(entries.len(), opts.progress);

    let run = |entry: &&CatalogEntry| {
        pb.set_message(entry.name.clone());
        let outcome = fetch_one(fetcher, entry, backports);
        pb.inc(1);
        outcome
    };

    let outcomes: Vec<Outcome> = if opts.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.jobs)
            .build()
            .context("failed to start fetch workers")?;
        pool.install(|| entries.par_iter().map(run).collect())
    } else {
        entries.iter().map(run).collect()
    };
    pb.finish_and_clear();

    let mut report = FetchReport::default();
    for (entry, outcome) in entries.iter().zip(outcomes) {
        match outcome {
            Outcome::Fetched(manifest) => {
                report.manifests.insert(entry.name.clone(), Some(manifest));
            }
            Outcome::Placeholder => {
                report.manifests.insert(entry.name.clone(), None);
            }
            Outcome::Skipped => {
                report.manifests.insert(entry.name.clone(), None);
                report.skipped.push(entry.name.clone());
            }
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }

    tracing::info!(
        "Fetched {} stack(s), skipped {}, failed {}",
        report.manifests.values().filter(|m| m.is_some()).count(),
        report.skipped.len(),
        report.failures.len()
    );

    Ok(report)
}
