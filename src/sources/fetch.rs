//! Concurrent source acquisition.
//!
//! Every descriptor gets its own task on a bounded rayon pool. A task reuses
//! an archive that is already on disk, otherwise downloads it, then checks the
//! archive exists and verifies its hash. Tasks never cancel each other: the
//! whole set is drained before any failure is reported.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::core::errors::PipelineError;
use crate::core::package::PackageDescriptor;
use crate::sources::verify::verify;
use crate::util::fs::ensure_dir;

/// Network fetch primitive.
pub trait Transport: Send + Sync {
    /// Write the full body found at `url` to `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// HTTP(S) transport backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("avforge/", env!("CARGO_PKG_VERSION")))
            // Source archives can be hundreds of megabytes
            .timeout(None)
            .build()
            .context("failed to create HTTP client")?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("Downloading {}", url);

        let parent = dest
            .parent()
            .with_context(|| format!("download target has no parent: {}", dest.display()))?;

        let mut response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to download {}", url))?;

        if !response.status().is_success() {
            bail!("failed to download {}: HTTP {}", url, response.status());
        }

        // Stream into a sibling temp file so an interrupted transfer never
        // leaves a file at `dest`.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;

        let bytes = response
            .copy_to(tmp.as_file_mut())
            .with_context(|| format!("failed to read response body from {}", url))?;

        tmp.persist(dest)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to write {}", dest.display()))?;

        tracing::debug!("Downloaded {} bytes to {}", bytes, dest.display());
        Ok(())
    }
}

/// How a source archive came to be on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Downloaded during this run.
    Fetched,
    /// Already present from an earlier run or placed manually.
    AlreadyPresent,
    /// The transport failed; the archive was found anyway on recheck.
    FetchFailed { error: String },
}

/// A source archive that exists and matched its declared hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    pub package: String,
    pub path: PathBuf,
    pub outcome: FetchOutcome,
}

/// Fetches and verifies source archives in parallel.
pub struct Fetcher<'a> {
    transport: &'a dyn Transport,
    source_dir: PathBuf,
    jobs: Option<usize>,
    progress: bool,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher that stores archives in `source_dir`.
    pub fn new(transport: &'a dyn Transport, source_dir: impl Into<PathBuf>) -> Self {
        Fetcher {
            transport,
            source_dir: source_dir.into(),
            jobs: None,
            progress: false,
        }
    }

    /// Limit the number of concurrent tasks (defaults to available parallelism).
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Show a progress bar on stderr.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Where the archive for `package` is stored.
    pub fn archive_path(&self, package: &PackageDescriptor) -> PathBuf {
        self.source_dir.join(package.source_filename())
    }

    /// Fetch and verify every descriptor.
    ///
    /// Waits for all tasks to finish. If any failed, each failing package is
    /// logged and a [`PipelineError::FetchAggregate`] carrying the earliest
    /// failure in submission order is returned.
    pub fn fetch_all(&self, packages: &[PackageDescriptor]) -> Result<Vec<FetchedSource>> {
        ensure_dir(&self.source_dir)?;

        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let jobs = self
            .jobs
            .unwrap_or_else(default_jobs)
            .clamp(1, packages.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("fetch-{}", i))
            .build()
            .context("failed to create fetch thread pool")?;

        tracing::info!("Fetching {} source archive(s) with {} job(s)", packages.len(), jobs);

        let pb = self.progress_bar(packages.len());

        let results: Vec<Result<FetchedSource>> = pool.install(|| {
            packages
                .par_iter()
                .map(|pkg| {
                    let result = self.fetch_one(pkg);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut fetched = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        let mut first = None;

        for (pkg, result) in packages.iter().zip(results) {
            match result {
                Ok(source) => fetched.push(source),
                Err(e) => {
                    tracing::error!("{} generated an error: {:#}", pkg.name(), e);
                    failed.push(pkg.name().to_string());
                    if first.is_none() {
                        first = Some(e);
                    }
                }
            }
        }

        match first {
            Some(first) => Err(PipelineError::FetchAggregate { failed, first }.into()),
            None => Ok(fetched),
        }
    }

    /// Fetch and verify a single descriptor.
    ///
    /// Creates the source directory if it does not exist yet.
    pub fn fetch_one(&self, package: &PackageDescriptor) -> Result<FetchedSource> {
        ensure_dir(&self.source_dir)?;
        let path = self.archive_path(package);

        let outcome = if path.exists() {
            tracing::debug!("{}: reusing {}", package.name(), path.display());
            FetchOutcome::AlreadyPresent
        } else {
            match self.transport.fetch(package.source_url(), &path) {
                Ok(()) => FetchOutcome::Fetched,
                Err(e) => {
                    // Deferred: a manually placed archive is still acceptable
                    tracing::warn!("{}: download failed: {:#}", package.name(), e);
                    FetchOutcome::FetchFailed {
                        error: format!("{:#}", e),
                    }
                }
            }
        };

        if !path.is_file() {
            let missing = anyhow::Error::from(PipelineError::MissingSource {
                package: package.name().to_string(),
                path: path.clone(),
            });
            return Err(match outcome {
                FetchOutcome::FetchFailed { error } => missing.context(format!(
                    "download of `{}` failed: {}",
                    package.name(),
                    error
                )),
                _ => missing,
            });
        }

        verify(&path, package.sha256())
            .with_context(|| format!("failed to verify `{}` source archive", package.name()))?
            .into_result(package.name())?;

        tracing::info!("{} tarball: hashes match", package.name());

        Ok(FetchedSource {
            package: package.name().to_string(),
            path,
            outcome,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} sources")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
