//! The build pipeline: fetch everything, then build tools, then packages.
//!
//! Fetching is the only concurrent stage. Builds run one at a time in schedule
//! order, and the first failure stops the run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::backend::{backend_for, BuildJob};
use crate::builder::context::BuildContext;
use crate::core::errors::PipelineError;
use crate::core::package::PackageDescriptor;
use crate::core::schedule::{Phase, Schedule};
use crate::ops::package::package;
use crate::sources::extract::{extract_archive, is_gzip_tarball};
use crate::sources::fetch::{Fetcher, Transport};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::{find_executable, Runner};

/// Lines of captured output kept in a build failure.
const ERROR_TAIL_LINES: usize = 20;

/// Lifecycle of one descriptor within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageState {
    Pending,
    Fetching,
    Verified,
    Building,
    Installed,
    Failed,
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageState::Pending => "pending",
            PackageState::Fetching => "fetching",
            PackageState::Verified => "verified",
            PackageState::Building => "building",
            PackageState::Installed => "installed",
            PackageState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a successful [`BuildOrchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The artifact already existed; nothing was fetched or built.
    UpToDate(PathBuf),
    /// Everything was built and packaged into the artifact.
    Built(PathBuf),
}

/// Drives a schedule from source archives to the packaged artifact.
pub struct BuildOrchestrator<'a> {
    ctx: BuildContext,
    runner: &'a dyn Runner,
    transport: &'a dyn Transport,
    source_dir: PathBuf,
    artifact: PathBuf,
    fetch_jobs: Option<usize>,
    progress: bool,
    history: Vec<(String, PackageState)>,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        ctx: BuildContext,
        runner: &'a dyn Runner,
        transport: &'a dyn Transport,
        source_dir: impl Into<PathBuf>,
        artifact: impl Into<PathBuf>,
    ) -> Self {
        BuildOrchestrator {
            ctx,
            runner,
            transport,
            source_dir: source_dir.into(),
            artifact: artifact.into(),
            fetch_jobs: None,
            progress: false,
            history: Vec::new(),
        }
    }

    /// Number of concurrent downloads.
    pub fn fetch_jobs(mut self, jobs: Option<usize>) -> Self {
        self.fetch_jobs = jobs;
        self
    }

    /// Show download progress on stderr.
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Every state transition so far, in the order it happened.
    pub fn history(&self) -> &[(String, PackageState)] {
        &self.history
    }

    /// Latest state of a package.
    pub fn state(&self, name: &str) -> Option<PackageState> {
        self.history
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, state)| *state)
    }

    fn transition(&mut self, package: &str, state: PackageState) {
        tracing::debug!("{}: {}", package, state);
        self.history.push((package.to_string(), state));
    }

    /// Create the source cache, build directory and both prefixes.
    pub fn prepare(&self) -> Result<()> {
        ensure_dir(&self.source_dir)?;
        ensure_dir(&self.ctx.build_dir)?;
        ensure_dir(&self.ctx.prefixes.builder)?;
        ensure_dir(&self.ctx.prefixes.dest)?;
        Ok(())
    }

    /// Run the whole schedule and package the result.
    ///
    /// Returns immediately if the artifact already exists.
    pub fn run(&mut self, schedule: &Schedule) -> Result<RunOutcome> {
        if self.artifact.exists() {
            tracing::info!("{} already exists, nothing to do", self.artifact.display());
            return Ok(RunOutcome::UpToDate(self.artifact.clone()));
        }

        for (_, pkg) in schedule.iter() {
            self.transition(pkg.name(), PackageState::Pending);
        }

        self.prepare()?;
        self.fetch(schedule)?;

        for (phase, pkg) in schedule.iter() {
            self.build(pkg, phase)?;
        }

        package(
            self.runner,
            &self.ctx.platform,
            &self.ctx.prefixes.dest,
            &self.artifact,
        )?;

        Ok(RunOutcome::Built(self.artifact.clone()))
    }

    /// Fetch and verify every archive in the schedule.
    pub fn fetch(&mut self, schedule: &Schedule) -> Result<()> {
        let packages = schedule.all();
        for pkg in &packages {
            self.transition(pkg.name(), PackageState::Fetching);
        }

        let result = Fetcher::new(self.transport, &self.source_dir)
            .jobs(self.fetch_jobs)
            .progress(self.progress)
            .fetch_all(&packages);

        let failed: Vec<String> = match &result {
            Ok(_) => Vec::new(),
            Err(e) => match e.downcast_ref::<PipelineError>() {
                Some(PipelineError::FetchAggregate { failed, .. }) => failed.clone(),
                // Nothing was attempted
                _ => packages.iter().map(|p| p.name().to_string()).collect(),
            },
        };

        for pkg in &packages {
            let state = if failed.iter().any(|f| f == pkg.name()) {
                PackageState::Failed
            } else {
                PackageState::Verified
            };
            self.transition(pkg.name(), state);
        }

        result.map(|_| ())
    }

    /// Extract, configure, compile and install one package into `phase`'s prefix.
    pub fn build(&mut self, pkg: &PackageDescriptor, phase: Phase) -> Result<()> {
        let span = tracing::info_span!("build", package = %pkg.name());
        let _enter = span.enter();

        self.transition(pkg.name(), PackageState::Building);

        match self.build_package(pkg, phase) {
            Ok(()) => {
                self.transition(pkg.name(), PackageState::Installed);
                Ok(())
            }
            Err(e) => {
                self.transition(pkg.name(), PackageState::Failed);
                Err(e)
            }
        }
    }

    fn build_package(&self, pkg: &PackageDescriptor, phase: Phase) -> Result<()> {
        let archive = self.source_dir.join(pkg.source_filename());
        if !archive.is_file() {
            return Err(PipelineError::MissingSource {
                package: pkg.name().to_string(),
                path: archive,
            }
            .into());
        }

        tracing::info!(
            "Building {} ({}) into {}",
            pkg.name(),
            pkg.build_system(),
            self.ctx.prefix(phase).display()
        );

        extract_archive(
            self.runner,
            pkg.name(),
            &archive,
            &self.ctx.package_dir(pkg),
        )?;

        let job = BuildJob::new(&self.ctx, pkg, phase);
        remove_dir_all_if_exists(&job.build_dir)?;
        ensure_dir(&job.build_dir)?;

        let backend = backend_for(pkg.build_system());
        for (step, cmd) in backend.steps(&job) {
            tracing::debug!("{} {}: `{}`", step, pkg.name(), cmd.display_command());

            let output = self
                .runner
                .run(&cmd)
                .with_context(|| format!("failed to run {} step of `{}`", step, pkg.name()))?;

            if !output.success() {
                return Err(PipelineError::BuildTool {
                    package: pkg.name().to_string(),
                    step,
                    command: cmd.display_command(),
                    code: output.code,
                    stderr: output.tail(ERROR_TAIL_LINES),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// External executables the schedule needs that `is_available` can't find.
///
/// Tools built in the tools phase are not required up front.
pub fn missing_tools(schedule: &Schedule, is_available: impl Fn(&str) -> bool) -> Vec<String> {
    let built: BTreeSet<&str> = schedule.tools().iter().map(|p| p.name()).collect();
    let mut needed = BTreeSet::new();

    for (_, pkg) in schedule.iter() {
        needed.extend(pkg.requires().iter().map(String::as_str));
        needed.extend(backend_for(pkg.build_system()).executables().iter().copied());
        if !is_gzip_tarball(Path::new(&pkg.source_filename())) {
            needed.insert("tar");
        }
    }

    needed
        .into_iter()
        .filter(|tool| !built.contains(tool) && !is_available(tool))
        .map(str::to_string)
        .collect()
}

/// Fail early if build tools are missing from `PATH`.
pub fn preflight(schedule: &Schedule) -> Result<()> {
    let tools = missing_tools(schedule, |tool| find_executable(tool).is_some());
    if tools.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingTools { tools }.into())
    }
}
