//! Build backend adapters.
//!
//! A backend turns a package into the command sequence its build system
//! needs: an optional configure/generate step, a compile step and an install
//! step. Backends only describe commands; running them is the orchestrator's
//! job.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::builder::autotools::AutotoolsBackend;
use crate::builder::cmake::CMakeBackend;
use crate::builder::context::BuildContext;
use crate::builder::make::MakeBackend;
use crate::builder::meson::MesonBackend;
use crate::core::errors::BuildStep;
use crate::core::package::{BuildSystem, PackageDescriptor};
use crate::core::platform::Os;
use crate::core::schedule::Phase;
use crate::util::process::ProcessBuilder;

/// A package ready to be handed to a backend.
#[derive(Debug, Clone)]
pub struct BuildJob<'a> {
    pub package: &'a PackageDescriptor,
    /// Extracted source root (after the nested source directory)
    pub source_dir: PathBuf,
    /// Out-of-tree build directory
    pub build_dir: PathBuf,
    /// Install prefix, formatted for the command line
    pub prefix: String,
    /// Environment for every command
    pub env: BTreeMap<String, String>,
    /// Parallel compile jobs, `None` for a serial build
    pub jobs: Option<usize>,
    pub os: Os,
}

impl<'a> BuildJob<'a> {
    /// Describe `package` installing into `phase`'s prefix.
    pub fn new(ctx: &BuildContext, package: &'a PackageDescriptor, phase: Phase) -> Self {
        BuildJob {
            package,
            source_dir: ctx.source_dir(package),
            build_dir: ctx.package_build_dir(package),
            prefix: ctx.prefix_arg(phase),
            env: ctx.environment(phase),
            jobs: ctx.compile_jobs(package),
            os: ctx.os(),
        }
    }

    /// Start a command with this job's environment.
    pub fn command(&self, program: &str) -> ProcessBuilder {
        ProcessBuilder::new(program).envs(&self.env)
    }

    /// `-jN` for make-style tools; nothing for serial builds.
    pub fn make_jobs(&self) -> Vec<String> {
        match self.jobs {
            Some(n) => vec![format!("-j{}", n)],
            None => Vec::new(),
        }
    }
}

/// A build-system adapter.
pub trait BuildBackend: Send + Sync {
    /// The build system this backend drives.
    fn kind(&self) -> BuildSystem;

    /// Executables this backend needs on `PATH`.
    fn executables(&self) -> &'static [&'static str];

    /// Configure or generate step, if the build system has one.
    fn configure(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder>;

    /// Compile step.
    fn compile(&self, job: &BuildJob<'_>) -> ProcessBuilder;

    /// Install step.
    fn install(&self, job: &BuildJob<'_>) -> ProcessBuilder;

    /// All steps, in execution order.
    fn steps(&self, job: &BuildJob<'_>) -> Vec<(BuildStep, ProcessBuilder)> {
        let mut steps = Vec::with_capacity(3);
        if let Some(cmd) = self.configure(job) {
            steps.push((BuildStep::Configure, cmd));
        }
        steps.push((BuildStep::Compile, self.compile(job)));
        steps.push((BuildStep::Install, self.install(job)));
        steps
    }
}

/// The backend for a build system.
pub fn backend_for(kind: BuildSystem) -> &'static dyn BuildBackend {
    match kind {
        BuildSystem::Autotools => &AutotoolsBackend,
        BuildSystem::CMake => &CMakeBackend,
        BuildSystem::Meson => &MesonBackend,
        BuildSystem::Make => &MakeBackend,
    }
}
