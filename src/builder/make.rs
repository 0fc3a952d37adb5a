//! Plain make adapter for packages without a configure step.

use crate::builder::backend::{BuildBackend, BuildJob};
use crate::core::package::BuildSystem;
use crate::util::process::ProcessBuilder;

/// `make PREFIX=...` run in the source tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeBackend;

impl BuildBackend for MakeBackend {
    fn kind(&self) -> BuildSystem {
        BuildSystem::Make
    }

    fn executables(&self) -> &'static [&'static str] {
        &["make"]
    }

    fn configure(&self, _job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        None
    }

    fn compile(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("make")
            .args(job.make_jobs())
            .arg(format!("PREFIX={}", job.prefix))
            .args(job.package.build_arguments())
            .cwd(&job.source_dir)
    }

    fn install(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("make")
            .arg("install")
            .arg(format!("PREFIX={}", job.prefix))
            .args(job.package.build_arguments())
            .cwd(&job.source_dir)
    }
}
