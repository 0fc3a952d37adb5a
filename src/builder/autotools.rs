//! Autotools adapter: `configure`, `make`, `make install`.

use crate::builder::backend::{BuildBackend, BuildJob};
use crate::core::package::BuildSystem;
use crate::util::process::ProcessBuilder;

/// Autotools-style `configure && make && make install`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutotoolsBackend;

impl BuildBackend for AutotoolsBackend {
    fn kind(&self) -> BuildSystem {
        BuildSystem::Autotools
    }

    fn executables(&self) -> &'static [&'static str] {
        &["sh", "make"]
    }

    fn configure(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        let cmd = job
            .command("sh")
            .arg(job.source_dir.join("configure"))
            .arg("--disable-static")
            .arg("--enable-shared")
            .arg(format!("--libdir={}/lib", job.prefix))
            .arg(format!("--prefix={}", job.prefix))
            .args(job.package.build_arguments())
            .cwd(&job.build_dir);

        Some(cmd)
    }

    fn compile(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("make").args(job.make_jobs()).cwd(&job.build_dir)
    }

    fn install(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("make").arg("install").cwd(&job.build_dir)
    }
}
