//! CMake adapter for CMake-based packages.

use crate::builder::backend::{BuildBackend, BuildJob};
use crate::core::package::BuildSystem;
use crate::core::platform::Os;
use crate::util::process::ProcessBuilder;

/// CMake build adapter.
///
/// Generates Unix Makefiles into the package's out-of-tree build directory
/// and drives the build and install through `cmake --build` / `cmake --install`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CMakeBackend;

impl BuildBackend for CMakeBackend {
    fn kind(&self) -> BuildSystem {
        BuildSystem::CMake
    }

    fn executables(&self) -> &'static [&'static str] {
        &["cmake", "make"]
    }

    fn configure(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        let mut cmd = job
            .command("cmake")
            .args(["-G", "Unix Makefiles"])
            .arg("-S")
            .arg(&job.source_dir)
            .arg("-B")
            .arg(&job.build_dir)
            .arg("-DCMAKE_BUILD_TYPE=Release")
            .arg("-DBUILD_SHARED_LIBS=1")
            .arg("-DCMAKE_INSTALL_LIBDIR=lib")
            .arg(format!("-DCMAKE_INSTALL_PREFIX={}", job.prefix));

        // Shared libraries must carry their install location as install name
        if job.os == Os::MacOs {
            cmd = cmd.arg(format!("-DCMAKE_INSTALL_NAME_DIR={}/lib", job.prefix));
        }

        Some(cmd.args(job.package.build_arguments()))
    }

    fn compile(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        let jobs = job.jobs.unwrap_or(1);
        job.command("cmake")
            .arg("--build")
            .arg(&job.build_dir)
            .arg("--parallel")
            .arg(jobs.to_string())
    }

    fn install(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("cmake").arg("--install").arg(&job.build_dir)
    }
}
