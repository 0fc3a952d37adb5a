//! Meson adapter: `meson setup`, then ninja.

use crate::builder::backend::{BuildBackend, BuildJob};
use crate::core::package::BuildSystem;
use crate::util::process::ProcessBuilder;

/// Meson build adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MesonBackend;

impl BuildBackend for MesonBackend {
    fn kind(&self) -> BuildSystem {
        BuildSystem::Meson
    }

    fn executables(&self) -> &'static [&'static str] {
        &["meson", "ninja"]
    }

    fn configure(&self, job: &BuildJob<'_>) -> Option<ProcessBuilder> {
        let cmd = job
            .command("meson")
            .arg("setup")
            .args(["--buildtype", "release"])
            .args(["--libdir", "lib"])
            .arg("--prefix")
            .arg(&job.prefix)
            .args(job.package.build_arguments())
            .arg(&job.build_dir)
            .arg(&job.source_dir);

        Some(cmd)
    }

    fn compile(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        // ninja is parallel by default, so serial builds must say so
        let jobs = job.jobs.unwrap_or(1);
        job.command("ninja")
            .arg("-C")
            .arg(&job.build_dir)
            .arg(format!("-j{}", jobs))
    }

    fn install(&self, job: &BuildJob<'_>) -> ProcessBuilder {
        job.command("ninja")
            .arg("-C")
            .arg(&job.build_dir)
            .arg("install")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::context::BuildContext;
    use crate::core::package::PackageDescriptor;
    use crate::core::platform::{Libc, Os, PlatformFacts};
    use crate::core::schedule::{Phase, Prefixes};
    use std::path::Path;

    #[test]
    fn test_meson_steps() {
        let ctx = BuildContext::new(
            Prefixes::for_destination(Path::new("/d")),
            "/b",
            PlatformFacts::new(Os::Linux, "x86_64", Libc::Glibc),
        )
        .with_jobs(4);
        let dav1d = PackageDescriptor::builder("dav1d", "https://example.com/dav1d-1.5.1.tar.bz2", "00")
            .build_system(BuildSystem::Meson)
            .args(["-Denable_tools=false"])
            .build();

        let job = BuildJob::new(&ctx, &dav1d, Phase::Packages);
        assert_eq!(
            MesonBackend.configure(&job).unwrap().display_command(),
            "meson setup --buildtype release --libdir lib --prefix /d \
             -Denable_tools=false /b/dav1d.build /b/dav1d"
        );
        assert_eq!(
            MesonBackend.compile(&job).display_command(),
            "ninja -C /b/dav1d.build -j4"
        );
        assert_eq!(
            MesonBackend.install(&job).display_command(),
            "ninja -C /b/dav1d.build install"
        );
    }

    #[test]
    fn test_serial_ninja_build() {
        let ctx = BuildContext::new(
            Prefixes::for_destination(Path::new("/d")),
            "/b",
            PlatformFacts::new(Os::Windows, "x86_64", Libc::None),
        );
        let dav1d = PackageDescriptor::builder("dav1d", "https://example.com/dav1d-1.5.1.tar.bz2", "00")
            .build_system(BuildSystem::Meson)
            .parallel(false)
            .build();

        let job = BuildJob::new(&ctx, &dav1d, Phase::Packages);
        assert!(MesonBackend.compile(&job).display_command().ends_with("-j1"));
    }
}
