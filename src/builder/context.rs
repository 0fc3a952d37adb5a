//! Build context - prefixes, working directories and backend environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::package::PackageDescriptor;
use crate::core::platform::{Os, PlatformFacts};
use crate::core::schedule::{Phase, Prefixes};
use crate::util::fs::msys_path;

/// Oldest macOS release the shipped libraries support.
pub const MACOSX_DEPLOYMENT_TARGET: &str = "10.13";

/// Everything a backend needs to know about where and how to build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Install prefixes
    pub prefixes: Prefixes,

    /// Root of extracted sources and out-of-tree build directories
    pub build_dir: PathBuf,

    /// Host platform
    pub platform: PlatformFacts,

    /// Job count for parallel compilation
    pub jobs: usize,

    /// `PATH` inherited from the caller
    base_path: Option<String>,
}

impl BuildContext {
    /// Create a context inheriting `PATH` from the current process.
    pub fn new(prefixes: Prefixes, build_dir: impl Into<PathBuf>, platform: PlatformFacts) -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        BuildContext {
            prefixes,
            build_dir: build_dir.into(),
            platform,
            jobs,
            base_path: std::env::var("PATH").ok(),
        }
    }

    /// Override the compile job count.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Override the inherited `PATH`.
    pub fn with_base_path(mut self, path: Option<String>) -> Self {
        self.base_path = path;
        self
    }

    pub fn os(&self) -> Os {
        self.platform.os
    }

    /// Install prefix for a phase.
    pub fn prefix(&self, phase: Phase) -> &Path {
        self.prefixes.for_phase(phase)
    }

    /// Install prefix formatted for the backend's command line.
    ///
    /// On Windows the builds run under MSYS, which wants `/c/...` paths.
    pub fn prefix_arg(&self, phase: Phase) -> String {
        self.path_arg(self.prefix(phase))
    }

    /// Format any path for a backend command line.
    pub fn path_arg(&self, path: &Path) -> String {
        if self.os() == Os::Windows {
            msys_path(path)
        } else {
            path.to_string_lossy().into_owned()
        }
    }

    /// Where `package` is extracted.
    pub fn package_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.build_dir.join(package.name())
    }

    /// Source root of `package`, honoring its nested source directory.
    pub fn source_dir(&self, package: &PackageDescriptor) -> PathBuf {
        let dir = self.package_dir(package);
        match package.source_dir() {
            Some(sub) => dir.join(sub),
            None => dir,
        }
    }

    /// Out-of-tree build directory of `package`.
    ///
    /// A sibling of the extracted tree, since some archives ship their own
    /// top-level `build/` directory.
    pub fn package_build_dir(&self, package: &PackageDescriptor) -> PathBuf {
        self.build_dir.join(format!("{}.build", package.name()))
    }

    /// Parallel job count for `package`, `None` when it must build serially.
    pub fn compile_jobs(&self, package: &PackageDescriptor) -> Option<usize> {
        package.build_parallel().then_some(self.jobs)
    }

    /// Environment for backend commands installing into `phase`'s prefix.
    ///
    /// Tools from the builder prefix always come first on `PATH`, and the
    /// target prefix's headers, libraries and pkg-config files are visible.
    pub fn environment(&self, phase: Phase) -> BTreeMap<String, String> {
        let prefix = self.prefix(phase);
        let sep = if self.os() == Os::Windows { ";" } else { ":" };

        let builder_bin = self.prefixes.builder.join("bin");
        let path = match self.base_path.as_deref() {
            Some(base) if !base.is_empty() => {
                format!("{}{}{}", builder_bin.to_string_lossy(), sep, base)
            }
            _ => builder_bin.to_string_lossy().into_owned(),
        };

        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), path);
        env.insert(
            "CPPFLAGS".to_string(),
            format!("-I{}", self.path_arg(&prefix.join("include"))),
        );
        env.insert(
            "LDFLAGS".to_string(),
            format!("-L{}", self.path_arg(&prefix.join("lib"))),
        );
        env.insert(
            "PKG_CONFIG_PATH".to_string(),
            self.path_arg(&prefix.join("lib").join("pkgconfig")),
        );

        if self.os() == Os::MacOs {
            env.insert(
                "MACOSX_DEPLOYMENT_TARGET".to_string(),
                MACOSX_DEPLOYMENT_TARGET.to_string(),
            );
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Libc;

    fn ctx(os: Os) -> BuildContext {
        BuildContext::new(
            Prefixes::for_destination(Path::new("/work/dest")),
            "/work/build",
            PlatformFacts::new(os, "x86_64", Libc::None),
        )
        .with_base_path(Some("/usr/bin".to_string()))
        .with_jobs(4)
    }

    #[test]
    fn test_environment_targets_phase_prefix() {
        let ctx = ctx(Os::Linux);

        let env = ctx.environment(Phase::Packages);
        assert_eq!(env["PATH"], "/work/dest.builder/bin:/usr/bin");
        assert_eq!(env["CPPFLAGS"], "-I/work/dest/include");
        assert_eq!(env["LDFLAGS"], "-L/work/dest/lib");
        assert_eq!(env["PKG_CONFIG_PATH"], "/work/dest/lib/pkgconfig");
        assert!(!env.contains_key("MACOSX_DEPLOYMENT_TARGET"));

        let env = ctx.environment(Phase::Tools);
        assert_eq!(env["CPPFLAGS"], "-I/work/dest.builder/include");
    }

    #[test]
    fn test_macos_sets_deployment_target() {
        let env = ctx(Os::MacOs).environment(Phase::Packages);
        assert_eq!(env["MACOSX_DEPLOYMENT_TARGET"], MACOSX_DEPLOYMENT_TARGET);
    }

    #[test]
    fn test_package_dirs() {
        let ctx = ctx(Os::Linux);
        let x265 = PackageDescriptor::builder("x265", "https://example.com/x265_4.1.tar.gz", "00")
            .source_dir("source")
            .parallel(false)
            .build();

        assert_eq!(ctx.package_dir(&x265), PathBuf::from("/work/build/x265"));
        assert_eq!(ctx.source_dir(&x265), PathBuf::from("/work/build/x265/source"));
        assert_eq!(
            ctx.package_build_dir(&x265),
            PathBuf::from("/work/build/x265.build")
        );
        assert_eq!(ctx.compile_jobs(&x265), None);
    }
}
