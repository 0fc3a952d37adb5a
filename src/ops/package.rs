//! Final artifact packaging.
//!
//! Turns the destination prefix into `ffmpeg-<platform-tag>.tar.gz`: fixes up
//! the Windows layout, strips the shared libraries and archives the `bin`,
//! `include` and `lib` directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::core::platform::{Os, PlatformFacts};
use crate::util::fs::{ensure_dir, glob_files};
use crate::util::process::{find_executable, ProcessBuilder, Runner};

/// Top-level directories of the destination prefix that are shipped.
pub const SHIPPED_DIRS: &[&str] = &["bin", "include", "lib"];

/// FFmpeg libraries whose import libraries land in `bin/` on Windows.
const FFMPEG_LIBS: &[&str] = &[
    "avcodec",
    "avdevice",
    "avfilter",
    "avformat",
    "avutil",
    "postproc",
    "swresample",
    "swscale",
];

/// MinGW runtime DLLs the shipped libraries link against.
const MINGW_RUNTIME: &[&str] = &[
    "libgcc_s_seh-1.dll",
    "libiconv-2.dll",
    "libstdc++-6.dll",
    "libwinpthread-1.dll",
    "zlib1.dll",
];

/// Name of the output tarball for a platform.
pub fn artifact_name(platform: &PlatformFacts) -> String {
    format!("ffmpeg-{}.tar.gz", platform.tag())
}

/// Path of the output tarball inside `output_dir`.
pub fn artifact_path(output_dir: &Path, platform: &PlatformFacts) -> PathBuf {
    output_dir.join(artifact_name(platform))
}

/// Package the destination prefix into `artifact`.
pub fn package(
    runner: &dyn Runner,
    platform: &PlatformFacts,
    dest: &Path,
    artifact: &Path,
) -> Result<()> {
    if platform.os == Os::Windows {
        move_import_libs(dest)?;
        copy_mingw_runtime(dest, find_executable("gcc").as_deref())?;
    }

    strip_libraries(runner, platform, dest)?;
    write_tarball(dest, artifact)?;

    tracing::info!("Wrote {}", artifact.display());
    Ok(())
}

/// Move `bin/<lib>.lib` import libraries into `lib/`.
pub fn move_import_libs(dest: &Path) -> Result<()> {
    let lib_dir = dest.join("lib");

    for name in FFMPEG_LIBS {
        let file = format!("{}.lib", name);
        let from = dest.join("bin").join(&file);
        if !from.exists() {
            continue;
        }

        ensure_dir(&lib_dir)?;
        let to = lib_dir.join(&file);
        fs::rename(&from, &to).with_context(|| {
            format!("failed to move {} to {}", from.display(), to.display())
        })?;
    }

    Ok(())
}

/// Copy the MinGW runtime DLLs from the directory holding `gcc` into `bin/`.
pub fn copy_mingw_runtime(dest: &Path, gcc: Option<&Path>) -> Result<()> {
    let gcc = gcc.context("gcc not found on PATH, cannot bundle the MinGW runtime")?;
    let mingw_bin = gcc
        .parent()
        .with_context(|| format!("gcc path has no parent: {}", gcc.display()))?;

    let bin = dest.join("bin");
    ensure_dir(&bin)?;

    for name in MINGW_RUNTIME {
        let from = mingw_bin.join(name);
        fs::copy(&from, bin.join(name))
            .with_context(|| format!("failed to copy {}", from.display()))?;
    }

    Ok(())
}

/// Shared libraries in `dest` that should be stripped.
pub fn shared_libraries(os: Os, dest: &Path) -> Result<Vec<PathBuf>> {
    let pattern = match os {
        Os::MacOs => "lib/*.dylib",
        Os::Windows => "bin/*.dll",
        Os::Linux | Os::Other => "lib/*.so",
    };
    glob_files(dest, &[pattern])
}

/// Strip debug symbols from the shipped libraries.
pub fn strip_libraries(runner: &dyn Runner, platform: &PlatformFacts, dest: &Path) -> Result<()> {
    let libraries = shared_libraries(platform.os, dest)?;
    if libraries.is_empty() {
        tracing::debug!("No shared libraries to strip in {}", dest.display());
        return Ok(());
    }

    // Apple's strip has no -s that keeps the dynamic symbol table
    let flag = if platform.os == Os::MacOs { "-S" } else { "-s" };
    let cmd = ProcessBuilder::new("strip").arg(flag).args(&libraries);

    let output = runner.run(&cmd)?;
    if !output.success() {
        bail!(
            "`{}` failed with exit code {:?}\n{}",
            cmd.display_command(),
            output.code,
            output.tail(20)
        );
    }

    Ok(())
}

/// Write a gzip tarball of the shipped directories that exist in `dest`.
///
/// The tarball is assembled in a temporary file next to `artifact` and moved
/// into place once complete.
pub fn write_tarball(dest: &Path, artifact: &Path) -> Result<()> {
    let parent = artifact
        .parent()
        .with_context(|| format!("artifact path has no parent: {}", artifact.display()))?;
    ensure_dir(parent)?;

    let tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;

    let mut builder = tar::Builder::new(GzEncoder::new(
        tmp.as_file().try_clone()?,
        Compression::default(),
    ));
    // Keep library symlinks as symlinks
    builder.follow_symlinks(false);

    for dir in SHIPPED_DIRS {
        let path = dest.join(dir);
        if path.is_dir() {
            builder
                .append_dir_all(dir, &path)
                .with_context(|| format!("failed to archive {}", path.display()))?;
        }
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .context("failed to finish tarball")?
        .sync_all()
        .context("failed to flush tarball")?;

    tmp.persist(artifact)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write {}", artifact.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::Libc;
    use crate::test_support::{tarball_entries, RecordingRunner};
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_artifact_name() {
        let linux = PlatformFacts::new(Os::Linux, "x86_64", Libc::Glibc);
        assert_eq!(artifact_name(&linux), "ffmpeg-manylinux_x86_64.tar.gz");
        assert_eq!(
            artifact_path(Path::new("/out"), &linux),
            PathBuf::from("/out/ffmpeg-manylinux_x86_64.tar.gz")
        );
    }

    #[test]
    fn test_package_strips_and_archives() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        write(&dest.join("lib/libavcodec.so"), "elf");
        write(&dest.join("lib/pkgconfig/libavcodec.pc"), "pc");
        write(&dest.join("include/libavcodec/avcodec.h"), "h");
        write(&dest.join("share/doc/readme"), "not shipped");

        let runner = RecordingRunner::new();
        let platform = PlatformFacts::new(Os::Linux, "x86_64", Libc::Glibc);
        let artifact = tmp.path().join("output").join(artifact_name(&platform));

        package(&runner, &platform, &dest, &artifact).unwrap();

        assert_eq!(
            runner.commands(),
            vec![format!("strip -s {}", dest.join("lib/libavcodec.so").display())]
        );

        let entries = tarball_entries(&artifact);
        assert!(entries.iter().any(|e| e == "lib/libavcodec.so"));
        assert!(entries.iter().any(|e| e == "include/libavcodec/avcodec.h"));
        assert!(!entries.iter().any(|e| e.starts_with("share")));
        assert!(!entries.iter().any(|e| e.starts_with("bin")));
    }

    #[test]
    fn test_macos_strips_with_capital_s() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("lib/libavutil.59.dylib"), "macho");

        let runner = RecordingRunner::new();
        let platform = PlatformFacts::new(Os::MacOs, "arm64", Libc::None);
        strip_libraries(&runner, &platform, tmp.path()).unwrap();

        assert!(runner.commands()[0].starts_with("strip -S "));
    }

    #[test]
    fn test_strip_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("lib/libx264.so"), "elf");

        let runner = RecordingRunner::new().fail_on("strip");
        let platform = PlatformFacts::new(Os::Linux, "x86_64", Libc::Musl);
        let err = strip_libraries(&runner, &platform, tmp.path()).unwrap_err();
        assert!(err.to_string().contains("mock failure"));
    }

    #[test]
    fn test_move_import_libs() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("bin/avcodec.lib"), "lib");
        write(&tmp.path().join("bin/avcodec-61.dll"), "dll");

        move_import_libs(tmp.path()).unwrap();

        assert!(tmp.path().join("lib/avcodec.lib").is_file());
        assert!(!tmp.path().join("bin/avcodec.lib").exists());
        assert!(tmp.path().join("bin/avcodec-61.dll").is_file());
    }

    #[test]
    fn test_mingw_runtime_requires_gcc() {
        let tmp = TempDir::new().unwrap();
        let err = copy_mingw_runtime(tmp.path(), None).unwrap_err();
        assert!(err.to_string().contains("gcc not found"));
        assert!(!tmp.path().join("bin").exists());
    }

    #[test]
    fn test_mingw_runtime_copied_next_to_gcc() {
        let tmp = TempDir::new().unwrap();
        let mingw = tmp.path().join("mingw64").join("bin");
        for name in MINGW_RUNTIME {
            write(&mingw.join(name), "dll");
        }
        let dest = tmp.path().join("dest");

        copy_mingw_runtime(&dest, Some(mingw.join("gcc.exe").as_path())).unwrap();

        for name in MINGW_RUNTIME {
            assert!(dest.join("bin").join(name).is_file());
        }
    }

    #[test]
    fn test_missing_runtime_dll_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mingw = tmp.path().join("mingw64").join("bin");
        write(&mingw.join("zlib1.dll"), "dll");

        let gcc = mingw.join("gcc.exe");
        let err = copy_mingw_runtime(&tmp.path().join("dest"), Some(gcc.as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to copy"));
    }
}
