//! Source archive extraction.
//!
//! Archives are unpacked with their top-level directory stripped, so
//! `ffmpeg-7.1.1/configure` lands at `<dest>/configure`. Gzip tarballs are
//! unpacked in-process; other formats (`.tar.bz2`, `.tar.xz`) go through the
//! host `tar`.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;

use crate::core::errors::{BuildStep, PipelineError};
use crate::util::fs::{ensure_dir, remove_dir_all_if_exists};
use crate::util::process::{ProcessBuilder, Runner};

/// Whether the archive can be unpacked without the host `tar`.
pub fn is_gzip_tarball(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}

/// Unpack `archive` into a fresh `dest`, stripping the top-level directory.
///
/// Any previous content of `dest` is removed first so stale files from an
/// earlier, interrupted build cannot leak into this one.
pub fn extract_archive(
    runner: &dyn Runner,
    package: &str,
    archive: &Path,
    dest: &Path,
) -> Result<()> {
    remove_dir_all_if_exists(dest)?;
    ensure_dir(dest)?;

    tracing::debug!("Extracting {} to {}", archive.display(), dest.display());

    if is_gzip_tarball(archive) {
        return extract_gzip_tarball(archive, dest)
            .with_context(|| format!("failed to extract {}", archive.display()));
    }

    let cmd = ProcessBuilder::new("tar")
        .arg("xf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .args(["--strip-components", "1"]);

    let output = runner.run(&cmd)?;
    if !output.success() {
        return Err(PipelineError::BuildTool {
            package: package.to_string(),
            step: BuildStep::Extract,
            command: cmd.display_command(),
            code: output.code,
            stderr: output.tail(20),
        }
        .into());
    }

    Ok(())
}

/// Unpack a `.tar.gz` with its first path component stripped.
pub fn extract_gzip_tarball(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open archive: {}", archive.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive
        .entries()
        .context("failed to read tarball entries")?
    {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        let Some(relative) = strip_first_component(&entry_path)? else {
            // The top-level directory itself
            continue;
        };
        let output_path = dest.join(&relative);

        if let Some(parent) = output_path.parent() {
            ensure_dir(parent)?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                ensure_dir(&output_path)?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::Symlink => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract: {}", output_path.display())
                })?;
            }
            tar::EntryType::Link => {
                // Hard link targets are archive paths, stripped the same way
                let target = entry
                    .link_name()
                    .context("failed to read hard link target")?
                    .map(|t| t.into_owned());
                if let Some(target) = target {
                    if let Some(target) = strip_first_component(&target)? {
                        std::fs::copy(dest.join(&target), &output_path).with_context(|| {
                            format!("failed to extract hard link: {}", output_path.display())
                        })?;
                    }
                }
            }
            _ => {
                // pax headers, fifos, devices
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    Ok(())
}

/// Drop the first component of an archive path.
///
/// Returns `None` for the top-level entry itself and rejects paths that would
/// escape the destination.
fn strip_first_component(path: &Path) -> Result<Option<PathBuf>> {
    let mut stripped = PathBuf::new();
    for component in path.components().skip(1) {
        match component {
            Component::Normal(part) => stripped.push(part),
            Component::CurDir => {}
            _ => bail!("tarball entry escapes destination directory: {}", path.display()),
        }
    }

    if stripped.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(stripped))
    }
}
