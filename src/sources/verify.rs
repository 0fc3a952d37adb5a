//! Integrity verification of downloaded source archives.

use std::path::Path;

use anyhow::Result;

use crate::core::errors::PipelineError;
use crate::util::hash::{sha256_file_chunked, DEFAULT_CHUNK_SIZE};

/// Result of comparing a file's content hash against its declared hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch { expected: String, actual: String },
}

impl Verification {
    /// Turn a mismatch into an [`PipelineError::Integrity`] for `package`.
    pub fn into_result(self, package: &str) -> Result<(), PipelineError> {
        match self {
            Verification::Match => Ok(()),
            Verification::Mismatch { expected, actual } => Err(PipelineError::Integrity {
                package: package.to_string(),
                expected,
                actual,
            }),
        }
    }
}

/// Verify the SHA-256 of the file at `path`.
///
/// The file is streamed in fixed-size chunks, so memory use does not depend
/// on archive size. A file that cannot be opened or read in full is an error,
/// never a match.
pub fn verify(path: &Path, expected: &str) -> Result<Verification> {
    verify_with_chunk_size(path, expected, DEFAULT_CHUNK_SIZE)
}

/// [`verify`] with an explicit read chunk size.
pub fn verify_with_chunk_size(
    path: &Path,
    expected: &str,
    chunk_size: usize,
) -> Result<Verification> {
    let actual = sha256_file_chunked(path, chunk_size)?;

    if actual.eq_ignore_ascii_case(expected.trim()) {
        tracing::debug!("hash verified for {}", path.display());
        Ok(Verification::Match)
    } else {
        Ok(Verification::Mismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}
