//! Hashing utilities for source archive checksums.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::{ensure, Context, Result};
use sha2::{Digest, Sha256};

/// Read buffer size used when hashing files.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of everything a reader yields, `chunk_size` bytes at a time.
pub fn sha256_reader(reader: &mut impl Read, chunk_size: usize) -> Result<String> {
    ensure!(chunk_size > 0, "hash chunk size must be non-zero");

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    sha256_file_chunked(path, DEFAULT_CHUNK_SIZE)
}

/// Compute SHA256 hash of a file using a specific read chunk size.
pub fn sha256_file_chunked(path: &Path, chunk_size: usize) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    sha256_reader(&mut file, chunk_size)
        .with_context(|| format!("failed to read file for hashing: {}", path.display()))
}
