//! Test utilities and mocks for avforge unit tests.
//!
//! Provides stand-ins for the pipeline's external collaborators: a network
//! transport that serves canned bodies and a process runner that records
//! commands instead of executing them.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::sources::fetch::Transport;
use crate::util::process::{CommandOutput, ProcessBuilder, Runner};

/// Canned response for a URL.
#[derive(Debug, Clone)]
struct MockBody {
    body: Vec<u8>,
    /// Report failure even though the body was written.
    fail_after_write: bool,
}

/// Mock network transport.
///
/// URLs without a registered body fail, leaving nothing on disk.
#[derive(Debug, Default)]
pub struct MockTransport {
    bodies: HashMap<String, MockBody>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create a transport that fails every request.
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(
            url.to_string(),
            MockBody {
                body: body.to_vec(),
                fail_after_write: false,
            },
        );
        self
    }

    /// Write `body` for `url`, then report a transport error anyway.
    pub fn with_body_then_fail(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(
            url.to_string(),
            MockBody {
                body: body.to_vec(),
                fail_after_write: true,
            },
        );
        self
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requested URLs, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let Some(mock) = self.bodies.get(url) else {
            bail!("no mock response for URL: {}", url);
        };

        std::fs::write(dest, &mock.body)?;

        if mock.fail_after_write {
            bail!("connection reset after body for {}", url);
        }
        Ok(())
    }
}

/// Mock process runner that records every command.
///
/// Commands succeed unless their display string contains a registered
/// failure pattern.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    failures: Vec<String>,
    calls: Mutex<Vec<ProcessBuilder>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Make commands containing `pattern` exit with status 1.
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.failures.push(pattern.to_string());
        self
    }

    /// Display strings of all commands run so far.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(ProcessBuilder::display_command)
            .collect()
    }

    /// Full invocations, including environment and working directory.
    pub fn invocations(&self) -> Vec<ProcessBuilder> {
        self.calls.lock().unwrap().clone()
    }
}

impl Runner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput> {
        let display = cmd.display_command();
        self.calls.lock().unwrap().push(cmd.clone());

        if self.failures.iter().any(|p| display.contains(p.as_str())) {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: Vec::new(),
                stderr: format!("mock failure: {}", display).into_bytes(),
            });
        }

        Ok(CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        })
    }
}

/// Write a gzip tarball containing `files` (path, content) to `path`.
pub fn gzip_tarball(path: &Path, files: &[(&str, &[u8])]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;

    let file = std::fs::File::create(path).expect("failed to create tarball");
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("failed to append tarball entry");
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .expect("failed to finish tarball");
}

/// Entry paths of a gzip tarball, in archive order.
pub fn tarball_entries(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).expect("failed to open tarball");
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));

    archive
        .entries()
        .expect("failed to read tarball entries")
        .map(|entry| {
            let entry = entry.expect("failed to read tarball entry");
            entry.path().unwrap().to_string_lossy().into_owned()
        })
        .collect()
}
