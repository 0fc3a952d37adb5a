//! Pipeline error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Build step that a backend failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Extract,
    Configure,
    Compile,
    Install,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStep::Extract => "extract",
            BuildStep::Configure => "configure",
            BuildStep::Compile => "compile",
            BuildStep::Install => "install",
        };
        f.write_str(s)
    }
}

/// Fatal errors raised by the fetch and build pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "sha256 hash of `{package}` source archive does not match\n  expected: {expected}\n  actual:   {actual}"
    )]
    Integrity {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("source archive for `{package}` does not exist: {}", .path.display())]
    MissingSource { package: String, path: PathBuf },

    #[error("{step} of `{package}` failed: `{command}` exited with {}\n{stderr}", exit_code_display(.code))]
    BuildTool {
        package: String,
        step: BuildStep,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// `first` is the earliest failure in submission order.
    #[error("failed to fetch {} package(s) ({}): {first:#}", .failed.len(), .failed.join(", "))]
    FetchAggregate {
        failed: Vec<String>,
        first: anyhow::Error,
    },

    #[error("package `{name}` is declared more than once")]
    DuplicatePackage { name: String },

    #[error("required build tools not found on PATH: {}", .tools.join(", "))]
    MissingTools { tools: Vec<String> },
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_message_reports_both_hashes() {
        let err = PipelineError::Integrity {
            package: "x264".into(),
            expected: "aaaa".into(),
            actual: "bbbb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("x264"));
        assert!(msg.contains("expected: aaaa"));
        assert!(msg.contains("actual:   bbbb"));
    }

    #[test]
    fn test_aggregate_lists_failed_packages() {
        let err = PipelineError::FetchAggregate {
            failed: vec!["b".into(), "c".into()],
            first: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.to_string(), "failed to fetch 2 package(s) (b, c): boom");
    }

    #[test]
    fn test_build_tool_message() {
        let err = PipelineError::BuildTool {
            package: "dav1d".into(),
            step: BuildStep::Compile,
            command: "ninja -C build".into(),
            code: Some(2),
            stderr: "oops".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("compile of `dav1d` failed"));
        assert!(msg.contains("exit code 2"));
    }
}
