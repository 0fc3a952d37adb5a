//! avforge - builds FFmpeg and its codec libraries from pinned source archives.
//!
//! The pipeline fetches and verifies every source archive concurrently, then
//! builds build-time tools into a builder-local prefix and the shipped
//! libraries into the destination prefix, strictly one package at a time.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for avforge unit tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::catalog::{schedule_for, Profile};
pub use crate::core::errors::PipelineError;
pub use crate::core::package::{BuildSystem, Channel, PackageDescriptor, Visibility};
pub use crate::core::schedule::{Phase, Prefixes, Schedule};
pub use crate::ops::orchestrate::{BuildOrchestrator, PackageState, RunOutcome};
