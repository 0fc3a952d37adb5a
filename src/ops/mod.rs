//! High-level operations.

pub mod orchestrate;
pub mod package;
pub mod select;

pub use orchestrate::{missing_tools, preflight, BuildOrchestrator, PackageState, RunOutcome};
pub use package::{artifact_path, package};
pub use select::select;
