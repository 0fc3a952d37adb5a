//! Core data structures for avforge.
//!
//! - Package descriptors and the two-phase schedule
//! - Host platform facts
//! - The package catalog for each build profile
//! - Pipeline errors

pub mod catalog;
pub mod errors;
pub mod package;
pub mod platform;
pub mod schedule;

pub use catalog::Profile;
pub use errors::PipelineError;
pub use package::{BuildSystem, Channel, PackageDescriptor, Visibility};
pub use platform::{HardwareFacts, Os, PlatformFacts};
pub use schedule::{Phase, Prefixes, Schedule};
