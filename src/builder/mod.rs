//! Build backends.
//!
//! This module turns descriptors into the configure, compile and install
//! commands of their build systems, and assembles FFmpeg's configure flags.

pub mod args;
pub mod autotools;
pub mod backend;
pub mod cmake;
pub mod context;
pub mod make;
pub mod meson;

pub use backend::{backend_for, BuildBackend, BuildJob};
pub use context::BuildContext;
