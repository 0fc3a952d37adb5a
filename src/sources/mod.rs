//! Source archives.
//!
//! Archives are downloaded into the source cache, verified against their
//! pinned sha256 and extracted into the build tree.

pub mod extract;
pub mod fetch;
pub mod verify;

pub use fetch::{FetchOutcome, FetchedSource, Fetcher, HttpTransport, Transport};
