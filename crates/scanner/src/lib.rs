//! Scan orchestration for metafinder.
//!
//! Ties the other crates together: walks directories, feeds the discovered
//! paths to the extraction backend in batches, normalizes the responses and
//! persists them. One [`Scanner`] run is a single sequential pipeline;
//! searches may run against the store concurrently while it progresses.

mod discover;
pub mod error;
mod scan;

pub use crate::scan::{DEFAULT_BATCH_SIZE, Progress, RunStats, Scanner};
