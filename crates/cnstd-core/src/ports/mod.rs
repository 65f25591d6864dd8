//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod progress;

pub use progress::{NoopProgress, ProgressEvent, ProgressSink};
