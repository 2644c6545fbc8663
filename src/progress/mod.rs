//! Progress reporting module
//!
//! Event reporting and the optional progress bar for copy runs.

mod reporter;

pub use reporter::*;
