//! File system module
//!
//! Source tree scanning, the flattened name transform, and the per-file
//! copy primitive.

mod flatten;
mod operations;
mod scanner;

pub use flatten::*;
pub use operations::*;
pub use scanner::*;
