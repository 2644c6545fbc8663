//! Core copy engine module
//!
//! Planning and orchestration of a flatten run, plus the bounded task
//! scheduler that performs the copies.

mod copier;
mod scheduler;

pub use copier::*;
pub use scheduler::*;
