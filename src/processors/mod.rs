//! Data processing modules.

pub mod batch;

pub use batch::{run_batch, BatchError, BatchReport};
