//! Core data types and I/O operations.

pub mod discovery;
pub mod loaders;
pub mod writers;

pub use discovery::find_files;
pub use loaders::{load_table, LoaderError, Table, TableFormat};
pub use writers::{ensure_output_dir, output_path, WriteError};
