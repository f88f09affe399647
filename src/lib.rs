//! Batch plotting of immunofluorescence intensity profiles.
//!
//! This crate provides tools for:
//! - Discovering tab-delimited profile files in a directory tree
//! - Loading them into numeric tables (rows with missing values dropped)
//! - Rendering one line chart per file to SVG or a raster image
//!
//! # Example
//!
//! ```no_run
//! use colocgraph::{core::loaders::{load_table, TableFormat}, visualization::render_table, PlotConfig};
//! use std::path::Path;
//!
//! let spec = PlotConfig::default().validate().unwrap();
//! let table = load_table("profile.txt", &TableFormat::default()).unwrap();
//! render_table(&table, &spec, Path::new("profile.svg")).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use crate::config::{AppConfig, ConfigError, LoaderConfig, PlotConfig, PlotSpec};
pub use crate::core::loaders::{Table, TableFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
