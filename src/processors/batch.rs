//! Batch conversion of a directory tree of tables into chart images.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use thiserror::Error;

use crate::config::{AppConfig, ConfigError, PlotSpec};
use crate::core::discovery::find_files;
use crate::core::loaders::{load_table, TableFormat};
use crate::core::writers::{ensure_output_dir, output_path, WriteError};
use crate::visualization::{render_table, RenderError};

/// Errors that stop a batch as a whole.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] WriteError),
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Input files found, in walk order.
    pub discovered: Vec<PathBuf>,
    /// Images written.
    pub rendered: Vec<PathBuf>,
    /// Files that could not be loaded, with the reason.
    pub load_failures: Vec<(PathBuf, String)>,
    /// Files that loaded but could not be rendered, with the reason.
    pub render_failures: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// True if every loaded file was rendered.
    pub fn render_ok(&self) -> bool {
        self.render_failures.is_empty()
    }
}

/// Plot every matching file under `input_dir`.
///
/// Configuration is validated before any file is touched. Files are then
/// processed one at a time in discovery order: load failures are logged and
/// recorded and the file is skipped; rendering failures are recorded as well,
/// except configuration problems, which abort the batch.
///
/// # Arguments
///
/// * `input_dir` - Root of the directory tree to search
/// * `config` - Application configuration
/// * `show_progress` - Draw a progress bar on stderr
pub fn run_batch(input_dir: &Path, config: &AppConfig, show_progress: bool) -> Result<BatchReport, BatchError> {
    let spec = config.plot.validate()?;
    let format = TableFormat::from_config(&config.loader)?;
    ensure_output_dir(&spec.output_dir)?;

    let discovered = find_files(input_dir, &config.loader.extension);
    info!(
        "Found {} .{} file(s) in {}",
        discovered.len(),
        config.loader.extension,
        input_dir.display()
    );

    let pb = if show_progress {
        create_progress_bar(discovered.len() as u64)
    } else {
        ProgressBar::hidden()
    };

    let mut report = BatchReport {
        discovered,
        ..BatchReport::default()
    };

    for path in &report.discovered {
        pb.set_message(display_name(path));
        let outcome = process_file(path, &format, &spec);
        pb.inc(1);

        match outcome {
            Ok(output) => {
                info!("{} -> {}", path.display(), output.display());
                report.rendered.push(output);
            }
            Err(FileError::Load(reason)) => {
                pb.suspend(|| error!("Failed to load {}: {}", path.display(), reason));
                report.load_failures.push((path.clone(), reason));
            }
            Err(FileError::Render(RenderError::Config(e))) => {
                pb.finish_and_clear();
                return Err(BatchError::Config(e));
            }
            Err(FileError::Render(e)) => {
                pb.suspend(|| error!("Failed to plot {}: {}", path.display(), e));
                report.render_failures.push((path.clone(), e.to_string()));
            }
        }
    }

    pb.finish_and_clear();

    if report.discovered.is_empty() {
        warn!("No .{} files found in {}", config.loader.extension, input_dir.display());
    }

    Ok(report)
}

enum FileError {
    Load(String),
    Render(RenderError),
}

/// Load and render one file; the table is dropped before returning.
fn process_file(path: &Path, format: &TableFormat, spec: &PlotSpec) -> Result<PathBuf, FileError> {
    let table = load_table(path, format).map_err(|e| FileError::Load(e.to_string()))?;
    if table.dropped_rows > 0 {
        info!("{}: dropped {} row(s) with missing values", path.display(), table.dropped_rows);
    }

    let output = output_path(path, &spec.output_dir, &spec.extension);
    let summary = render_table(&table, spec, &output).map_err(FileError::Render)?;
    if !summary.skipped.is_empty() {
        info!(
            "{}: columns {:?} not present, skipped",
            path.display(),
            summary.skipped
        );
    }

    Ok(summary.output)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}
