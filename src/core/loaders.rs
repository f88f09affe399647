//! Loader for tab-delimited intensity profile files.
//!
//! The expected layout is:
//! - one title/metadata line (discarded)
//! - a header row naming the columns
//! - numeric data rows, first column = distance, remaining columns = channels
//!
//! Files are stored in a legacy single-byte encoding (ISO-8859-1 by default),
//! which matters for headers such as `Distance [µm]`.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use log::debug;
use thiserror::Error;

use crate::config::{ConfigError, LoaderConfig};

/// Cell contents treated as missing values.
const NA_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-nan", "-NaN", "null", "NULL", "#N/A", "None", "<NA>",
];

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File '{0}' not found.")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path} is not valid {encoding} text")]
    Encoding { path: PathBuf, encoding: &'static str },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Resolved parsing parameters for input tables.
#[derive(Debug, Clone, Copy)]
pub struct TableFormat {
    pub delimiter: u8,
    pub header_skip: usize,
    pub encoding: &'static Encoding,
}

impl TableFormat {
    /// Resolve a [`LoaderConfig`], rejecting unknown encodings and delimiters.
    pub fn from_config(config: &LoaderConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            delimiter: config.delimiter_byte()?,
            header_skip: config.header_skip,
            encoding: config.resolve_encoding()?,
        })
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            header_skip: 1,
            // WHATWG maps the iso-8859-1 label to windows-1252
            encoding: encoding_rs::WINDOWS_1252,
        }
    }
}

/// Column-oriented numeric table.
///
/// Column 0 is the shared x-axis; columns keep their order from the source
/// header. No cell is missing once a table has been loaded.
#[derive(Debug, Clone)]
pub struct Table {
    /// Column names, in file order.
    pub headers: Vec<String>,
    /// Values per column. All columns have the same length.
    pub columns: Vec<Vec<f64>>,
    /// Rows dropped because they contained missing values.
    pub dropped_rows: usize,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl Table {
    /// Build a table from headers and equally long columns.
    pub fn from_columns(headers: Vec<String>, columns: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(headers.len(), columns.len());
        Self {
            headers,
            columns,
            dropped_rows: 0,
            source_path: None,
        }
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn header(&self, index: usize) -> Option<&str> {
        self.headers.get(index).map(String::as_str)
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// The x-axis series (first column by position).
    pub fn x(&self) -> &[f64] {
        self.column(0).unwrap_or(&[])
    }
}

/// Load a delimited table, dropping rows with missing values.
///
/// # Arguments
///
/// * `path` - Path to the input file
/// * `format` - Delimiter, header skip and text encoding
///
/// # Errors
///
/// Returns an error if the file is missing, cannot be decoded, has no header
/// row, has rows wider than the header, or contains non-numeric cells.
pub fn load_table<P: AsRef<Path>>(path: P, format: &TableFormat) -> Result<Table> {
    let path = path.as_ref();

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoaderError::NotFound(path.to_path_buf()),
        _ => LoaderError::Io(e),
    })?;

    let text: Cow<'_, str> = format
        .encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .ok_or_else(|| LoaderError::Encoding {
            path: path.to_path_buf(),
            encoding: format.encoding.name(),
        })?;

    let body = skip_lines(&text, format.header_skip)
        .filter(|rest| !rest.trim().is_empty())
        .ok_or_else(|| LoaderError::EmptyFile(path.to_path_buf()))?;

    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); width];
    let mut dropped_rows = 0;
    let mut row_values: Vec<Option<f64>> = Vec::with_capacity(width);

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        // Row numbers as seen in the file: title + header + 1-based data row
        let line_no = format.header_skip + row_idx + 2;

        if record.len() > width {
            return Err(LoaderError::ParseError(format!(
                "{}: line {}: expected {} fields, saw {}",
                path.display(),
                line_no,
                width,
                record.len()
            )));
        }

        row_values.clear();
        for col in 0..width {
            let value = match record.get(col) {
                Some(cell) => parse_cell(cell).ok_or_else(|| {
                    LoaderError::ParseError(format!(
                        "{}: line {}, column '{}': '{}' is not a number",
                        path.display(),
                        line_no,
                        headers[col],
                        cell
                    ))
                })?,
                None => None,
            };
            row_values.push(value);
        }

        if row_values.iter().any(Option::is_none) {
            dropped_rows += 1;
            continue;
        }

        for (column, value) in columns.iter_mut().zip(row_values.iter().flatten()) {
            column.push(*value);
        }
    }

    debug!(
        "Loaded {}: {} columns, {} rows ({} dropped)",
        path.display(),
        width,
        columns.first().map_or(0, |c| c.len()),
        dropped_rows
    );

    Ok(Table {
        headers,
        columns,
        dropped_rows,
        source_path: Some(path.to_path_buf()),
    })
}

/// Return the text after the first `n` lines, or `None` if there are fewer.
fn skip_lines(text: &str, n: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..n {
        let idx = rest.find('\n')?;
        rest = &rest[idx + 1..];
    }
    Some(rest)
}

/// Parse one cell.
///
/// `Some(None)` is a missing value, `None` a cell that is not numeric.
fn parse_cell(cell: &str) -> Option<Option<f64>> {
    let trimmed = cell.trim();
    if trimmed.is_empty() || NA_MARKERS.contains(&trimmed) {
        return Some(None);
    }
    let value: f64 = trimmed.parse().ok()?;
    Some(value.is_finite().then_some(value))
}
