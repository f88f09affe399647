//! Configuration types for the plotting pipeline.
//!
//! [`AppConfig`] is what users write (YAML file plus CLI overrides). Before a
//! batch starts it is validated into a [`PlotSpec`], which is immutable for the
//! rest of the run and shared by every file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted image side, in pixels.
const MAX_SIDE_PX: f64 = 20_000.0;

/// Typographic points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Series line width in points.
const LINE_WIDTH_PT: f64 = 1.5;

/// Errors raised by configuration loading and validation.
///
/// These affect every file of a batch identically, so callers stop the batch
/// instead of reporting them per file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported image format '{0}' (expected one of: svg, png, jpg, jpeg, bmp)")]
    UnsupportedFormat(String),

    #[error("unknown color '{0}' (use a basic color name or #rrggbb)")]
    UnknownColor(String),

    #[error("column {index} requested but only {available} color(s) configured")]
    ColorListTooShort { index: usize, available: usize },

    #[error("invalid column order '{order}': {reason}")]
    InvalidColumnOrder { order: String, reason: String },

    #[error("invalid {name}: {value}")]
    InvalidDimension { name: &'static str, value: f64 },

    #[error("invalid font size: {0} (expected 1..=200)")]
    InvalidFontSize(u32),

    #[error("invalid delimiter {0:?} (expected a single ASCII character)")]
    InvalidDelimiter(char),

    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Image encodings the rendering backends can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
    Jpeg,
    Bmp,
}

impl FromStr for ImageFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(ImageFormat::Svg),
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if let Some(hex) = name.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ConfigError::UnknownColor(s.to_string()));
        }
        named_color(&name.to_ascii_lowercase()).ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "red" | "r" => Rgb(255, 0, 0),
        "green" | "g" => Rgb(0, 128, 0),
        "blue" | "b" => Rgb(0, 0, 255),
        "black" | "k" => Rgb(0, 0, 0),
        "white" | "w" => Rgb(255, 255, 255),
        "cyan" => Rgb(0, 255, 255),
        "c" => Rgb(0, 191, 191),
        "magenta" => Rgb(255, 0, 255),
        "m" => Rgb(191, 0, 191),
        "yellow" => Rgb(255, 255, 0),
        "y" => Rgb(191, 191, 0),
        "orange" => Rgb(255, 165, 0),
        "purple" => Rgb(128, 0, 128),
        "brown" => Rgb(165, 42, 42),
        "pink" => Rgb(255, 192, 203),
        "gray" | "grey" => Rgb(128, 128, 128),
        "olive" => Rgb(128, 128, 0),
        "navy" => Rgb(0, 0, 128),
        "teal" => Rgb(0, 128, 128),
        "lime" => Rgb(0, 255, 0),
        "maroon" => Rgb(128, 0, 0),
        _ => return None,
    };
    Some(rgb)
}

/// Ordered, 1-based column selection parsed from a digit string such as `"312"`.
///
/// Each digit selects one column; digits may repeat. Only single digits are
/// accepted, so at most nine columns are selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder(Vec<usize>);

impl ColumnOrder {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

impl FromStr for ColumnOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidColumnOrder {
            order: s.to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("no columns selected"));
        }

        s.chars()
            .map(|c| match c.to_digit(10) {
                Some(0) => Err(invalid("column indices are 1-based, 0 is not allowed")),
                Some(d) => Ok(d as usize),
                None => Err(invalid("only digits 1-9 are allowed")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ColumnOrder)
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for idx in &self.0 {
            write!(f, "{}", idx)?;
        }
        Ok(())
    }
}

/// User-facing plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Output image format, also used as the file extension
    #[serde(default = "default_image_format")]
    pub image_format: String,

    /// Figure width in inches
    #[serde(default = "default_width")]
    pub width: f64,

    /// Figure height in inches
    #[serde(default = "default_height")]
    pub height: f64,

    /// Pixels per inch
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Series colors, indexed by column index - 1
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    /// Column selection and draw order, e.g. "312"
    #[serde(default = "default_column_order")]
    pub column_order: String,

    #[serde(default)]
    pub legend: bool,

    #[serde(default)]
    pub x_label: Option<String>,

    #[serde(default)]
    pub y_label: Option<String>,

    /// Directory for output images (current directory when unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_image_format() -> String {
    "svg".to_string()
}

fn default_width() -> f64 {
    4.0
}

fn default_height() -> f64 {
    2.0
}

fn default_dpi() -> u32 {
    100
}

fn default_font_size() -> u32 {
    9
}

fn default_colors() -> Vec<String> {
    vec!["red".to_string(), "green".to_string(), "blue".to_string()]
}

fn default_column_order() -> String {
    "312".to_string()
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            image_format: default_image_format(),
            width: default_width(),
            height: default_height(),
            dpi: default_dpi(),
            font_size: default_font_size(),
            colors: default_colors(),
            column_order: default_column_order(),
            legend: false,
            x_label: None,
            y_label: None,
            output_dir: None,
        }
    }
}

impl PlotConfig {
    /// Check every setting and build the immutable [`PlotSpec`] for a run.
    pub fn validate(&self) -> Result<PlotSpec, ConfigError> {
        let format: ImageFormat = self.image_format.parse()?;

        if self.dpi == 0 {
            return Err(ConfigError::InvalidDimension {
                name: "dpi",
                value: 0.0,
            });
        }
        let width_px = inches_to_px("width", self.width, self.dpi)?;
        let height_px = inches_to_px("height", self.height, self.dpi)?;

        if !(1..=200).contains(&self.font_size) {
            return Err(ConfigError::InvalidFontSize(self.font_size));
        }
        let px_per_pt = f64::from(self.dpi) / POINTS_PER_INCH;
        let font_px = f64::from(self.font_size) * px_per_pt;
        let stroke_px = (LINE_WIDTH_PT * px_per_pt).round().max(1.0) as u32;

        let colors = self
            .colors
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<Rgb>, _>>()?;

        let column_order: ColumnOrder = self.column_order.parse()?;

        Ok(PlotSpec {
            format,
            extension: self.image_format.to_ascii_lowercase(),
            size_px: (width_px, height_px),
            font_px,
            stroke_px,
            colors,
            column_order,
            legend: self.legend,
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            output_dir: self.output_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

fn inches_to_px(name: &'static str, inches: f64, dpi: u32) -> Result<u32, ConfigError> {
    let px = (inches * f64::from(dpi)).round();
    if !inches.is_finite() || inches <= 0.0 || px < 1.0 || px > MAX_SIDE_PX {
        return Err(ConfigError::InvalidDimension { name, value: inches });
    }
    Ok(px as u32)
}

/// Settings for reading input tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extension (without dot) of input files
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Lines dropped before the header row
    #[serde(default = "default_header_skip")]
    pub header_skip: usize,

    /// Text encoding label (WHATWG names)
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_extension() -> String {
    "txt".to_string()
}

fn default_delimiter() -> char {
    '\t'
}

fn default_header_skip() -> usize {
    1
}

fn default_encoding() -> String {
    "iso-8859-1".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            delimiter: default_delimiter(),
            header_skip: default_header_skip(),
            encoding: default_encoding(),
        }
    }
}

impl LoaderConfig {
    /// Look up the configured encoding label.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding, ConfigError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))
    }

    /// Delimiter as a single byte, as required by the CSV reader.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(ConfigError::InvalidDelimiter(self.delimiter))
    }
}

/// Validated, immutable settings for one rendering pass.
#[derive(Debug, Clone)]
pub struct PlotSpec {
    pub format: ImageFormat,
    /// Lowercased extension for output files
    pub extension: String,
    /// Image size in pixels (width, height)
    pub size_px: (u32, u32),
    /// Font size in pixels
    pub font_px: f64,
    /// Series line width in pixels
    pub stroke_px: u32,
    pub colors: Vec<Rgb>,
    pub column_order: ColumnOrder,
    pub legend: bool,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub output_dir: PathBuf,
}

impl PlotSpec {
    /// Color for a 1-based column index.
    pub fn color_for(&self, index: usize) -> Result<Rgb, ConfigError> {
        index
            .checked_sub(1)
            .and_then(|i| self.colors.get(i))
            .copied()
            .ok_or(ConfigError::ColorListTooShort {
                index,
                available: self.colors.len(),
            })
    }
}

/// Top-level configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub plot: PlotConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
