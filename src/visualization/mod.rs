//! Line chart rendering for loaded tables.
//!
//! One image is produced per table: the first column is the shared x-axis and
//! every index of the configured column order adds one line series, drawn in
//! that order. SVG output goes through plotters' vector backend, raster formats
//! through the bitmap backend.

use std::path::{Path, PathBuf};

use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::config::{ConfigError, ImageFormat, PlotSpec, Rgb};
use crate::core::loaders::Table;

/// Errors that can occur during rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Configuration does not fit the table (affects every file alike).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plotting error: {0}")]
    PlottingError(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Font family used for all text.
const FONT_FAMILY: &str = "sans-serif";

/// Fraction of the data range added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

/// Length of the legend line sample, in pixels.
const LEGEND_SAMPLE_PX: i32 = 20;

/// What a rendering call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSummary {
    /// Written image path.
    pub output: PathBuf,
    /// Column indices drawn, in draw order.
    pub drawn: Vec<usize>,
    /// Column indices skipped because the table is narrower.
    pub skipped: Vec<usize>,
}

/// One series resolved against a concrete table.
struct PlannedSeries<'a> {
    index: usize,
    label: &'a str,
    values: &'a [f64],
    color: Rgb,
}

/// Resolve the column order against `table`.
///
/// Indices beyond the table's last column are skipped. A drawable index
/// without a configured color is a configuration error.
fn plan_series<'a>(table: &'a Table, spec: &PlotSpec) -> Result<(Vec<PlannedSeries<'a>>, Vec<usize>)> {
    let mut planned = Vec::with_capacity(spec.column_order.indices().len());
    let mut skipped = Vec::new();

    for &index in spec.column_order.indices() {
        let (Some(values), Some(label)) = (table.column(index), table.header(index)) else {
            debug!(
                "Skipping column {}: table has only {} columns",
                index,
                table.num_columns()
            );
            skipped.push(index);
            continue;
        };

        planned.push(PlannedSeries {
            index,
            label,
            values,
            color: spec.color_for(index)?,
        });
    }

    Ok((planned, skipped))
}

/// Render `table` as a line chart and write it to `output`.
///
/// The drawing surface is created for this call only and released before it
/// returns, on success and on every error path. An existing file at `output`
/// is overwritten.
///
/// # Arguments
///
/// * `table` - Loaded table; column 0 is the x-axis
/// * `spec` - Validated plot settings
/// * `output` - Image path; its format is taken from `spec.format`
///
/// # Errors
///
/// Returns [`RenderError::Config`] when a drawable column has no color, and
/// [`RenderError::PlottingError`] when the backend fails to draw or write.
pub fn render_table(table: &Table, spec: &PlotSpec, output: &Path) -> Result<RenderSummary> {
    let (series, skipped) = plan_series(table, spec)?;

    match spec.format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(output, spec.size_px).into_drawing_area();
            draw_chart(&root, table.x(), &series, spec)?;
            root.present().map_err(|e| RenderError::PlottingError(e.to_string()))?;
        }
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp => {
            // Encoding is picked from the output extension
            let root = BitMapBackend::new(output, spec.size_px).into_drawing_area();
            draw_chart(&root, table.x(), &series, spec)?;
            root.present().map_err(|e| RenderError::PlottingError(e.to_string()))?;
        }
    }

    Ok(RenderSummary {
        output: output.to_path_buf(),
        drawn: series.iter().map(|s| s.index).collect(),
        skipped,
    })
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    x: &[f64],
    series: &[PlannedSeries<'_>],
    spec: &PlotSpec,
) -> Result<()> {
    root.fill(&WHITE).map_err(|e| RenderError::PlottingError(e.to_string()))?;

    let (x_min, x_max) = padded_bounds(x.iter().copied());
    let (y_min, y_max) = padded_bounds(series.iter().flat_map(|s| s.values.iter().copied()));

    let font_px = spec.font_px;
    let text_style = (FONT_FAMILY, font_px).into_font().color(&BLACK);

    let desc_area = |label: &Option<String>| if label.is_some() { font_px * 1.5 } else { 0.0 };
    let x_area = (font_px * 2.0 + desc_area(&spec.x_label)).ceil() as u32;
    let y_area = (font_px * 4.0 + desc_area(&spec.y_label)).ceil() as u32;
    let margin = (font_px * 0.8).ceil().max(5.0) as u32;

    let mut chart = ChartBuilder::on(root)
        .margin(margin)
        .x_label_area_size(x_area)
        .y_label_area_size(y_area)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| RenderError::PlottingError(e.to_string()))?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .label_style(text_style.clone())
        .axis_desc_style(text_style.clone());
    if let Some(label) = &spec.x_label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &spec.y_label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw().map_err(|e| RenderError::PlottingError(e.to_string()))?;

    for s in series {
        let style = RGBColor(s.color.0, s.color.1, s.color.2).stroke_width(spec.stroke_px);
        let points = x.iter().copied().zip(s.values.iter().copied());

        chart
            .draw_series(LineSeries::new(points, style))
            .map_err(|e| RenderError::PlottingError(e.to_string()))?
            .label(s.label)
            .legend(move |(lx, ly)| PathElement::new(vec![(lx, ly), (lx + LEGEND_SAMPLE_PX, ly)], style));
    }

    if spec.legend && !series.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(text_style)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(|e| RenderError::PlottingError(e.to_string()))?;
    }

    Ok(())
}

/// Compute (min, max) of `values` with padding on both sides.
///
/// Empty input maps to `0..1`; a zero-width range is widened by 1 on each side.
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if min > max {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }

    let padding = (max - min) * AXIS_PADDING;
    (min - padding, max + padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlotConfig;
    use std::fs;
    use tempfile::tempdir;

    fn sample_table() -> Table {
        Table::from_columns(
            vec!["Distance".into(), "A".into(), "B".into(), "C".into()],
            vec![
                vec![0.0, 0.5, 1.0],
                vec![1.0, 2.0, 3.0],
                vec![3.0, 2.0, 1.0],
                vec![2.0, 2.5, 2.0],
            ],
        )
    }

    fn spec_with(config: PlotConfig, out: &Path) -> PlotSpec {
        PlotConfig {
            output_dir: Some(out.to_path_buf()),
            ..config
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_padded_bounds() {
        let (lo, hi) = padded_bounds([0.0, 10.0].into_iter());
        assert!((lo + 0.5).abs() < 1e-9);
        assert!((hi - 10.5).abs() < 1e-9);

        assert_eq!(padded_bounds(std::iter::empty()), (0.0, 1.0));
        assert_eq!(padded_bounds([2.0, 2.0].into_iter()), (1.0, 3.0));
    }

    #[test]
    fn test_plan_series_order_and_labels() {
        let table = sample_table();
        let spec = PlotConfig::default().validate().unwrap();

        let (planned, skipped) = plan_series(&table, &spec).unwrap();
        let indices: Vec<usize> = planned.iter().map(|s| s.index).collect();
        let labels: Vec<&str> = planned.iter().map(|s| s.label).collect();

        assert_eq!(indices, vec![3, 1, 2]);
        assert_eq!(labels, vec!["C", "A", "B"]);
        assert_eq!(planned[0].color, Rgb(0, 0, 255));
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_plan_series_skips_out_of_range_before_color_check() {
        let table = sample_table();
        let spec = PlotConfig {
            column_order: "19".to_string(),
            ..PlotConfig::default()
        }
        .validate()
        .unwrap();

        let (planned, skipped) = plan_series(&table, &spec).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(skipped, vec![9]);
    }

    #[test]
    fn test_render_svg_draw_order() {
        let dir = tempdir().unwrap();
        let spec = spec_with(PlotConfig::default(), dir.path());
        let output = dir.path().join("sample.svg");

        let summary = render_table(&sample_table(), &spec, &output).unwrap();
        assert_eq!(summary.drawn, vec![3, 1, 2]);
        assert!(summary.skipped.is_empty());

        let svg = fs::read_to_string(&output).unwrap().to_lowercase();
        assert!(svg.contains("<svg"));
        let blue = svg.find("#0000ff").expect("column 3 drawn in blue");
        let red = svg.find("#ff0000").expect("column 1 drawn in red");
        let green = svg.find("#008000").expect("column 2 drawn in green");
        assert!(blue < red && red < green);
    }

    #[test]
    fn test_render_skips_wide_index_without_error() {
        let dir = tempdir().unwrap();
        let spec = spec_with(
            PlotConfig {
                column_order: "9".to_string(),
                ..PlotConfig::default()
            },
            dir.path(),
        );
        let output = dir.path().join("wide.svg");

        let summary = render_table(&sample_table(), &spec, &output).unwrap();
        assert!(summary.drawn.is_empty());
        assert_eq!(summary.skipped, vec![9]);
        assert!(output.exists());
    }

    #[test]
    fn test_render_color_list_too_short() {
        let dir = tempdir().unwrap();
        let spec = spec_with(
            PlotConfig {
                colors: vec!["red".to_string()],
                column_order: "12".to_string(),
                ..PlotConfig::default()
            },
            dir.path(),
        );
        let output = dir.path().join("short.svg");

        let result = render_table(&sample_table(), &spec, &output);
        assert!(matches!(
            result,
            Err(RenderError::Config(ConfigError::ColorListTooShort { index: 2, available: 1 }))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_render_is_deterministic() {
        let dir = tempdir().unwrap();
        let spec = spec_with(
            PlotConfig {
                legend: true,
                x_label: Some("Distance [µm]".to_string()),
                y_label: Some("Intensity".to_string()),
                ..PlotConfig::default()
            },
            dir.path(),
        );
        let first = dir.path().join("first.svg");
        let second = dir.path().join("second.svg");

        render_table(&sample_table(), &spec, &first).unwrap();
        render_table(&sample_table(), &spec, &second).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_render_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let spec = spec_with(PlotConfig::default(), dir.path());
        let output = dir.path().join("sample.svg");
        fs::write(&output, "stale").unwrap();

        render_table(&sample_table(), &spec, &output).unwrap();

        let svg = fs::read_to_string(&output).unwrap();
        assert!(!svg.contains("stale"));
    }

    #[test]
    fn test_render_empty_table() {
        let dir = tempdir().unwrap();
        let spec = spec_with(PlotConfig::default(), dir.path());
        let table = Table::from_columns(
            vec!["Distance".into(), "A".into()],
            vec![Vec::new(), Vec::new()],
        );
        let output = dir.path().join("empty.svg");

        let summary = render_table(&table, &spec, &output).unwrap();
        assert_eq!(summary.drawn, vec![1]);
        assert_eq!(summary.skipped, vec![3, 2]);
    }

    #[test]
    fn test_render_png() {
        let dir = tempdir().unwrap();
        let spec = spec_with(
            PlotConfig {
                image_format: "png".to_string(),
                ..PlotConfig::default()
            },
            dir.path(),
        );
        let output = dir.path().join("sample.png");

        render_table(&sample_table(), &spec, &output).unwrap();

        let bytes = fs::read(&output).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
