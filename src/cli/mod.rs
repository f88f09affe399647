//! Command-line interface for the batch plotter.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{error, info};

use crate::processors::batch::run_batch;
use crate::AppConfig;

/// Exit code when at least one loaded file could not be rendered.
const EXIT_RENDER_FAILED: i32 = 1;

/// Exit code for configuration errors.
const EXIT_CONFIG: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "colocgraph")]
#[command(about = "Process and plot immunofluorescence intensity profiles", version)]
pub struct Cli {
    /// Path to input directory
    input_dir: PathBuf,

    /// Path to YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data type of output images (svg, png, jpg, jpeg, bmp) [default: svg]
    #[arg(long = "image_data_type")]
    image_data_type: Option<String>,

    /// Order of plotted columns, e.g. 312 [default: 312]
    #[arg(long)]
    order: Option<String>,

    /// Width of the plot in inches [default: 4]
    #[arg(long)]
    width: Option<f64>,

    /// Height of the plot in inches [default: 2]
    #[arg(long)]
    height: Option<f64>,

    /// Resolution in pixels per inch [default: 100]
    #[arg(long)]
    dpi: Option<u32>,

    /// Font size within the plot, in points [default: 9]
    #[arg(long = "font_size")]
    font_size: Option<u32>,

    /// Series colors by column index, comma-separated [default: red,green,blue]
    #[arg(long, value_delimiter = ',')]
    colors: Option<Vec<String>>,

    /// Draw a legend (true/false) [default: false]
    #[arg(long, action = ArgAction::Set)]
    legend: Option<bool>,

    /// X axis label
    #[arg(long = "x_label")]
    x_label: Option<String>,

    /// Y axis label
    #[arg(long = "y_label")]
    y_label: Option<String>,

    /// Directory for output images [default: current directory]
    #[arg(short, long = "output_dir")]
    output_dir: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Overwrite config values with the flags that were given.
    fn apply_overrides(&self, config: &mut AppConfig) {
        let plot = &mut config.plot;

        if let Some(format) = &self.image_data_type {
            plot.image_format = format.clone();
        }
        if let Some(order) = &self.order {
            plot.column_order = order.clone();
        }
        if let Some(width) = self.width {
            plot.width = width;
        }
        if let Some(height) = self.height {
            plot.height = height;
        }
        if let Some(dpi) = self.dpi {
            plot.dpi = dpi;
        }
        if let Some(font_size) = self.font_size {
            plot.font_size = font_size;
        }
        if let Some(colors) = &self.colors {
            plot.colors = colors.iter().map(|c| c.trim().to_string()).collect();
        }
        if let Some(legend) = self.legend {
            plot.legend = legend;
        }
        if self.x_label.is_some() {
            plot.x_label = self.x_label.clone();
        }
        if self.y_label.is_some() {
            plot.y_label = self.y_label.clone();
        }
        if self.output_dir.is_some() {
            plot.output_dir = self.output_dir.clone();
        }
    }

    /// Build the effective configuration: defaults, then config file, then flags.
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let cfg = AppConfig::from_yaml(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?;
                info!("Loaded config from: {}", path.display());
                cfg
            }
            None => AppConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            format!("{}...", value.chars().take(35).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{:#}", e);
            process::exit(EXIT_CONFIG);
        }
    };

    let start = Instant::now();

    match run_batch(&cli.input_dir, &config, true) {
        Ok(report) => {
            print_summary(
                "Plotting Complete",
                &[
                    ("Input directory", cli.input_dir.display().to_string()),
                    ("Files found", report.discovered.len().to_string()),
                    ("Images written", report.rendered.len().to_string()),
                    ("Load failures", report.load_failures.len().to_string()),
                    ("Render failures", report.render_failures.len().to_string()),
                    ("Column order", config.plot.column_order.clone()),
                    ("Format", config.plot.image_format.clone()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );

            for (path, reason) in &report.load_failures {
                println!("Skipped {}: {}", path.display(), reason);
            }
            for (path, reason) in &report.render_failures {
                println!("Not plotted {}: {}", path.display(), reason);
            }

            if !report.render_ok() {
                process::exit(EXIT_RENDER_FAILED);
            }
        }
        Err(e) => {
            error!("{}", e);
            process::exit(EXIT_CONFIG);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_come_from_config() {
        let cli = Cli::try_parse_from(["colocgraph", "data"]).unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(cli.input_dir, PathBuf::from("data"));
        assert_eq!(config.plot.image_format, "svg");
        assert_eq!(config.plot.column_order, "312");
        assert_eq!(config.plot.width, 4.0);
        assert_eq!(config.plot.height, 2.0);
        assert_eq!(config.plot.font_size, 9);
        assert!(!config.plot.legend);
        assert!(config.plot.x_label.is_none());
    }

    #[test]
    fn test_flag_overrides() {
        let cli = Cli::try_parse_from([
            "colocgraph",
            "data",
            "--image_data_type",
            "png",
            "--order",
            "21",
            "--width",
            "6.5",
            "--height",
            "3",
            "--font_size",
            "12",
            "--legend",
            "true",
            "--x_label",
            "Distance [µm]",
            "--colors",
            "black, #ff8800",
            "--output_dir",
            "plots",
            "-vv",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.plot.image_format, "png");
        assert_eq!(config.plot.column_order, "21");
        assert_eq!(config.plot.width, 6.5);
        assert_eq!(config.plot.height, 3.0);
        assert_eq!(config.plot.font_size, 12);
        assert!(config.plot.legend);
        assert_eq!(config.plot.x_label.as_deref(), Some("Distance [µm]"));
        assert_eq!(config.plot.colors, vec!["black", "#ff8800"]);
        assert_eq!(config.plot.output_dir, Some(PathBuf::from("plots")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_legend_requires_bool() {
        assert!(Cli::try_parse_from(["colocgraph", "data", "--legend", "maybe"]).is_err());
        let cli = Cli::try_parse_from(["colocgraph", "data", "--legend", "false"]).unwrap();
        assert_eq!(cli.legend, Some(false));
    }

    #[test]
    fn test_input_dir_required() {
        assert!(Cli::try_parse_from(["colocgraph"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "plot:\n  image_format: bmp\n  font_size: 20\n").unwrap();

        let cli = Cli::try_parse_from([
            "colocgraph",
            "data",
            "--config",
            path.to_str().unwrap(),
            "--font_size",
            "11",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.plot.image_format, "bmp");
        assert_eq!(config.plot.font_size, 11);
    }

    #[test]
    fn test_broken_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "plot: [unclosed").unwrap();

        let cli = Cli::try_parse_from(["colocgraph", "data", "-c", path.to_str().unwrap()]).unwrap();
        assert!(cli.load_config().is_err());
    }
}
