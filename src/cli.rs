//! # CLI Module
//!
//! Command-line interface of gridslice:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML)
//! - Environment variable fallbacks with the `GRIDSLICE_` prefix
//! - Layering of config file, environment and command line
//!
//! The command line (or its environment variable) always wins over the config file.

use crate::error::{ProcessError, ProcessResult};
use crate::input::{JobConfig, Operation};
use crate::output::OutputFormat;
use crate::temporal::TemporalResolution;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subsetting and regridding of gridded geophysical datasets
#[derive(Parser, Debug)]
#[command(name = "gridslice")]
#[command(about = "Subset and regrid gridded NetCDF datasets by area, time and variable")]
#[command(version)]
#[command(long_about = "
gridslice extracts a geographic box, a date range and a set of variables from
collections of gridded NetCDF files, optionally regridding them to a coarser or finer
spatial resolution and aggregating them over time.

FEATURES:
  • Bounding boxes crossing the antimeridian, on [-180, 180] and [0, 360] grids
  • Daily, pentad, dekad, N-day, monthly and yearly aggregation
  • Input path patterns with {YEAR}, {MONTH} and {DAY} placeholders
  • NetCDF4, CSV and Parquet output, locally or on S3
  • Configuration files: JSON and YAML

EXAMPLES:
  # Subset one month of SST over the North Atlantic
  gridslice subset --variables analysed_sst --in-path '/data/sst/{YEAR}{MONTH}{DAY}*.nc' \\
    --out-path out --lon-min -80 --lon-max 0 --lat-min 0 --lat-max 60 \\
    --start-year 2022 --start-month 1 --start-day 1 \\
    --end-year 2022 --end-month 1 --end-day 31

  # Monthly means on a 1 degree grid
  gridslice regrid --config job.yaml --temporal-resolution monthly --spatial-resolution 1

  # Inspect an input location
  gridslice info /data/sst --detailed
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "GRIDSLICE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parameters shared by `subset` and `regrid`
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct SelectionArgs {
    /// Variables to extract, comma or space separated (repeatable)
    #[arg(long, num_args = 1.., env = "GRIDSLICE_VARIABLES")]
    pub variables: Vec<String>,

    /// Input location: file, directory, glob or {YEAR}/{MONTH}/{DAY} pattern
    #[arg(long, env = "GRIDSLICE_IN_PATH")]
    pub in_path: Option<String>,

    /// Output directory (local or s3://bucket/prefix)
    #[arg(long, env = "GRIDSLICE_OUT_PATH")]
    pub out_path: Option<String>,

    /// Output file name template
    #[arg(long, env = "GRIDSLICE_OUTPUT_NAME_PATTERN")]
    pub output_name_pattern: Option<String>,

    #[arg(long, allow_negative_numbers = true, env = "GRIDSLICE_LON_MIN")]
    pub lon_min: Option<f64>,

    #[arg(long, allow_negative_numbers = true, env = "GRIDSLICE_LON_MAX")]
    pub lon_max: Option<f64>,

    #[arg(long, allow_negative_numbers = true, env = "GRIDSLICE_LAT_MIN")]
    pub lat_min: Option<f64>,

    #[arg(long, allow_negative_numbers = true, env = "GRIDSLICE_LAT_MAX")]
    pub lat_max: Option<f64>,

    #[arg(long, env = "GRIDSLICE_START_YEAR")]
    pub start_year: Option<i32>,

    #[arg(long, env = "GRIDSLICE_START_MONTH")]
    pub start_month: Option<u32>,

    #[arg(long, env = "GRIDSLICE_START_DAY")]
    pub start_day: Option<u32>,

    #[arg(long, env = "GRIDSLICE_END_YEAR")]
    pub end_year: Option<i32>,

    #[arg(long, env = "GRIDSLICE_END_MONTH")]
    pub end_month: Option<u32>,

    #[arg(long, env = "GRIDSLICE_END_DAY")]
    pub end_day: Option<u32>,

    /// Dry run - validate and echo the configuration without processing
    #[arg(long, env = "GRIDSLICE_DRY_RUN")]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a box, a date range and variables without changing the grid
    #[command(long_about = "
Extract a bounding box, a date range and a set of variables from each dataset unit.

One output unit is written per input unit, on the source grid. Boxes with
--lon-min greater than --lon-max cross the antimeridian. GeoTIFF output writes one
<name>-<variable>.tif file per variable, one page per time step.

EXAMPLES:
  gridslice subset --variables sst,ice --in-path /data/sst --out-path out \\
    --lon-min 170 --lon-max -170 --lat-min -10 --lat-max 10 \\
    --start-year 2022 --start-month 1 --start-day 1 \\
    --end-year 2022 --end-month 1 --end-day 10 --output-format csv
")]
    Subset {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format: netcdf4 (alias netcdf, nc), csv, parquet or geotiff (alias tif, tiff)
        #[arg(long, value_parser = parse_output_format, env = "GRIDSLICE_OUTPUT_FORMAT")]
        output_format: Option<OutputFormat>,
    },

    /// Subset, then resample in space and/or time
    #[command(long_about = "
Subset the input, then resample it to a new spatial resolution, a new temporal
resolution, or both. Regridded output is NetCDF4, except with --time-series, which
writes one CSV of area means over the bounding box (year,month,day,<variables>).

Temporal resolutions: daily, pentad, dekad, monthly, yearly, or Nd for N-day buckets.

EXAMPLES:
  gridslice regrid --config job.yaml --temporal-resolution dekad
  gridslice regrid --config job.yaml --spatial-resolution 0.25
  gridslice regrid --config job.yaml --temporal-resolution monthly --time-series
")]
    Regrid {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Target temporal resolution
        #[arg(long, value_parser = parse_temporal_resolution, env = "GRIDSLICE_TEMPORAL_RESOLUTION")]
        temporal_resolution: Option<String>,

        /// Target cell size in degrees
        #[arg(long, env = "GRIDSLICE_SPATIAL_RESOLUTION")]
        spatial_resolution: Option<f64>,

        /// Write the area mean of each step or bucket as one CSV series
        #[arg(long, env = "GRIDSLICE_TIME_SERIES")]
        time_series: bool,
    },

    /// Show the dataset units behind an input location
    #[command(long_about = "
List the dataset units an input location resolves to, with their dates, grids and
variables.

EXAMPLES:
  gridslice info /data/sst
  gridslice info '/data/sst/{YEAR}{MONTH}{DAY}*.nc' --start-date 2022-01-01 --end-date 2022-01-31
  gridslice info /data/sst/one.nc --detailed --format json
")]
    Info {
        /// Input location (file, directory, glob or dated pattern)
        in_path: String,

        #[arg(long, value_parser = parse_date, requires = "end_date")]
        start_date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_date, requires = "start_date")]
        end_date: Option<NaiveDate>,

        /// Show per-variable dimensions and units
        #[arg(long)]
        detailed: bool,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Human)]
        format: ReportFormat,
    },

    /// Validate a configuration file without reading any data
    #[command(long_about = "
Check that a configuration file parses and describes a valid job, without touching
the input or output locations.

EXAMPLES:
  gridslice validate job.yaml
  gridslice validate job.json --operation regrid
")]
    Validate {
        /// Configuration file to validate (defaults to --config)
        config_file: Option<PathBuf>,

        /// Operation to validate for (defaults to the file's own, then subset)
        #[arg(long, value_parser = parse_operation)]
        operation: Option<Operation>,
    },

    /// Generate shell completions
    #[command(long_about = "
Generate shell completion scripts for bash, zsh, fish, elvish and PowerShell.

EXAMPLES:
  gridslice completions bash > ~/.bash_completion.d/gridslice
  gridslice completions zsh -o _gridslice
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable output
    Human,
    /// JSON structured output
    Json,
    /// YAML structured output
    Yaml,
    /// CSV output, one row per dataset unit
    Csv,
}

impl SelectionArgs {
    pub fn to_job_config(&self) -> JobConfig {
        JobConfig {
            variables: self.variables.clone(),
            in_path: self.in_path.clone(),
            out_path: self.out_path.clone(),
            output_name_pattern: self.output_name_pattern.clone(),
            lon_min: self.lon_min,
            lon_max: self.lon_max,
            lat_min: self.lat_min,
            lat_max: self.lat_max,
            start_year: self.start_year,
            start_month: self.start_month,
            start_day: self.start_day,
            end_year: self.end_year,
            end_month: self.end_month,
            end_day: self.end_day,
            ..JobConfig::default()
        }
    }
}

impl Commands {
    /// The run parameters given on the command line, with the operation they belong to.
    pub fn job_overrides(&self) -> Option<(Operation, JobConfig)> {
        match self {
            Commands::Subset {
                selection,
                output_format,
            } => Some((
                Operation::Subset,
                JobConfig {
                    operation: Some(Operation::Subset),
                    output_format: *output_format,
                    ..selection.to_job_config()
                },
            )),
            Commands::Regrid {
                selection,
                temporal_resolution,
                spatial_resolution,
                time_series,
            } => Some((
                Operation::Regrid,
                JobConfig {
                    operation: Some(Operation::Regrid),
                    temporal_resolution: temporal_resolution.clone(),
                    spatial_resolution: *spatial_resolution,
                    time_series: time_series.then_some(true),
                    ..selection.to_job_config()
                },
            )),
            _ => None,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        match self {
            Commands::Subset { selection, .. } | Commands::Regrid { selection, .. } => selection.dry_run,
            _ => false,
        }
    }
}

/// Layers the command-line values over the configuration file, when there is one.
pub fn layered_config(config_path: Option<&Path>, overrides: JobConfig) -> ProcessResult<JobConfig> {
    let base = match config_path {
        Some(path) => JobConfig::from_file(path)?,
        None => JobConfig::default(),
    };
    Ok(base.merge(overrides))
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Checks the resolution early but keeps its textual form for the config layer.
fn parse_temporal_resolution(s: &str) -> Result<String, String> {
    s.parse::<TemporalResolution>()
        .map(|_| s.trim().to_string())
        .map_err(|e| e.to_string())
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    match s.trim().to_lowercase().as_str() {
        "subset" => Ok(Operation::Subset),
        "regrid" => Ok(Operation::Regrid),
        other => Err(ProcessError::invalid_parameter("operation", format!("unknown operation '{other}'")).to_string()),
    }
}

/// Format: YYYY-MM-DD
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| format!("'{s}' is not a YYYY-MM-DD date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("netcdf4").unwrap(), OutputFormat::Netcdf4);
        assert_eq!(parse_output_format("NC").unwrap(), OutputFormat::Netcdf4);
        assert_eq!(parse_output_format("parquet").unwrap(), OutputFormat::Parquet);
        assert_eq!(parse_output_format("GeoTIFF").unwrap(), OutputFormat::Geotiff);
        assert!(parse_output_format("hdf4").is_err());
    }

    #[test]
    fn test_parse_temporal_resolution() {
        assert_eq!(parse_temporal_resolution("monthly").unwrap(), "monthly");
        assert_eq!(parse_temporal_resolution(" 7d ").unwrap(), "7d");
        assert!(parse_temporal_resolution("fortnightly").is_err());
    }

    #[test]
    fn test_parse_operation_and_date() {
        assert_eq!(parse_operation("Regrid").unwrap(), Operation::Regrid);
        assert!(parse_operation("convert").is_err());
        assert_eq!(parse_date("2022-02-28").unwrap(), NaiveDate::from_ymd_opt(2022, 2, 28).unwrap());
        assert!(parse_date("2022-02-30").is_err());
    }

    #[test]
    fn test_layered_config_command_line_wins() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("job.yaml");
        std::fs::write(
            &path,
            "variables: [sst]\nin_path: /data/a\nout_path: /data/out\nlon_min: -10.0\n",
        )
        .unwrap();

        let overrides = JobConfig {
            in_path: Some("/data/b".to_string()),
            ..JobConfig::default()
        };
        let merged = layered_config(Some(&path), overrides).unwrap();
        assert_eq!(merged.in_path.as_deref(), Some("/data/b"));
        assert_eq!(merged.out_path.as_deref(), Some("/data/out"));
        assert_eq!(merged.variables, vec!["sst".to_string()]);
        assert_eq!(merged.lon_min, Some(-10.0));
    }

    #[test]
    fn test_layered_config_missing_file() {
        let err = layered_config(Some(Path::new("/nonexistent/job.json")), JobConfig::default()).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_environment_variable_fallbacks() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("GRIDSLICE_IN_PATH", "/env/in");
            env::set_var("GRIDSLICE_LAT_MIN", "-30");
            env::set_var("GRIDSLICE_TEMPORAL_RESOLUTION", "dekad");
        }

        let parsed = Cli::try_parse_from(["gridslice", "regrid", "--in-path", "/cli/in"]);

        unsafe {
            env::remove_var("GRIDSLICE_IN_PATH");
            env::remove_var("GRIDSLICE_LAT_MIN");
            env::remove_var("GRIDSLICE_TEMPORAL_RESOLUTION");
        }

        let cli = parsed.unwrap();
        let (operation, config) = cli.command.job_overrides().unwrap();
        assert_eq!(operation, Operation::Regrid);
        assert_eq!(config.in_path.as_deref(), Some("/cli/in"));
        assert_eq!(config.lat_min, Some(-30.0));
        assert_eq!(config.temporal_resolution.as_deref(), Some("dekad"));
    }
}
