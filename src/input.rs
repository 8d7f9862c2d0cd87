//! # Job Configuration
//!
//! Run parameters as they arrive from a configuration file, the environment or the
//! command line, and their validation into a [`Job`].
//!
//! Every field of [`JobConfig`] is optional so that configurations from several
//! sources can be layered with [`JobConfig::merge`]; [`JobConfig::into_job`] then
//! checks that everything needed is present and valid before any I/O happens.
//!
//! ## Example
//!
//! ```yaml
//! operation: regrid
//! variables: [analysed_sst]
//! in_path: /data/sst/{YEAR}/{MONTH}/{DAY}/*.nc
//! out_path: /data/out
//! lon_min: -10.0
//! lon_max: 10.0
//! lat_min: 40.0
//! lat_max: 60.0
//! start_year: 2022
//! start_month: 1
//! start_day: 1
//! end_year: 2022
//! end_month: 12
//! end_day: 31
//! temporal_resolution: monthly
//! spatial_resolution: 1.0
//! ```
//!
//! With `time_series: true` a regrid run writes one CSV of area means
//! (`year,month,day,<variables>`) instead of gridded files.

use crate::error::{ProcessError, ProcessResult};
use crate::output::{DEFAULT_NAME_PATTERN, NamePattern, OutputFormat};
use crate::selection::{BoundingBox, DateRange, ResamplingTarget, SelectionWindow};
use crate::temporal::TemporalResolution;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Names of the coordinate variables and dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionNames {
    pub time: String,
    pub lat: String,
    pub lon: String,
}

impl Default for DimensionNames {
    fn default() -> Self {
        DimensionNames {
            time: "time".to_string(),
            lat: "lat".to_string(),
            lon: "lon".to_string(),
        }
    }
}

impl DimensionNames {
    pub fn is_coordinate(&self, name: &str) -> bool {
        name == self.time || name == self.lat || name == self.lon
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Subset,
    Regrid,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Subset => write!(f, "subset"),
            Operation::Regrid => write!(f, "regrid"),
        }
    }
}

/// Unvalidated run parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub operation: Option<Operation>,
    pub variables: Vec<String>,
    pub in_path: Option<String>,
    pub out_path: Option<String>,
    pub output_name_pattern: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub start_year: Option<i32>,
    pub start_month: Option<u32>,
    pub start_day: Option<u32>,
    pub end_year: Option<i32>,
    pub end_month: Option<u32>,
    pub end_day: Option<u32>,
    pub temporal_resolution: Option<String>,
    pub spatial_resolution: Option<f64>,
    /// Regrid into one area-mean CSV series instead of gridded files
    pub time_series: Option<bool>,
    pub dimensions: Option<DimensionNames>,
}

/// Validated parameters of one run
#[derive(Debug, Clone)]
pub struct Job {
    pub operation: Operation,
    pub in_path: String,
    pub out_path: String,
    pub window: SelectionWindow,
    /// Present for regridding
    pub target: Option<ResamplingTarget>,
    pub pattern: NamePattern,
    pub format: OutputFormat,
    pub dims: DimensionNames,
}

impl JobConfig {
    /// Loads a configuration file, YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ProcessResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ProcessError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json_str: &str) -> ProcessResult<Self> {
        serde_json::from_str(json_str).map_err(|e| ProcessError::Config(format!("invalid JSON: {e}")))
    }

    pub fn from_yaml(yaml_str: &str) -> ProcessResult<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ProcessError::Config(format!("invalid YAML: {e}")))
    }

    /// Layers `overrides` on top of `self`: every value set in `overrides` wins.
    pub fn merge(self, overrides: JobConfig) -> JobConfig {
        JobConfig {
            operation: overrides.operation.or(self.operation),
            variables: if overrides.variables.is_empty() {
                self.variables
            } else {
                overrides.variables
            },
            in_path: overrides.in_path.or(self.in_path),
            out_path: overrides.out_path.or(self.out_path),
            output_name_pattern: overrides.output_name_pattern.or(self.output_name_pattern),
            output_format: overrides.output_format.or(self.output_format),
            lon_min: overrides.lon_min.or(self.lon_min),
            lon_max: overrides.lon_max.or(self.lon_max),
            lat_min: overrides.lat_min.or(self.lat_min),
            lat_max: overrides.lat_max.or(self.lat_max),
            start_year: overrides.start_year.or(self.start_year),
            start_month: overrides.start_month.or(self.start_month),
            start_day: overrides.start_day.or(self.start_day),
            end_year: overrides.end_year.or(self.end_year),
            end_month: overrides.end_month.or(self.end_month),
            end_day: overrides.end_day.or(self.end_day),
            temporal_resolution: overrides.temporal_resolution.or(self.temporal_resolution),
            spatial_resolution: overrides.spatial_resolution.or(self.spatial_resolution),
            time_series: overrides.time_series.or(self.time_series),
            dimensions: overrides.dimensions.or(self.dimensions),
        }
    }

    /// Validates the configuration for `operation`.
    ///
    /// A missing bounding box edge defaults to the matching edge of the globe.
    pub fn into_job(self, operation: Operation) -> ProcessResult<Job> {
        let in_path = required("in-path", self.in_path)?;
        let out_path = required("out-path", self.out_path)?;

        let bbox = BoundingBox::new(
            self.lon_min.unwrap_or(-180.0),
            self.lon_max.unwrap_or(180.0),
            self.lat_min.unwrap_or(-90.0),
            self.lat_max.unwrap_or(90.0),
        )?;
        let dates = DateRange::from_components(
            (
                required("start-year", self.start_year)?,
                required("start-month", self.start_month)?,
                required("start-day", self.start_day)?,
            ),
            (
                required("end-year", self.end_year)?,
                required("end-month", self.end_month)?,
                required("end-day", self.end_day)?,
            ),
        )?;
        let window = SelectionWindow::new(bbox, dates, split_variables(&self.variables))?;

        let (target, format) = match operation {
            Operation::Subset => {
                if self.temporal_resolution.is_some() || self.spatial_resolution.is_some() {
                    warn!("Resolutions are ignored when subsetting");
                }
                if self.time_series == Some(true) {
                    warn!("Time series output is only produced when regridding");
                }
                (None, self.output_format.unwrap_or_default())
            }
            Operation::Regrid => {
                let time_series = self.time_series.unwrap_or(false);
                let expected = if time_series { OutputFormat::Csv } else { OutputFormat::Netcdf4 };
                if let Some(format) = self.output_format
                    && format != expected
                {
                    return Err(ProcessError::invalid_parameter(
                        "output-format",
                        format!("regridding writes {expected}, not {format}"),
                    ));
                }
                let temporal = self
                    .temporal_resolution
                    .as_deref()
                    .map(str::parse::<TemporalResolution>)
                    .transpose()?;
                let target = if time_series {
                    if self.spatial_resolution.is_some() {
                        warn!("The spatial resolution is ignored for time series output");
                    }
                    ResamplingTarget::time_series(temporal)
                } else {
                    ResamplingTarget::new(self.spatial_resolution, temporal)?
                };
                (Some(target), expected)
            }
        };

        let pattern_text = self.output_name_pattern.as_deref().unwrap_or(DEFAULT_NAME_PATTERN);
        let pattern = NamePattern::new(pattern_text, operation == Operation::Subset)?;

        Ok(Job {
            operation,
            in_path,
            out_path,
            window,
            target,
            pattern,
            format,
            dims: self.dimensions.unwrap_or_default(),
        })
    }
}

fn required<T>(parameter: &str, value: Option<T>) -> ProcessResult<T> {
    value.ok_or_else(|| ProcessError::invalid_parameter(parameter, "is required"))
}

/// Splits comma or whitespace separated variable lists.
pub fn split_variables(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(|c: char| c == ',' || c.is_whitespace()))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> JobConfig {
        JobConfig {
            variables: vec!["sst".to_string()],
            in_path: Some("/data/in".to_string()),
            out_path: Some("/data/out".to_string()),
            start_year: Some(2022),
            start_month: Some(1),
            start_day: Some(1),
            end_year: Some(2022),
            end_month: Some(1),
            end_day: Some(31),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_json_and_yaml() {
        let json = r#"{"variables": ["sst"], "in_path": "in.nc", "lon_min": -10.0, "output_format": "netcdf"}"#;
        let config = JobConfig::from_json(json).unwrap();
        assert_eq!(config.in_path.as_deref(), Some("in.nc"));
        assert_eq!(config.output_format, Some(OutputFormat::Netcdf4));

        let yaml = "operation: regrid\nvariables: [sst, ice]\ntemporal_resolution: monthly\n";
        let config = JobConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.operation, Some(Operation::Regrid));
        assert_eq!(config.variables.len(), 2);

        let err = JobConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.yml");
        std::fs::write(&path, "in_path: /x\nspatial_resolution: 0.5\n").unwrap();
        let config = JobConfig::from_file(&path).unwrap();
        assert_eq!(config.spatial_resolution, Some(0.5));
    }

    #[test]
    fn test_merge_priority() {
        let file = JobConfig {
            lon_min: Some(-20.0),
            lon_max: Some(20.0),
            ..base()
        };
        let cli = JobConfig {
            lon_min: Some(-5.0),
            variables: vec!["chl".to_string()],
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.lon_min, Some(-5.0));
        assert_eq!(merged.lon_max, Some(20.0));
        assert_eq!(merged.variables, vec!["chl"]);
        assert_eq!(merged.in_path.as_deref(), Some("/data/in"));
    }

    #[test]
    fn test_into_job_subset() {
        let job = base().into_job(Operation::Subset).unwrap();
        assert_eq!(job.window.bbox, BoundingBox::global());
        assert_eq!(job.format, OutputFormat::Netcdf4);
        assert!(job.target.is_none());
        assert_eq!(job.dims, DimensionNames::default());
    }

    #[test]
    fn test_into_job_regrid() {
        let job = JobConfig {
            temporal_resolution: Some("dekad".to_string()),
            ..base()
        }
        .into_job(Operation::Regrid)
        .unwrap();
        let target = job.target.unwrap();
        assert_eq!(target.temporal, Some(TemporalResolution::Dekad));
        assert_eq!(target.spatial, None);

        let err = base().into_job(Operation::Regrid).unwrap_err();
        assert_eq!(err.kind(), "InvalidParameterError");

        let err = JobConfig {
            spatial_resolution: Some(1.0),
            output_format: Some(OutputFormat::Csv),
            ..base()
        }
        .into_job(Operation::Regrid)
        .unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("output-format"));

        let err = JobConfig {
            spatial_resolution: Some(1.0),
            output_name_pattern: Some("{FILENAME}".to_string()),
            ..base()
        }
        .into_job(Operation::Regrid)
        .unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("output-name-pattern"));
    }

    #[test]
    fn test_into_job_time_series() {
        let job = JobConfig {
            time_series: Some(true),
            spatial_resolution: Some(1.0),
            ..base()
        }
        .into_job(Operation::Regrid)
        .unwrap();
        let target = job.target.unwrap();
        assert!(target.time_series);
        assert_eq!(target.spatial, None);
        assert_eq!(target.temporal, None);
        assert_eq!(job.format, OutputFormat::Csv);

        let err = JobConfig {
            time_series: Some(true),
            output_format: Some(OutputFormat::Netcdf4),
            ..base()
        }
        .into_job(Operation::Regrid)
        .unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("output-format"));

        let merged = JobConfig {
            time_series: Some(true),
            ..base()
        }
        .merge(JobConfig::default());
        assert_eq!(merged.time_series, Some(true));
    }

    #[test]
    fn test_into_job_missing_and_invalid() {
        let err = JobConfig { in_path: None, ..base() }.into_job(Operation::Subset).unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("in-path"));

        let err = JobConfig { end_day: Some(32), ..base() }.into_job(Operation::Subset).unwrap_err();
        assert_eq!(err.kind(), "InvalidRangeError");

        let err = JobConfig {
            lat_min: Some(10.0),
            lat_max: Some(0.0),
            ..base()
        }
        .into_job(Operation::Subset)
        .unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("lat-min"));

        let err = JobConfig { variables: vec![], ..base() }.into_job(Operation::Subset).unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("variables"));
    }

    #[test]
    fn test_split_variables() {
        let vars = split_variables(&["sst,ice".to_string(), "chl  kd490".to_string()]);
        assert_eq!(vars, vec!["sst", "ice", "chl", "kd490"]);
    }
}
