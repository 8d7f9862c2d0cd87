//! # Data Extraction
//!
//! The reader capability of the engine. A [`DatasetReader`] discovers the dataset
//! units behind an input location (metadata only) and later reads the arrays of one
//! unit for an index window.
//!
//! ## Key Components
//!
//! - [`DatasetUnit`]: immutable descriptor of one input file
//! - [`UnitData`]: the cropped arrays of one unit, fill values masked to NaN
//! - [`NetCdfReader`]: reader for NetCDF archives addressed by path patterns

use crate::error::{ProcessError, ProcessResult};
use crate::filters::IndexWindow;
use crate::grid::{Axis, GridDescriptor};
use crate::input::DimensionNames;
use crate::selection::DateRange;
use crate::temporal::decode_cf_time;
use chrono::NaiveDate;
use log::{debug, warn};
use ndarray::{Array3, Axis as ArrayAxis, concatenate};
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Smallest independently readable piece of an input archive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetUnit {
    pub path: PathBuf,
    /// Calendar date of every time step, ascending
    pub steps: Vec<NaiveDate>,
    pub grid: GridDescriptor,
    /// Data variables (coordinate variables excluded)
    pub variables: Vec<String>,
}

impl DatasetUnit {
    /// First and last day covered by the unit
    pub fn coverage(&self) -> (NaiveDate, NaiveDate) {
        let first = self.steps.first().copied().unwrap_or(NaiveDate::MIN);
        let last = self.steps.last().copied().unwrap_or(first);
        (first, last)
    }

    pub fn name(&self) -> String {
        self.path.display().to_string()
    }

    /// File name without extension, used by the `{FILENAME}` placeholder
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Index ranges to read from one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWindow {
    pub time: Range<usize>,
    pub space: IndexWindow,
}

/// Values of one variable, always stored as `time × lat × lon`
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub values: Array3<f64>,
    /// False for time-invariant variables, whose time axis has length one
    pub timed: bool,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// Arrays read from one dataset unit
#[derive(Debug, Clone, PartialEq)]
pub struct UnitData {
    pub source: String,
    pub steps: Vec<NaiveDate>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Fields in requested order
    pub fields: Vec<(String, Field)>,
}

impl UnitData {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Capability that lists and reads dataset units
pub trait DatasetReader {
    /// Lists the units behind `in_path` for the dates in `dates`, in discovery order.
    fn discover(&self, in_path: &str, dates: &DateRange) -> ProcessResult<Vec<DatasetUnit>>;

    /// Reads `variables` of `unit` restricted to `window`.
    fn read(&self, unit: &DatasetUnit, variables: &[String], window: &ReadWindow) -> ProcessResult<UnitData>;
}

/// A glob pattern produced from the input location, with the date that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPattern {
    pub pattern: String,
    /// Set when the location names a single day (`{YEAR}`, `{MONTH}` and `{DAY}`)
    pub date: Option<NaiveDate>,
}

/// Expands `{YEAR}`, `{MONTH}` and `{DAY}` placeholders for every day of `dates`.
///
/// Locations without placeholders are used as they are; a directory stands for the
/// NetCDF files directly inside it.
pub fn expand_input_patterns(in_path: &str, dates: &DateRange) -> Vec<InputPattern> {
    let dated = ["{YEAR}", "{MONTH}", "{DAY}"].iter().any(|p| in_path.contains(p));
    if !dated {
        let pattern = if Path::new(in_path).is_dir() {
            Path::new(in_path).join("*.nc").to_string_lossy().to_string()
        } else {
            in_path.to_string()
        };
        return vec![InputPattern { pattern, date: None }];
    }

    let single_day = ["{YEAR}", "{MONTH}", "{DAY}"].iter().all(|p| in_path.contains(p));
    let mut seen = HashSet::new();
    let mut patterns = Vec::new();
    for day in dates.days() {
        let pattern = in_path
            .replace("{YEAR}", &day.format("%Y").to_string())
            .replace("{MONTH}", &day.format("%m").to_string())
            .replace("{DAY}", &day.format("%d").to_string());
        if seen.insert(pattern.clone()) {
            patterns.push(InputPattern {
                pattern,
                date: single_day.then_some(day),
            });
        }
    }
    patterns
}

/// Reader for NetCDF files
#[derive(Debug, Clone, Default)]
pub struct NetCdfReader {
    pub dims: DimensionNames,
}

impl NetCdfReader {
    pub fn new(dims: DimensionNames) -> Self {
        NetCdfReader { dims }
    }

    /// Reads the metadata of one file into a [`DatasetUnit`].
    pub fn describe(&self, path: &Path, date_hint: Option<NaiveDate>) -> ProcessResult<DatasetUnit> {
        let unit_name = path.display().to_string();
        let file = netcdf::open(path).map_err(|source| ProcessError::Read {
            unit: unit_name.clone(),
            source,
        })?;

        let lat = read_axis(&file, &self.dims.lat, &unit_name)?;
        let lon = read_axis(&file, &self.dims.lon, &unit_name)?;

        let steps = match file.variable(&self.dims.time) {
            Some(time_var) => {
                let values = time_var
                    .get_values::<f64, _>(..)
                    .map_err(|source| ProcessError::Read {
                        unit: unit_name.clone(),
                        source,
                    })?;
                let units = attr_string(&time_var, "units").ok_or_else(|| {
                    ProcessError::invalid_dataset(&unit_name, "time coordinate has no 'units' attribute")
                })?;
                let steps = decode_cf_time(&units, &values)
                    .map_err(|reason| ProcessError::invalid_dataset(&unit_name, reason))?;
                if steps.windows(2).any(|w| w[1] < w[0]) {
                    return Err(ProcessError::invalid_dataset(
                        &unit_name,
                        "time coordinate is not in ascending order",
                    ));
                }
                steps
            }
            None => match date_hint {
                Some(date) => vec![date],
                None => {
                    return Err(ProcessError::invalid_dataset(
                        &unit_name,
                        format!("no '{}' coordinate and no date in the input path", self.dims.time),
                    ));
                }
            },
        };
        if steps.is_empty() {
            return Err(ProcessError::invalid_dataset(&unit_name, "time coordinate is empty"));
        }

        let variables: Vec<String> = file
            .variables()
            .map(|var| var.name().to_string())
            .filter(|name| !self.dims.is_coordinate(name))
            .collect();

        Ok(DatasetUnit {
            path: path.to_path_buf(),
            steps,
            grid: GridDescriptor::new(lat, lon),
            variables,
        })
    }
}

impl DatasetReader for NetCdfReader {
    fn discover(&self, in_path: &str, dates: &DateRange) -> ProcessResult<Vec<DatasetUnit>> {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut units = Vec::new();

        for input in expand_input_patterns(in_path, dates) {
            let entries = glob::glob(&input.pattern).map_err(|e| {
                ProcessError::invalid_parameter("in-path", format!("bad pattern '{}': {}", input.pattern, e))
            })?;
            let mut matched: Vec<PathBuf> = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| ProcessError::Io(e.into_error()))?;
                if path.is_file() {
                    matched.push(path);
                }
            }
            if input.date.is_some() && matched.len() > 1 {
                return Err(ProcessError::AmbiguousInput {
                    pattern: input.pattern,
                });
            }
            for path in matched {
                if seen.insert(path.clone()) {
                    debug!("Discovered dataset unit: {}", path.display());
                    units.push(self.describe(&path, input.date)?);
                }
            }
        }

        if units.is_empty() {
            return Err(ProcessError::invalid_parameter(
                "in-path",
                format!("'{in_path}' does not resolve to any dataset unit"),
            ));
        }
        Ok(units)
    }

    fn read(&self, unit: &DatasetUnit, variables: &[String], window: &ReadWindow) -> ProcessResult<UnitData> {
        let unit_name = unit.name();
        let read_err = |source: netcdf::Error| ProcessError::Read {
            unit: unit_name.clone(),
            source,
        };
        let file = netcdf::open(&unit.path).map_err(read_err)?;

        let lat: Vec<f64> = window.space.lat_indices().iter().map(|&i| unit.grid.lat.value(i)).collect();
        let lon: Vec<f64> = window.space.lon_indices().iter().map(|&i| unit.grid.lon.value(i)).collect();
        let steps = unit.steps[window.time.clone()].to_vec();

        let mut fields = Vec::new();
        for name in variables {
            let var = file
                .variable(name)
                .ok_or_else(|| ProcessError::invalid_dataset(&unit_name, format!("variable '{name}' not found")))?;
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();

            let timed = match dims.as_slice() {
                [t, y, x] if *t == self.dims.time && *y == self.dims.lat && *x == self.dims.lon => true,
                [y, x] if *y == self.dims.lat && *x == self.dims.lon => false,
                _ => {
                    return Err(ProcessError::invalid_dataset(
                        &unit_name,
                        format!(
                            "variable '{}' has dimensions [{}], expected [{}, {}, {}] or [{}, {}]",
                            name,
                            dims.join(", "),
                            self.dims.time,
                            self.dims.lat,
                            self.dims.lon,
                            self.dims.lat,
                            self.dims.lon
                        ),
                    ));
                }
            };

            let time_len = if timed { window.time.len() } else { 1 };
            let mut blocks = Vec::with_capacity(window.space.lon.len());
            for lon_range in &window.space.lon {
                let raw = if timed {
                    var.get_values::<f64, _>((window.time.clone(), window.space.lat.clone(), lon_range.clone()))
                } else {
                    var.get_values::<f64, _>((window.space.lat.clone(), lon_range.clone()))
                }
                .map_err(read_err)?;
                let block = Array3::from_shape_vec((time_len, window.space.lat_len(), lon_range.len()), raw)
                    .map_err(|e| ProcessError::invalid_dataset(&unit_name, e.to_string()))?;
                blocks.push(block);
            }
            let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
            let mut values = concatenate(ArrayAxis(2), &views)
                .map_err(|e| ProcessError::invalid_dataset(&unit_name, e.to_string()))?;

            unpack_values(&mut values, &var);

            fields.push((
                name.clone(),
                Field {
                    values,
                    timed,
                    units: attr_string(&var, "units"),
                    long_name: attr_string(&var, "long_name"),
                },
            ));
        }

        Ok(UnitData {
            source: unit_name,
            steps,
            lat,
            lon,
            fields,
        })
    }
}

fn read_axis(file: &netcdf::File, name: &str, unit_name: &str) -> ProcessResult<Axis> {
    let var = file
        .variable(name)
        .ok_or_else(|| ProcessError::invalid_dataset(unit_name, format!("coordinate '{name}' not found")))?;
    let values = var.get_values::<f64, _>(..).map_err(|source| ProcessError::Read {
        unit: unit_name.to_string(),
        source,
    })?;
    Axis::explicit(values).map_err(|reason| ProcessError::invalid_dataset(unit_name, format!("{name}: {reason}")))
}

/// Masks fill values to NaN and applies CF `scale_factor`/`add_offset` packing.
fn unpack_values(values: &mut Array3<f64>, var: &netcdf::Variable) {
    let fill = attr_f64(var, "_FillValue").or_else(|| attr_f64(var, "missing_value"));
    let scale = attr_f64(var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(var, "add_offset").unwrap_or(0.0);
    if fill.is_none() && scale == 1.0 && offset == 0.0 {
        return;
    }
    values.mapv_inplace(|v| match fill {
        Some(f) if v == f => f64::NAN,
        _ => v * scale + offset,
    });
}

pub(crate) fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    use netcdf::AttributeValue;
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Uchar(v) => Some(v as f64),
        AttributeValue::Ushort(v) => Some(v as f64),
        AttributeValue::Uint(v) => Some(v as f64),
        AttributeValue::Longlong(v) => Some(v as f64),
        AttributeValue::Ulonglong(v) => Some(v as f64),
        other => {
            warn!("Ignoring non-numeric attribute '{}': {:?}", name, other);
            None
        }
    }
}

pub(crate) fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::from_components(start, end).unwrap()
    }

    #[test]
    fn test_expand_daily_pattern() {
        let patterns = expand_input_patterns("/data/{YEAR}/{MONTH}/sst-{YEAR}{MONTH}{DAY}.nc", &range((2022, 1, 30), (2022, 2, 1)));
        let names: Vec<&str> = patterns.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "/data/2022/01/sst-20220130.nc",
                "/data/2022/01/sst-20220131.nc",
                "/data/2022/02/sst-20220201.nc",
            ]
        );
        assert_eq!(patterns[0].date, NaiveDate::from_ymd_opt(2022, 1, 30));
    }

    #[test]
    fn test_expand_yearly_pattern_is_deduplicated() {
        let patterns = expand_input_patterns("/data/sst/{YEAR}/*/*/*.nc", &range((2021, 12, 1), (2022, 3, 1)));
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].pattern, "/data/sst/2021/*/*/*.nc");
        assert_eq!(patterns[1].pattern, "/data/sst/2022/*/*/*.nc");
        assert!(patterns.iter().all(|p| p.date.is_none()));
    }

    #[test]
    fn test_expand_plain_path() {
        let patterns = expand_input_patterns("/data/sst.nc", &range((2022, 1, 1), (2022, 1, 2)));
        assert_eq!(patterns, vec![InputPattern { pattern: "/data/sst.nc".to_string(), date: None }]);
    }

    #[test]
    fn test_unit_coverage_and_stem() {
        let unit = DatasetUnit {
            path: PathBuf::from("/data/sst-20220101.nc"),
            steps: vec![
                NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            ],
            grid: GridDescriptor::new(Axis::regular(0.0, 1.0, 2).unwrap(), Axis::regular(0.0, 1.0, 2).unwrap()),
            variables: vec!["sst".to_string()],
        };
        let (first, last) = unit.coverage();
        assert_eq!(first, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2022, 1, 3).unwrap());
        assert_eq!(unit.stem(), "sst-20220101");
    }
}
