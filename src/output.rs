//! # Output Planning and Writing
//!
//! Turns processed unit data into named [`OutputUnit`]s and persists them.
//!
//! ## Naming
//!
//! Output names come from a [`NamePattern`] bound to the unit's temporal identity:
//!
//! | placeholder | value |
//! |---|---|
//! | `{Y}` `{y}` `{m}` `{d}` | 4-digit year, 2-digit year, month, day |
//! | `{H}` `{M}` `{S}` | `12`, `00`, `00` (products are stamped at noon) |
//! | `{YEAR}` `{MONTH}` `{DAY}` | same as `{Y}`, `{m}`, `{d}` |
//! | `{VARIABLES}` | requested variables joined with `-` |
//! | `{FILENAME}` | stem of the input file (subsetting only) |
//!
//! ## Formats
//!
//! - **netcdf4**: CF-style NetCDF-4 file with `time`, `lat`, `lon` coordinates
//! - **csv**: long table with `date`, `lat`, `lon` and one column per variable
//! - **parquet**: same table as CSV
//! - **geotiff**: one north-up EPSG:4326 raster per variable, named
//!   `<name>-<variable>.tif`, with one page per time step
//!
//! Area-mean time series ([`SeriesTable`]) are always CSV with `year`, `month`, `day`
//! and one column per variable.

use crate::error::{ProcessError, ProcessResult};
use crate::extract::{Field, UnitData};
use crate::input::DimensionNames;
use crate::storage::{Storage, StorageBackend, StorageFactory};
use crate::temporal::TemporalBucket;
use chrono::{Datelike, NaiveDate};
use log::{debug, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

/// Name pattern used when none is given
pub const DEFAULT_NAME_PATTERN: &str = "{Y}{m}{d}{H}{M}{S}-EOCIS-LEVEL-PRODUCT-vVERSION-fv01.0";

/// Serialization of an output unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "netcdf")]
    Netcdf4,
    Csv,
    Parquet,
    #[serde(alias = "tif", alias = "tiff")]
    Geotiff,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Netcdf4 => ".nc",
            OutputFormat::Csv => ".csv",
            OutputFormat::Parquet => ".parquet",
            OutputFormat::Geotiff => ".tif",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "netcdf4" | "netcdf" | "nc" => Ok(OutputFormat::Netcdf4),
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            "geotiff" | "tif" | "tiff" => Ok(OutputFormat::Geotiff),
            other => Err(ProcessError::invalid_parameter(
                "output-format",
                format!("'{other}' is not one of netcdf4, csv, parquet, geotiff"),
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Netcdf4 => "netcdf4",
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
            OutputFormat::Geotiff => "geotiff",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Placeholder(String),
}

const PLACEHOLDERS: [&str; 12] = [
    "Y", "y", "m", "d", "H", "M", "S", "YEAR", "MONTH", "DAY", "VARIABLES", "FILENAME",
];

/// Validated output name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    tokens: Vec<Token>,
}

impl NamePattern {
    /// Parses `template`; `{FILENAME}` is only accepted when `allow_filename` is set.
    pub fn new(template: &str, allow_filename: bool) -> ProcessResult<Self> {
        let invalid = |reason: String| ProcessError::invalid_parameter("output-name-pattern", reason);
        if template.trim().is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }

        let mut tokens = Vec::new();
        let mut rest = template;
        while let Some(open) = rest.find(['{', '}']) {
            if rest[open..].starts_with('}') {
                return Err(invalid(format!("unmatched '}}' in '{template}'")));
            }
            let Some(close) = rest[open..].find('}') else {
                return Err(invalid(format!("unclosed '{{' in '{template}'")));
            };
            if open > 0 {
                tokens.push(Token::Literal(rest[..open].to_string()));
            }
            let name = &rest[open + 1..open + close];
            if !PLACEHOLDERS.contains(&name) {
                return Err(invalid(format!("unknown placeholder '{{{name}}}'")));
            }
            if name == "FILENAME" && !allow_filename {
                return Err(invalid("'{FILENAME}' is only available when subsetting".to_string()));
            }
            tokens.push(Token::Placeholder(name.to_string()));
            rest = &rest[open + close + 1..];
        }
        if !rest.is_empty() {
            tokens.push(Token::Literal(rest.to_string()));
        }
        Ok(NamePattern { tokens })
    }

    /// Output name for a unit dated `date`, with the format extension appended.
    pub fn bind(&self, date: NaiveDate, variables: &[String], filename: Option<&str>, format: OutputFormat) -> String {
        let mut name = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(text) => name.push_str(text),
                Token::Placeholder(key) => {
                    let value = match key.as_str() {
                        "Y" | "YEAR" => date.format("%Y").to_string(),
                        "y" => date.format("%y").to_string(),
                        "m" | "MONTH" => date.format("%m").to_string(),
                        "d" | "DAY" => date.format("%d").to_string(),
                        "H" => "12".to_string(),
                        "M" | "S" => "00".to_string(),
                        "VARIABLES" => variables.join("-"),
                        _ => filename.unwrap_or_default().to_string(),
                    };
                    name.push_str(&value);
                }
            }
        }
        if !name.ends_with(format.extension()) {
            name.push_str(format.extension());
        }
        name
    }
}

/// A named product handed to the writer
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    pub name: String,
    pub format: OutputFormat,
    pub steps: Vec<NaiveDate>,
    /// Aggregation period of each step, for temporally resampled output
    pub bounds: Option<Vec<TemporalBucket>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub fields: Vec<(String, Field)>,
    pub history: Option<String>,
}

impl OutputUnit {
    pub fn from_data(name: String, format: OutputFormat, data: UnitData, bounds: Option<Vec<TemporalBucket>>) -> Self {
        OutputUnit {
            name,
            format,
            steps: data.steps,
            bounds,
            lat: data.lat,
            lon: data.lon,
            fields: data.fields,
            history: None,
        }
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = Some(history.into());
        self
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Files the unit is written as: one per variable for GeoTIFF, the unit name otherwise.
    pub fn file_names(&self) -> Vec<String> {
        match self.format {
            OutputFormat::Geotiff => {
                let stem = self.name.strip_suffix(self.format.extension()).unwrap_or(&self.name);
                self.fields
                    .iter()
                    .map(|(variable, _)| format!("{stem}-{variable}{}", self.format.extension()))
                    .collect()
            }
            _ => vec![self.name.clone()],
        }
    }
}

/// Area means of the requested variables, one row per date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    pub name: String,
    pub variables: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl SeriesTable {
    pub fn new(variables: Vec<String>) -> Self {
        SeriesTable {
            name: String::new(),
            variables,
            rows: BTreeMap::new(),
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Records `means` on the row of `date`. Units sharing a date fill in each other's
    /// variables; the same variable twice on one date is a collision.
    pub fn add_row(&mut self, date: NaiveDate, means: Vec<(String, f64)>) -> ProcessResult<()> {
        let width = self.variables.len();
        let row = self.rows.entry(date).or_insert_with(|| vec![None; width]);
        for (name, mean) in means {
            let Some(column) = self.variables.iter().position(|v| *v == name) else {
                continue;
            };
            if row[column].is_some() {
                return Err(ProcessError::OutputNameCollision {
                    name: date.to_string(),
                    reason: format!("variable '{name}' has two area means on this date"),
                });
            }
            row[column] = Some(mean);
        }
        Ok(())
    }

    /// `year`, `month`, `day` and one column per variable; missing means are NaN.
    pub fn to_dataframe(&self) -> ProcessResult<DataFrame> {
        let years: Vec<i32> = self.rows.keys().map(|d| d.year()).collect();
        let months: Vec<u32> = self.rows.keys().map(|d| d.month()).collect();
        let days: Vec<u32> = self.rows.keys().map(|d| d.day()).collect();
        let mut columns: Vec<Column> = vec![
            Series::new("year".into(), years).into(),
            Series::new("month".into(), months).into(),
            Series::new("day".into(), days).into(),
        ];
        for (index, name) in self.variables.iter().enumerate() {
            let values: Vec<f64> = self
                .rows
                .values()
                .map(|row| row[index].unwrap_or(f64::NAN))
                .collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn encode(&self) -> ProcessResult<Vec<u8>> {
        let mut df = self.to_dataframe()?;
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer).finish(&mut df)?;
        Ok(buffer)
    }
}

/// Assigns names to output units and holds back the latest one so a following unit
/// with the same name can be merged into it.
#[derive(Debug)]
pub struct OutputPlanner {
    pattern: NamePattern,
    format: OutputFormat,
    variables: Vec<String>,
    pending: Option<OutputUnit>,
    written: HashSet<String>,
}

impl OutputPlanner {
    pub fn new(pattern: NamePattern, format: OutputFormat, variables: Vec<String>) -> Self {
        OutputPlanner {
            pattern,
            format,
            variables,
            pending: None,
            written: HashSet::new(),
        }
    }

    pub fn name_for(&self, date: NaiveDate, filename: Option<&str>) -> String {
        self.pattern.bind(date, &self.variables, filename, self.format)
    }

    /// Plans `unit`. Returns the previously pending unit once it can no longer change.
    pub fn plan(&mut self, unit: OutputUnit) -> ProcessResult<Option<OutputUnit>> {
        if self.written.contains(&unit.name) {
            return Err(ProcessError::OutputNameCollision {
                name: unit.name,
                reason: "an output with this name was already written".to_string(),
            });
        }

        match self.pending.take() {
            Some(mut pending) if pending.name == unit.name => {
                merge_into(&mut pending, unit)?;
                self.pending = Some(pending);
                Ok(None)
            }
            Some(pending) => {
                self.written.insert(pending.name.clone());
                self.pending = Some(unit);
                Ok(Some(pending))
            }
            None => {
                self.pending = Some(unit);
                Ok(None)
            }
        }
    }

    /// Releases the last pending unit.
    pub fn finish(&mut self) -> Option<OutputUnit> {
        let pending = self.pending.take()?;
        self.written.insert(pending.name.clone());
        Some(pending)
    }
}

/// Merges the fields of `other` into `target` when they describe the same steps and grid.
fn merge_into(target: &mut OutputUnit, other: OutputUnit) -> ProcessResult<()> {
    let collision = |reason: String| ProcessError::OutputNameCollision {
        name: target.name.clone(),
        reason,
    };
    if let Some((shared, _)) = other.fields.iter().find(|(n, _)| target.fields.iter().any(|(t, _)| t == n)) {
        return Err(collision(format!("variable '{shared}' would be written twice")));
    }
    if other.steps != target.steps || other.bounds != target.bounds {
        return Err(collision("units with different time steps share one name".to_string()));
    }
    if other.lat != target.lat || other.lon != target.lon {
        return Err(collision("units with different grids share one name".to_string()));
    }
    debug!("Merging {:?} into pending output {}", other.variable_names(), target.name);
    target.fields.extend(other.fields);
    Ok(())
}

/// Capability that persists an output unit in the unit's format
#[async_trait::async_trait]
pub trait DatasetWriter: Send + Sync {
    /// Writes `unit` as a whole; nothing is left behind when this fails.
    async fn write(&self, unit: OutputUnit) -> ProcessResult<()>;

    /// Writes a finished area-mean series under its name.
    async fn write_series(&self, series: SeriesTable) -> ProcessResult<()>;
}

/// Writer serializing units into files under an output directory (local or S3)
#[derive(Debug)]
pub struct FileWriter {
    out_path: String,
    dims: DimensionNames,
    storage: Storage,
}

impl FileWriter {
    pub async fn new(out_path: &str, dims: DimensionNames) -> ProcessResult<Self> {
        let storage = StorageFactory::from_path(out_path).await?;
        Ok(FileWriter {
            out_path: out_path.to_string(),
            dims,
            storage,
        })
    }

    pub fn target_path(&self, name: &str) -> String {
        StorageFactory::join(&self.out_path, name)
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> ProcessResult<()> {
        let path = self.target_path(name);
        match self.storage.exists(&path).await {
            Ok(true) => warn!("Replacing existing output {}", path),
            Ok(false) => {}
            Err(e) => debug!("Cannot tell whether {} exists: {}", path, e),
        }
        self.storage.write(&path, bytes).await.map_err(|e| ProcessError::Write {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        info!("Wrote {} ({} bytes)", path, bytes.len());
        Ok(())
    }
}

#[async_trait::async_trait]
impl DatasetWriter for FileWriter {
    async fn write(&self, unit: OutputUnit) -> ProcessResult<()> {
        // encode every file first so a failing variable leaves nothing behind
        let files = encode(&unit, &self.dims)?;
        for (name, bytes) in &files {
            self.put(name, bytes).await?;
        }
        Ok(())
    }

    async fn write_series(&self, series: SeriesTable) -> ProcessResult<()> {
        let bytes = series.encode()?;
        debug!("Time series {} has {} rows", series.name, series.len());
        self.put(&series.name, &bytes).await
    }
}

/// Serializes `unit` in its format, as `(file name, bytes)` pairs.
pub fn encode(unit: &OutputUnit, dims: &DimensionNames) -> ProcessResult<Vec<(String, Vec<u8>)>> {
    let bytes = match unit.format {
        OutputFormat::Netcdf4 => encode_netcdf(unit, dims)?,
        OutputFormat::Csv => {
            let mut df = to_dataframe(unit, dims)?;
            let mut buffer = Vec::new();
            CsvWriter::new(&mut buffer).finish(&mut df)?;
            buffer
        }
        OutputFormat::Parquet => {
            let mut df = to_dataframe(unit, dims)?;
            debug!("DataFrame shape: {:?}", df.shape());
            let mut buffer = Vec::new();
            ParquetWriter::new(&mut buffer).finish(&mut df)?;
            buffer
        }
        OutputFormat::Geotiff => {
            return unit
                .file_names()
                .into_iter()
                .zip(&unit.fields)
                .map(|(name, (_, field))| Ok((name, encode_geotiff(unit, field)?)))
                .collect();
        }
    };
    Ok(vec![(unit.name.clone(), bytes)])
}

/// Long table with one row per (step, lat, lon) cell.
pub fn to_dataframe(unit: &OutputUnit, dims: &DimensionNames) -> ProcessResult<DataFrame> {
    let (nt, ny, nx) = (unit.steps.len(), unit.lat.len(), unit.lon.len());
    let rows = nt * ny * nx;

    let mut dates = Vec::with_capacity(rows);
    let mut lats = Vec::with_capacity(rows);
    let mut lons = Vec::with_capacity(rows);
    for step in &unit.steps {
        for lat in &unit.lat {
            for lon in &unit.lon {
                dates.push(step.format("%Y-%m-%d").to_string());
                lats.push(*lat);
                lons.push(*lon);
            }
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("date".into(), dates).into(),
        Series::new(dims.lat.as_str().into(), lats).into(),
        Series::new(dims.lon.as_str().into(), lons).into(),
    ];
    for (name, field) in &unit.fields {
        let values: Vec<f64> = if field.timed {
            field.values.iter().copied().collect()
        } else {
            (0..nt).flat_map(|_| field.values.iter().copied()).collect()
        };
        if values.len() != rows {
            return Err(ProcessError::Write {
                name: unit.name.clone(),
                reason: format!("variable '{name}' has {} values for {rows} cells", values.len()),
            });
        }
        columns.push(Series::new(name.as_str().into(), values).into());
    }
    Ok(DataFrame::new(columns)?)
}

/// GeoKeyDirectory of a WGS 84 raster: version 1.1.0 with three keys, geographic model
/// type, pixel-is-area raster type and geographic CRS EPSG:4326.
const GEO_KEY_DIRECTORY: [u16; 16] = [1, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326];

/// GDAL_NODATA, an ASCII tag read by GDAL-based tools
const GDAL_NODATA_TAG: u16 = 42113;

/// Relative tolerance on the spacing of a regular axis
const SPACING_TOLERANCE: f64 = 1e-6;

/// Signed spacing of an evenly spaced axis with at least two values.
fn regular_spacing(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let step = (values[values.len() - 1] - values[0]) / (values.len() - 1) as f64;
    let even = step != 0.0
        && values
            .windows(2)
            .all(|w| ((w[1] - w[0]) - step).abs() <= SPACING_TOLERANCE * step.abs());
    even.then_some(step)
}

/// Longitudes with the antimeridian jump removed, so wrapped selections read as one run.
fn unwrap_longitudes(lon: &[f64]) -> Vec<f64> {
    let mut offset = 0.0;
    let mut unwrapped: Vec<f64> = Vec::with_capacity(lon.len());
    for &value in lon {
        if let Some(&previous) = unwrapped.last()
            && value + offset < previous - 180.0
        {
            offset += 360.0;
        }
        unwrapped.push(value + offset);
    }
    unwrapped
}

/// One north-up raster of `field`, a page per time step.
fn encode_geotiff(unit: &OutputUnit, field: &Field) -> ProcessResult<Vec<u8>> {
    let lon = unwrap_longitudes(&unit.lon);
    let (dx, dy) = match (regular_spacing(&lon), regular_spacing(&unit.lat)) {
        (Some(dx), Some(dy)) => (dx, dy),
        (Some(dx), None) if unit.lat.len() == 1 => (dx, dx.abs()),
        (None, Some(dy)) if lon.len() == 1 => (dy.abs(), dy),
        _ => {
            return Err(ProcessError::Write {
                name: unit.name.clone(),
                reason: "GeoTIFF output needs an evenly spaced grid with two cells on one axis".to_string(),
            });
        }
    };
    let (ny, nx) = (unit.lat.len(), lon.len());
    let (lat_ascending, lon_ascending) = (dy > 0.0, dx > 0.0);
    let (dx, dy) = (dx.abs(), dy.abs());
    let west = lon.iter().copied().fold(f64::INFINITY, f64::min) - dx / 2.0;
    let north = unit.lat.iter().copied().fold(f64::NEG_INFINITY, f64::max) + dy / 2.0;

    let mut buffer = Cursor::new(Vec::new());
    let mut tiff = TiffEncoder::new(&mut buffer)?;
    for page in field.values.outer_iter() {
        let mut raster = Vec::with_capacity(ny * nx);
        for row in 0..ny {
            let j = if lat_ascending { ny - 1 - row } else { row };
            for col in 0..nx {
                let i = if lon_ascending { col } else { nx - 1 - col };
                raster.push(page[[j, i]]);
            }
        }
        let mut image = tiff.new_image::<colortype::Gray64Float>(nx as u32, ny as u32)?;
        image.encoder().write_tag(Tag::ModelPixelScaleTag, &[dx, dy, 0.0][..])?;
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, west, north, 0.0][..])?;
        image.encoder().write_tag(Tag::GeoKeyDirectoryTag, &GEO_KEY_DIRECTORY[..])?;
        image.encoder().write_tag(Tag::Unknown(GDAL_NODATA_TAG), "nan")?;
        image.write_data(&raster)?;
    }
    drop(tiff);
    Ok(buffer.into_inner())
}

fn days_since_epoch(date: NaiveDate) -> f64 {
    (date - NaiveDate::default()).num_days() as f64
}

fn encode_netcdf(unit: &OutputUnit, dims: &DimensionNames) -> ProcessResult<Vec<u8>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("unit.nc");
    {
        let mut file = netcdf::create(&path)?;
        file.add_attribute("Conventions", "CF-1.8")?;
        if let Some(history) = &unit.history {
            file.add_attribute("history", history.as_str())?;
        }

        file.add_dimension(&dims.time, unit.steps.len())?;
        file.add_dimension(&dims.lat, unit.lat.len())?;
        file.add_dimension(&dims.lon, unit.lon.len())?;

        let times: Vec<f64> = unit.steps.iter().map(|d| days_since_epoch(*d)).collect();
        {
            let mut time_var = file.add_variable::<f64>(&dims.time, &[dims.time.as_str()])?;
            time_var.put_attribute("standard_name", "time")?;
            time_var.put_attribute("units", "days since 1970-01-01 00:00:00")?;
            time_var.put_attribute("calendar", "standard")?;
            if unit.bounds.is_some() {
                time_var.put_attribute("bounds", "time_bnds")?;
            }
            time_var.put_values(&times, netcdf::Extents::All)?;
        }

        if let Some(bounds) = &unit.bounds {
            file.add_dimension("nv", 2)?;
            // CF bounds: inclusive start, exclusive end
            let values: Vec<f64> = bounds
                .iter()
                .flat_map(|b| [days_since_epoch(b.start), days_since_epoch(b.end) + 1.0])
                .collect();
            let mut bnds_var = file.add_variable::<f64>("time_bnds", &[dims.time.as_str(), "nv"])?;
            bnds_var.put_values(&values, netcdf::Extents::All)?;
        }

        for (name, standard_name, units, values) in [
            (&dims.lat, "latitude", "degrees_north", &unit.lat),
            (&dims.lon, "longitude", "degrees_east", &unit.lon),
        ] {
            let mut var = file.add_variable::<f64>(name, &[name.as_str()])?;
            var.put_attribute("standard_name", standard_name)?;
            var.put_attribute("units", units)?;
            var.put_values(values, netcdf::Extents::All)?;
        }

        for (name, field) in &unit.fields {
            let var_dims: Vec<&str> = if field.timed {
                vec![dims.time.as_str(), dims.lat.as_str(), dims.lon.as_str()]
            } else {
                vec![dims.lat.as_str(), dims.lon.as_str()]
            };
            let mut var = file.add_variable::<f64>(name, &var_dims)?;
            var.put_attribute("_FillValue", f64::NAN)?;
            if let Some(units) = &field.units {
                var.put_attribute("units", units.as_str())?;
            }
            if let Some(long_name) = &field.long_name {
                var.put_attribute("long_name", long_name.as_str())?;
            }
            let values: Vec<f64> = field.values.iter().copied().collect();
            var.put_values(&values, netcdf::Extents::All)?;
        }
    }
    Ok(std::fs::read(&path)?)
}
