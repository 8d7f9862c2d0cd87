//! # Input Inspection
//!
//! Describes the dataset units behind an input location: their dates, grids and
//! variables. Backs the `info` subcommand.

use crate::extract::{DatasetReader, DatasetUnit, NetCdfReader, attr_string};
use crate::grid::{Axis, LonConvention};
use crate::selection::DateRange;
use crate::temporal::select_units;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisInfo {
    pub length: usize,
    pub first: f64,
    pub last: f64,
    pub resolution: Option<f64>,
}

impl From<&Axis> for AxisInfo {
    fn from(axis: &Axis) -> Self {
        AxisInfo {
            length: axis.len(),
            first: axis.first(),
            last: axis.last(),
            resolution: axis.resolution(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    pub units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitInfo {
    pub path: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub steps: usize,
    pub lat: AxisInfo,
    pub lon: AxisInfo,
    pub lon_convention: LonConvention,
    pub variables: Vec<String>,
    /// Filled in detailed mode
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub variable_details: Vec<VariableInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    pub in_path: String,
    pub total_units: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub units: Vec<UnitInfo>,
}

fn unit_info(unit: &DatasetUnit, reader: &NetCdfReader, detailed: bool) -> Result<UnitInfo> {
    let (first_date, last_date) = unit.coverage();
    let mut variable_details = Vec::new();
    if detailed {
        debug!("Opening {} for variable details", unit.name());
        let file = netcdf::open(&unit.path).with_context(|| format!("Failed to open NetCDF file: {}", unit.name()))?;
        for var in file.variables() {
            if reader.dims.is_coordinate(&var.name()) {
                continue;
            }
            variable_details.push(VariableInfo {
                name: var.name().to_string(),
                dimensions: var.dimensions().iter().map(|d| d.name().to_string()).collect(),
                units: attr_string(&var, "units"),
            });
        }
    }
    Ok(UnitInfo {
        path: unit.name(),
        first_date,
        last_date,
        steps: unit.steps.len(),
        lat: AxisInfo::from(&unit.grid.lat),
        lon: AxisInfo::from(&unit.grid.lon),
        lon_convention: unit.grid.lon_convention(),
        variables: unit.variables.clone(),
        variable_details,
    })
}

/// Discovers and describes the units behind `in_path`.
///
/// Without `dates` every matching unit is listed; dated locations need a range to
/// expand their placeholders.
pub fn get_input_info(
    reader: &NetCdfReader,
    in_path: &str,
    dates: Option<&DateRange>,
    detailed: bool,
) -> Result<InputInfo> {
    let units: Vec<DatasetUnit> = match dates {
        Some(range) => {
            let units = reader
                .discover(in_path, range)
                .with_context(|| format!("Failed to discover dataset units in {in_path}"))?;
            select_units(&units, range).into_iter().cloned().collect()
        }
        None => {
            if ["{YEAR}", "{MONTH}", "{DAY}"].iter().any(|p| in_path.contains(p)) {
                bail!("'{in_path}' contains date placeholders; give --start-date and --end-date");
            }
            let everything = DateRange::new(NaiveDate::MIN, NaiveDate::MAX)?;
            reader
                .discover(in_path, &everything)
                .with_context(|| format!("Failed to discover dataset units in {in_path}"))?
        }
    };
    let infos = units
        .iter()
        .map(|unit| unit_info(unit, reader, detailed))
        .collect::<Result<Vec<_>>>()?;
    Ok(InputInfo {
        in_path: in_path.to_string(),
        total_units: infos.len(),
        first_date: infos.iter().map(|u| u.first_date).min(),
        last_date: infos.iter().map(|u| u.last_date).max(),
        units: infos,
    })
}

fn describe_axis(axis: &AxisInfo) -> String {
    match axis.resolution {
        Some(res) => format!("{} cells, {} .. {} (step {:.4})", axis.length, axis.first, axis.last, res),
        None => format!("1 cell at {}", axis.first),
    }
}

pub fn print_input_info_human(info: &InputInfo) {
    println!("Input: {}", info.in_path);
    println!("  Dataset units: {}", info.total_units);
    if let (Some(first), Some(last)) = (info.first_date, info.last_date) {
        println!("  Coverage: {first} .. {last}");
    }
    for unit in &info.units {
        println!("  {}", unit.path);
        println!("    Dates: {} .. {} ({} steps)", unit.first_date, unit.last_date, unit.steps);
        println!("    Latitude: {}", describe_axis(&unit.lat));
        println!("    Longitude: {} [{:?}]", describe_axis(&unit.lon), unit.lon_convention);
        println!("    Variables: {}", unit.variables.join(", "));
        for var in &unit.variable_details {
            println!(
                "      {} [{}]{}",
                var.name,
                var.dimensions.join(", "),
                var.units.as_deref().map(|u| format!(" ({u})")).unwrap_or_default()
            );
        }
    }
}

pub fn print_input_info_json(info: &InputInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

pub fn print_input_info_yaml(info: &InputInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize input info to YAML")?;
    println!("{yaml}");
    Ok(())
}

/// One row per dataset unit
pub fn input_info_csv(info: &InputInfo) -> String {
    let mut out = String::from("path,first_date,last_date,steps,lat_cells,lon_cells,variables\n");
    for unit in &info.units {
        out.push_str(&format!(
            "\"{}\",{},{},{},{},{},\"{}\"\n",
            unit.path,
            unit.first_date,
            unit.last_date,
            unit.steps,
            unit.lat.length,
            unit.lon.length,
            unit.variables.join(";")
        ));
    }
    out
}
