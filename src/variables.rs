//! # Variable Filter
//!
//! Intersects the requested variable names with what a dataset unit provides. The
//! coordinate variables always travel with the data, requested or not.

use crate::error::{ProcessError, ProcessResult};
use crate::extract::DatasetUnit;
use crate::input::DimensionNames;

/// Requested names present in `available`, in request order, followed by the
/// coordinate variables.
pub fn restrict(requested: &[String], available: &[String], dims: &DimensionNames) -> Vec<String> {
    let mut kept: Vec<String> = requested
        .iter()
        .filter(|name| available.contains(name) && !dims.is_coordinate(name))
        .cloned()
        .collect();
    for coordinate in [&dims.time, &dims.lat, &dims.lon] {
        if !kept.contains(coordinate) {
            kept.push(coordinate.clone());
        }
    }
    kept
}

/// Data variables of `unit` to read: [`restrict`] without the coordinates.
pub fn data_variables(requested: &[String], unit: &DatasetUnit, dims: &DimensionNames) -> Vec<String> {
    restrict(requested, &unit.variables, dims)
        .into_iter()
        .filter(|name| !dims.is_coordinate(name))
        .collect()
}

/// Requested names that no unit provides.
pub fn unknown_variables<'a, I>(requested: &[String], units: I, dims: &DimensionNames) -> Vec<String>
where
    I: IntoIterator<Item = &'a DatasetUnit> + Clone,
{
    requested
        .iter()
        .filter(|name| !dims.is_coordinate(name))
        .filter(|name| !units.clone().into_iter().any(|unit| unit.variables.contains(name)))
        .cloned()
        .collect()
}

/// Fails with [`ProcessError::UnknownVariable`] when a requested name is missing
/// from every unit.
pub fn check_variables<'a, I>(requested: &[String], units: I, dims: &DimensionNames) -> ProcessResult<()>
where
    I: IntoIterator<Item = &'a DatasetUnit> + Clone,
{
    let names = unknown_variables(requested, units, dims);
    if names.is_empty() {
        Ok(())
    } else {
        Err(ProcessError::UnknownVariable { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, GridDescriptor};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn unit(variables: &[&str]) -> DatasetUnit {
        DatasetUnit {
            path: PathBuf::from("unit.nc"),
            steps: vec![NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()],
            grid: GridDescriptor::new(Axis::regular(0.0, 1.0, 2).unwrap(), Axis::regular(0.0, 1.0, 2).unwrap()),
            variables: names(variables),
        }
    }

    #[test]
    fn test_restrict_keeps_request_order_and_coordinates() {
        let dims = DimensionNames::default();
        let kept = restrict(&names(&["sst", "ice", "chl"]), &names(&["chl", "sst"]), &dims);
        assert_eq!(kept, names(&["sst", "chl", "time", "lat", "lon"]));
    }

    #[test]
    fn test_restrict_with_nothing_available() {
        let dims = DimensionNames::default();
        let kept = restrict(&names(&["sst"]), &[], &dims);
        assert_eq!(kept, names(&["time", "lat", "lon"]));
    }

    #[test]
    fn test_data_variables_excludes_coordinates() {
        let dims = DimensionNames::default();
        let u = unit(&["temp", "salt"]);
        assert_eq!(data_variables(&names(&["salt", "lat"]), &u, &dims), names(&["salt"]));
    }

    #[test]
    fn test_unknown_variable_detection() {
        let dims = DimensionNames::default();
        let units = [unit(&["temp"]), unit(&["temp", "salt"])];

        let err = check_variables(&names(&["temp", "unknown_var"]), units.iter(), &dims).unwrap_err();
        match err {
            ProcessError::UnknownVariable { names } => assert_eq!(names, vec!["unknown_var"]),
            other => panic!("unexpected error: {other}"),
        }

        assert!(check_variables(&names(&["temp"]), units.iter(), &dims).is_ok());
        // present in only one unit is still known
        assert!(check_variables(&names(&["salt"]), units.iter(), &dims).is_ok());
    }
}
