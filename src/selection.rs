//! # Selection Window and Resampling Target
//!
//! Validated, immutable values built once from the run parameters and passed by
//! reference through every component. Nothing downstream re-validates them.

use crate::error::{ProcessError, ProcessResult};
use crate::temporal::TemporalResolution;
use chrono::NaiveDate;
use serde::Serialize;

/// Geographic bounding box in degrees
///
/// `lon_min > lon_max` denotes a box crossing the antimeridian (or the prime meridian
/// on a [0, 360] grid); latitude bounds are always ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> ProcessResult<Self> {
        for (name, value) in [
            ("lon-min", lon_min),
            ("lon-max", lon_max),
            ("lat-min", lat_min),
            ("lat-max", lat_max),
        ] {
            if !value.is_finite() {
                return Err(ProcessError::invalid_range(name, "value is not a finite number"));
            }
        }
        for (name, value) in [("lat-min", lat_min), ("lat-max", lat_max)] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(ProcessError::invalid_range(
                    name,
                    format!("{value} is outside [-90, 90]"),
                ));
            }
        }
        for (name, value) in [("lon-min", lon_min), ("lon-max", lon_max)] {
            if !(-180.0..=360.0).contains(&value) {
                return Err(ProcessError::invalid_range(
                    name,
                    format!("{value} is outside [-180, 180] and [0, 360]"),
                ));
            }
        }
        if lat_min > lat_max {
            return Err(ProcessError::invalid_range(
                "lat-min",
                format!("lat-min {lat_min} is greater than lat-max {lat_max}"),
            ));
        }
        if lon_max - lon_min > 360.0 {
            return Err(ProcessError::invalid_range(
                "lon-max",
                format!("box {lon_min}..{lon_max} spans more than 360 degrees"),
            ));
        }
        Ok(BoundingBox {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        })
    }

    /// The whole globe
    pub fn global() -> Self {
        BoundingBox {
            lon_min: -180.0,
            lon_max: 180.0,
            lat_min: -90.0,
            lat_max: 90.0,
        }
    }

    pub fn covers_all_longitudes(&self) -> bool {
        self.lon_max - self.lon_min >= 360.0
    }
}

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ProcessResult<Self> {
        if end < start {
            return Err(ProcessError::invalid_range(
                "end-date",
                format!("end date {end} is before start date {start}"),
            ));
        }
        Ok(DateRange { start, end })
    }

    /// Builds a range from year/month/day components, rejecting impossible dates.
    pub fn from_components(start: (i32, u32, u32), end: (i32, u32, u32)) -> ProcessResult<Self> {
        let start = calendar_date("start-date", start)?;
        let end = calendar_date("end-date", end)?;
        DateRange::new(start, end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `[first, last]` shares at least one day with this range.
    pub fn intersects(&self, first: NaiveDate, last: NaiveDate) -> bool {
        first <= self.end && last >= self.start
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

fn calendar_date(parameter: &str, (year, month, day): (i32, u32, u32)) -> ProcessResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ProcessError::invalid_range(
            parameter,
            format!("{year:04}-{month:02}-{day:02} is not a valid calendar date"),
        )
    })
}

/// Validated filter parameters for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionWindow {
    pub bbox: BoundingBox,
    pub dates: DateRange,
    pub variables: Vec<String>,
}

impl SelectionWindow {
    pub fn new(bbox: BoundingBox, dates: DateRange, variables: Vec<String>) -> ProcessResult<Self> {
        let mut names: Vec<String> = Vec::new();
        for name in variables.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        if names.is_empty() {
            return Err(ProcessError::invalid_parameter(
                "variables",
                "at least one variable name is required",
            ));
        }
        Ok(SelectionWindow {
            bbox,
            dates,
            variables: names,
        })
    }
}

/// Target resolutions of a regridding run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResamplingTarget {
    /// Target cell size in degrees, on both axes
    pub spatial: Option<f64>,
    pub temporal: Option<TemporalResolution>,
    /// Reduce every step to its area mean over the box instead of writing grids
    pub time_series: bool,
}

impl ResamplingTarget {
    pub fn new(spatial: Option<f64>, temporal: Option<TemporalResolution>) -> ProcessResult<Self> {
        if let Some(step) = spatial
            && (!step.is_finite() || step <= 0.0)
        {
            return Err(ProcessError::invalid_parameter(
                "spatial-resolution",
                format!("{step} is not a positive number of degrees"),
            ));
        }
        if spatial.is_none() && temporal.is_none() {
            return Err(ProcessError::invalid_parameter(
                "temporal-resolution",
                "regridding needs a spatial and/or a temporal resolution",
            ));
        }
        Ok(ResamplingTarget {
            spatial,
            temporal,
            time_series: false,
        })
    }

    /// Area-mean series, one row per step or per `temporal` bucket.
    pub fn time_series(temporal: Option<TemporalResolution>) -> Self {
        ResamplingTarget {
            spatial: None,
            temporal,
            time_series: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_validation() {
        assert!(BoundingBox::new(-10.0, 10.0, -5.0, 5.0).is_ok());
        // antimeridian crossing is not an ordering error
        assert!(BoundingBox::new(170.0, -170.0, -5.0, 5.0).is_ok());

        let err = BoundingBox::new(-10.0, 10.0, 5.0, -5.0).unwrap_err();
        assert_eq!(err.kind(), "InvalidRangeError");
        assert_eq!(err.subject().as_deref(), Some("lat-min"));

        assert!(BoundingBox::new(-10.0, 10.0, -95.0, 5.0).is_err());
        assert!(BoundingBox::new(-190.0, 10.0, -5.0, 5.0).is_err());
        assert!(BoundingBox::new(-180.0, 360.0, -5.0, 5.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 10.0, -5.0, 5.0).is_err());
    }

    #[test]
    fn test_date_range_validation() {
        let range = DateRange::from_components((2022, 1, 1), (2022, 12, 31)).unwrap();
        assert_eq!(range.days().count(), 365);

        let err = DateRange::from_components((2022, 2, 1), (2022, 1, 31)).unwrap_err();
        assert_eq!(err.kind(), "InvalidRangeError");

        let err = DateRange::from_components((2022, 2, 30), (2022, 3, 1)).unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("start-date"));
    }

    #[test]
    fn test_date_range_intersection() {
        let range = DateRange::from_components((2022, 3, 1), (2022, 3, 31)).unwrap();
        let d = |m, d| NaiveDate::from_ymd_opt(2022, m, d).unwrap();
        assert!(range.intersects(d(2, 1), d(3, 1)));
        assert!(range.intersects(d(3, 31), d(4, 30)));
        assert!(!range.intersects(d(2, 1), d(2, 28)));
        assert!(!range.intersects(d(4, 1), d(4, 1)));
    }

    #[test]
    fn test_selection_window_variables() {
        let window = SelectionWindow::new(
            BoundingBox::global(),
            DateRange::from_components((2022, 1, 1), (2022, 1, 2)).unwrap(),
            vec![" sst ".to_string(), "ice".to_string(), "sst".to_string()],
        )
        .unwrap();
        assert_eq!(window.variables, vec!["sst", "ice"]);

        let err = SelectionWindow::new(
            BoundingBox::global(),
            DateRange::from_components((2022, 1, 1), (2022, 1, 2)).unwrap(),
            vec![" ".to_string()],
        )
        .unwrap_err();
        assert_eq!(err.subject().as_deref(), Some("variables"));
    }

    #[test]
    fn test_resampling_target_validation() {
        assert!(ResamplingTarget::new(Some(0.25), None).is_ok());
        assert!(ResamplingTarget::new(None, Some(TemporalResolution::Monthly)).is_ok());
        assert!(ResamplingTarget::new(Some(0.0), None).is_err());
        assert!(ResamplingTarget::new(Some(-1.0), None).is_err());
        assert!(ResamplingTarget::new(None, None).is_err());

        let series = ResamplingTarget::time_series(None);
        assert!(series.time_series);
        assert_eq!(series.spatial, None);
    }
}
