//! # Grid Descriptors
//!
//! Spatial grid metadata of a dataset unit: one [`Axis`] for latitude and one for
//! longitude. Axes are validated on construction so every other component can rely on
//! them being non-empty and strictly monotonic.

use serde::{Deserialize, Serialize};

/// One coordinate axis of a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Axis {
    /// Explicit coordinate values, strictly ascending or strictly descending
    Explicit { values: Vec<f64> },
    /// `count` values starting at `origin`, `step` apart (step may be negative)
    Regular { origin: f64, step: f64, count: usize },
}

impl Axis {
    /// Builds an explicit axis, checking that it is non-empty and monotonic.
    pub fn explicit(values: Vec<f64>) -> Result<Self, String> {
        if values.is_empty() {
            return Err("coordinate axis is empty".to_string());
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err("coordinate axis contains non-finite values".to_string());
        }
        if values.len() > 1 {
            let ascending = values.windows(2).all(|w| w[1] > w[0]);
            let descending = values.windows(2).all(|w| w[1] < w[0]);
            if !ascending && !descending {
                return Err("coordinate axis is not monotonic".to_string());
            }
        }
        Ok(Axis::Explicit { values })
    }

    pub fn regular(origin: f64, step: f64, count: usize) -> Result<Self, String> {
        if count == 0 {
            return Err("coordinate axis is empty".to_string());
        }
        if !origin.is_finite() || !step.is_finite() || (count > 1 && step == 0.0) {
            return Err(format!("invalid regular axis: origin {origin}, step {step}"));
        }
        Ok(Axis::Regular { origin, step, count })
    }

    pub fn len(&self) -> usize {
        match self {
            Axis::Explicit { values } => values.len(),
            Axis::Regular { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self, index: usize) -> f64 {
        match self {
            Axis::Explicit { values } => values[index],
            Axis::Regular { origin, step, .. } => origin + step * index as f64,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }

    pub fn first(&self) -> f64 {
        self.value(0)
    }

    pub fn last(&self) -> f64 {
        self.value(self.len() - 1)
    }

    pub fn is_ascending(&self) -> bool {
        self.len() < 2 || self.last() > self.first()
    }

    pub fn min(&self) -> f64 {
        self.first().min(self.last())
    }

    pub fn max(&self) -> f64 {
        self.first().max(self.last())
    }

    /// Mean spacing between neighbouring coordinates; `None` for single-value axes.
    pub fn resolution(&self) -> Option<f64> {
        if self.len() < 2 {
            return None;
        }
        Some((self.last() - self.first()).abs() / (self.len() - 1) as f64)
    }
}

/// Longitude convention of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LonConvention {
    /// Longitudes in [-180, 180]
    Signed,
    /// Longitudes in [0, 360]
    Positive,
}

impl LonConvention {
    /// Maps a longitude given in either convention into this one.
    pub fn normalize(self, lon: f64) -> f64 {
        match self {
            LonConvention::Signed if lon > 180.0 => lon - 360.0,
            LonConvention::Positive if lon < 0.0 => lon + 360.0,
            _ => lon,
        }
    }
}

/// Spatial grid of a dataset unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub lat: Axis,
    pub lon: Axis,
}

impl GridDescriptor {
    pub fn new(lat: Axis, lon: Axis) -> Self {
        GridDescriptor { lat, lon }
    }

    /// Grids with any longitude above 180 degrees use the [0, 360] convention.
    pub fn lon_convention(&self) -> LonConvention {
        if self.lon.max() > 180.0 {
            LonConvention::Positive
        } else {
            LonConvention::Signed
        }
    }

    /// (lat, lon) cell counts
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }
}
