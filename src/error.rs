//! # Error Taxonomy
//!
//! Every failure a run can end with is a [`ProcessError`]. Validation errors are raised
//! before any I/O, run-level errors after discovery, and reader/writer errors abort the
//! run as soon as they happen.

use crate::storage::StorageError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can end a subsetting or regridding run
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid range for '{parameter}': {reason}")]
    InvalidRange { parameter: String, reason: String },

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("No dataset unit intersects the requested selection")]
    EmptyResult,

    #[error("Variables not found in any dataset unit: {}", names.join(", "))]
    UnknownVariable { names: Vec<String> },

    #[error("Unsupported resampling: {0}")]
    UnsupportedResampling(String),

    #[error("Output name collision for '{name}': {reason}")]
    OutputNameCollision { name: String, reason: String },

    #[error("More than one file matches '{pattern}'")]
    AmbiguousInput { pattern: String },

    #[error("Invalid dataset unit '{unit}': {reason}")]
    InvalidDataset { unit: String, reason: String },

    #[error("Grid mismatch while combining '{name}': {reason}")]
    GridMismatch { name: String, reason: String },

    #[error("Failed to read '{unit}': {source}")]
    Read {
        unit: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Failed to write '{name}': {reason}")]
    Write { name: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("GeoTIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for the selection and resampling engine
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Structured form of an error, printed on stderr by the binary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

impl ProcessError {
    /// Stable identifier of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessError::InvalidRange { .. } => "InvalidRangeError",
            ProcessError::InvalidParameter { .. } => "InvalidParameterError",
            ProcessError::EmptyResult => "EmptyResultError",
            ProcessError::UnknownVariable { .. } => "UnknownVariableError",
            ProcessError::UnsupportedResampling(_) => "UnsupportedResamplingError",
            ProcessError::OutputNameCollision { .. } => "OutputNameCollisionError",
            ProcessError::AmbiguousInput { .. } => "AmbiguousInputError",
            ProcessError::InvalidDataset { .. } => "InvalidDatasetError",
            ProcessError::GridMismatch { .. } => "GridMismatchError",
            ProcessError::Read { .. } => "ReadError",
            ProcessError::Write { .. } => "WriteError",
            ProcessError::Storage(_) => "StorageError",
            ProcessError::NetCdf(_) => "NetCdfError",
            ProcessError::Polars(_) => "PolarsError",
            ProcessError::Tiff(_) => "TiffError",
            ProcessError::Io(_) => "IoError",
            ProcessError::Config(_) => "ConfigError",
        }
    }

    /// The offending parameter, unit or output name, when there is one
    pub fn subject(&self) -> Option<String> {
        match self {
            ProcessError::InvalidRange { parameter, .. }
            | ProcessError::InvalidParameter { parameter, .. } => Some(parameter.clone()),
            ProcessError::UnknownVariable { names } => Some(names.join(",")),
            ProcessError::OutputNameCollision { name, .. }
            | ProcessError::GridMismatch { name, .. }
            | ProcessError::Write { name, .. } => Some(name.clone()),
            ProcessError::AmbiguousInput { pattern } => Some(pattern.clone()),
            ProcessError::InvalidDataset { unit, .. } | ProcessError::Read { unit, .. } => {
                Some(unit.clone())
            }
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            subject: self.subject(),
            message: self.to_string(),
        }
    }

    pub(crate) fn invalid_range(parameter: &str, reason: impl Into<String>) -> Self {
        ProcessError::InvalidRange {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(parameter: &str, reason: impl Into<String>) -> Self {
        ProcessError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_dataset(unit: &str, reason: impl Into<String>) -> Self {
        ProcessError::InvalidDataset {
            unit: unit.to_string(),
            reason: reason.into(),
        }
    }
}
