//! # gridslice
//!
//! Subsetting and regridding of gridded geophysical datasets stored as collections of
//! NetCDF files.
//!
//! ## Features
//!
//! - **Selection**: bounding boxes (antimeridian crossing included), inclusive date
//!   ranges and variable lists, resolved into index windows before any data is read
//! - **Resampling**: area-weighted coarsening, bilinear refinement and NaN-skipping
//!   temporal means over daily, pentad, dekad, N-day, monthly and yearly buckets
//! - **Output**: NetCDF4, CSV, Parquet or GeoTIFF units named from a template, or one
//!   area-mean CSV time series, written atomically to a local directory or to S3
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridslice::{input::{JobConfig, Operation}, run_job};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let job = JobConfig::from_file("job.yaml")?.into_job(Operation::Regrid)?;
//!     let summary = run_job(&job, false).await?;
//!     println!("{} output units", summary.outputs.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod extract;
pub mod filters;
pub mod grid;
pub mod info;
pub mod input;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod resample;
pub mod selection;
pub mod storage;
pub mod temporal;
pub mod variables;

#[cfg(test)]
mod cli_tests;

use crate::error::ProcessResult;
use crate::extract::NetCdfReader;
use crate::input::Job;
use crate::output::FileWriter;
use crate::pipeline::RunSummary;

/// Runs a validated job against NetCDF input and the storage named by its output path.
///
/// # Errors
///
/// Fails on the first error of the run: an invalid or empty selection, an unknown
/// variable, an unsupported resampling, an output name collision, or any read or
/// write failure. Output units written before the failure stay in place.
pub async fn run_job(job: &Job, show_progress: bool) -> ProcessResult<RunSummary> {
    let reader = NetCdfReader::new(job.dims.clone());
    let writer = FileWriter::new(&job.out_path, job.dims.clone()).await?;
    pipeline::run(job, &reader, &writer, show_progress).await
}
