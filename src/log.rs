use crate::input::{Job, Operation};
use crate::pipeline::RunSummary;
use log::{debug, info};
use std::time::Duration;

pub fn show_greeting(operation: Operation, config_path: Option<&str>) {
    info!("=== gridslice {} ===", operation);
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path);
    }
}

pub fn config_echo(job: &Job) {
    let window = &job.window;
    info!("Configuration:");
    info!("  Input: {}", job.in_path);
    info!("  Output: {} ({})", job.out_path, job.format);
    info!("  Variables: {}", window.variables.join(", "));
    info!(
        "  Bounding box: lon [{}, {}] lat [{}, {}]",
        window.bbox.lon_min, window.bbox.lon_max, window.bbox.lat_min, window.bbox.lat_max
    );
    info!("  Dates: {} .. {}", window.dates.start, window.dates.end);
    if let Some(target) = &job.target {
        if let Some(step) = target.spatial {
            info!("  Spatial resolution: {}", step);
        }
        if let Some(resolution) = &target.temporal {
            info!("  Temporal resolution: {}", resolution);
        }
        if target.time_series {
            info!("  Time series: area means over the bounding box");
        }
    }
}

pub fn show_farewell(summary: &RunSummary, elapsed: Duration) {
    info!(
        "{} of {} dataset units processed, {} skipped",
        summary.units_selected - summary.units_skipped,
        summary.units_discovered,
        summary.units_skipped
    );
    if summary.buckets_omitted > 0 {
        info!("{} empty buckets omitted", summary.buckets_omitted);
    }
    if summary.peak_open_buckets > 1 {
        debug!("At most {} temporal buckets were open at once", summary.peak_open_buckets);
    }
    info!(
        "=== {} output units written in {:.2}s ===",
        summary.outputs.len(),
        elapsed.as_secs_f64()
    );
}
