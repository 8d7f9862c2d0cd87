//! # Resampling
//!
//! Spatial resampling onto a regular target grid and temporal aggregation of time
//! steps into buckets.
//!
//! Spatial resampling is separable: each axis yields, per target cell, a list of
//! `(source index, weight)` pairs, and a target value is `Σ w·v / Σ w` over the finite
//! source values of the lat × lon product of the two lists.
//!
//! | target step vs source | weights |
//! |---|---|
//! | coarser | overlap length of source and target cells |
//! | finer | linear interpolation, clamped at the edges |
//! | equal | identity |

use crate::error::{ProcessError, ProcessResult};
use crate::extract::{Field, UnitData};
use crate::grid::LonConvention;
use crate::selection::BoundingBox;
use crate::temporal::{TemporalBucket, TemporalResolution};
use chrono::NaiveDate;
use log::debug;
use ndarray::{Array2, Array3, Axis as ArrayAxis};
use std::collections::BTreeMap;

/// Relative tolerance under which two resolutions count as equal
const RESOLUTION_TOLERANCE: f64 = 1e-6;

/// Source contributions to each target cell of one axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisWeights {
    /// Target cell centres
    pub targets: Vec<f64>,
    pub weights: Vec<Vec<(usize, f64)>>,
}

impl AxisWeights {
    /// Each source cell maps onto itself.
    pub fn identity(source: &[f64]) -> Self {
        AxisWeights {
            targets: source.to_vec(),
            weights: (0..source.len()).map(|i| vec![(i, 1.0)]).collect(),
        }
    }

    /// Weights for resampling ascending `source` centres onto a `step`-sized grid
    /// covering `[lo, hi]`.
    pub fn build(source: &[f64], lo: f64, hi: f64, step: f64) -> Self {
        let source_res = mean_spacing(source);
        if let Some(res) = source_res
            && (res - step).abs() <= RESOLUTION_TOLERANCE * step
        {
            return AxisWeights::identity(source);
        }

        let edges = cell_edges(source, source_res.unwrap_or(step));
        let targets = target_centres(&edges, lo, hi, step);
        let coarser = source_res.is_none_or(|res| step > res);

        let weights = targets
            .iter()
            .map(|&centre| {
                if coarser {
                    overlap_weights(&edges, centre - step / 2.0, centre + step / 2.0)
                } else {
                    interpolation_weights(source, centre)
                }
            })
            .collect();
        AxisWeights { targets, weights }
    }

    pub fn is_identity(&self) -> bool {
        self.weights
            .iter()
            .enumerate()
            .all(|(i, w)| w.len() == 1 && w[0] == (i, 1.0))
    }
}

fn mean_spacing(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some((values[values.len() - 1] - values[0]).abs() / (values.len() - 1) as f64)
}

/// Cell edges of ascending centres: midpoints between neighbours, extrapolated at the ends.
fn cell_edges(centres: &[f64], fallback: f64) -> Vec<f64> {
    let n = centres.len();
    if n == 1 {
        return vec![centres[0] - fallback / 2.0, centres[0] + fallback / 2.0];
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
    for pair in centres.windows(2) {
        edges.push((pair[0] + pair[1]) / 2.0);
    }
    edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
    edges
}

/// Target cell centres covering `[lo, hi]` clipped to the source edge extent.
fn target_centres(edges: &[f64], lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let lo = lo.max(edges[0]);
    let hi = hi.min(edges[edges.len() - 1]).max(lo);
    let count = ((hi - lo) / step).round().max(1.0) as usize;
    (0..count).map(|i| lo + step * (i as f64 + 0.5)).collect()
}

fn overlap_weights(edges: &[f64], lo: f64, hi: f64) -> Vec<(usize, f64)> {
    edges
        .windows(2)
        .enumerate()
        .filter_map(|(i, cell)| {
            let overlap = hi.min(cell[1]) - lo.max(cell[0]);
            (overlap > 0.0).then_some((i, overlap))
        })
        .collect()
}

fn interpolation_weights(source: &[f64], position: f64) -> Vec<(usize, f64)> {
    let last = source.len() - 1;
    if position <= source[0] {
        return vec![(0, 1.0)];
    }
    if position >= source[last] {
        return vec![(last, 1.0)];
    }
    let upper = source.partition_point(|&v| v <= position).min(last);
    let lower = upper - 1;
    let frac = (position - source[lower]) / (source[upper] - source[lower]);
    [(lower, 1.0 - frac), (upper, frac)]
        .into_iter()
        .filter(|(_, w)| *w > 0.0)
        .collect()
}

/// Applies per-axis weights to every time slice of `values`.
pub fn apply_weights(values: &Array3<f64>, lat: &AxisWeights, lon: &AxisWeights) -> Array3<f64> {
    let steps = values.shape()[0];
    Array3::from_shape_fn((steps, lat.targets.len(), lon.targets.len()), |(t, j, i)| {
        let mut num = 0.0;
        let mut den = 0.0;
        for &(a, wa) in &lat.weights[j] {
            for &(b, wb) in &lon.weights[i] {
                let v = values[[t, a, b]];
                if v.is_finite() {
                    num += wa * wb * v;
                    den += wa * wb;
                }
            }
        }
        if den > 0.0 { num / den } else { f64::NAN }
    })
}

/// Resamples the fields of `data` onto a regular `step`-degree grid covering `bbox`.
///
/// Latitudes come out ascending; wrapped longitude selections keep their west-to-east
/// order, expressed in the source grid's longitude convention.
pub fn resample_spatial(data: &UnitData, bbox: &BoundingBox, step: f64) -> ProcessResult<UnitData> {
    let convention = if data.lon.iter().any(|&lon| lon > 180.0) {
        LonConvention::Positive
    } else {
        LonConvention::Signed
    };
    let mut data = data.clone();
    orient(&mut data)?;

    let (lon_lo, lon_hi) = lon_bounds(bbox, convention);

    let lat_weights = AxisWeights::build(&data.lat, bbox.lat_min, bbox.lat_max, step);
    let lon_weights = AxisWeights::build(&data.lon, lon_lo, lon_hi, step);
    debug!(
        "Resampling {} from {}x{} to {}x{} cells",
        data.source,
        data.lat.len(),
        data.lon.len(),
        lat_weights.targets.len(),
        lon_weights.targets.len()
    );

    let fields = data
        .fields
        .into_iter()
        .map(|(name, field)| {
            let values = apply_weights(&field.values, &lat_weights, &lon_weights);
            (name, Field { values, ..field })
        })
        .collect();

    Ok(UnitData {
        source: data.source,
        steps: data.steps,
        lat: lat_weights.targets,
        lon: lon_weights
            .targets
            .into_iter()
            .map(|lon| if lon > 360.0 { lon - 360.0 } else { convention.normalize(lon) })
            .collect(),
        fields,
    })
}

/// Puts latitudes in ascending order and unwraps longitudes into one ascending run.
fn orient(data: &mut UnitData) -> ProcessResult<()> {
    if data.lat.len() > 1 && data.lat[0] > data.lat[data.lat.len() - 1] {
        data.lat.reverse();
        for (_, field) in data.fields.iter_mut() {
            field.values.invert_axis(ArrayAxis(1));
        }
    }

    let mut offset = 0.0;
    for i in 1..data.lon.len() {
        if data.lon[i] + offset < data.lon[i - 1] - 180.0 {
            offset += 360.0;
        }
        data.lon[i] += offset;
    }
    if data.lon.len() > 1 && data.lon[0] > data.lon[data.lon.len() - 1] {
        data.lon.reverse();
        for (_, field) in data.fields.iter_mut() {
            field.values.invert_axis(ArrayAxis(2));
        }
    }

    for (name, axis) in [("lat", &data.lat), ("lon", &data.lon)] {
        if axis.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ProcessError::invalid_dataset(
                &data.source,
                format!("{name} coordinate cannot be put in ascending order"),
            ));
        }
    }
    Ok(())
}

/// Longitude bounds of `bbox` in the unwrapped frame of a grid using `convention`.
fn lon_bounds(bbox: &BoundingBox, convention: LonConvention) -> (f64, f64) {
    if bbox.covers_all_longitudes() {
        return (f64::NEG_INFINITY, f64::INFINITY);
    }
    let lo = convention.normalize(bbox.lon_min);
    let hi = convention.normalize(bbox.lon_max);
    if hi < lo { (lo, hi + 360.0) } else { (lo, hi) }
}

/// Mean of the finite values of every field at `step` over the whole grid.
///
/// Fields without a time dimension contribute their only slice. A field with no
/// finite value averages to NaN.
pub fn area_means(data: &UnitData, step: usize) -> Vec<(String, f64)> {
    data.fields
        .iter()
        .map(|(name, field)| {
            let index = if field.timed { step } else { 0 };
            let (sum, count) = field
                .values
                .index_axis(ArrayAxis(0), index)
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));
            let mean = if count > 0 { sum / count as f64 } else { f64::NAN };
            (name.clone(), mean)
        })
        .collect()
}

/// Mean of the steps of one bucket
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedBucket {
    pub bucket: TemporalBucket,
    /// One time step dated at the bucket start
    pub data: UnitData,
}

#[derive(Debug)]
enum FieldSums {
    Timed {
        sum: Array2<f64>,
        count: Array2<u32>,
        units: Option<String>,
        long_name: Option<String>,
    },
    Static(Field),
}

#[derive(Debug)]
struct BucketSums {
    lat: Vec<f64>,
    lon: Vec<f64>,
    fields: Vec<(String, FieldSums)>,
    sources: Vec<String>,
}

/// Per-bucket running sums and counts, flushed as soon as a bucket can no longer grow
#[derive(Debug)]
pub struct TemporalAccumulator {
    resolution: TemporalResolution,
    buckets: BTreeMap<TemporalBucket, BucketSums>,
}

impl TemporalAccumulator {
    pub fn new(resolution: TemporalResolution) -> Self {
        TemporalAccumulator {
            resolution,
            buckets: BTreeMap::new(),
        }
    }

    pub fn open_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Adds every step of `data` to the bucket containing its date.
    pub fn add(&mut self, data: &UnitData) -> ProcessResult<()> {
        for (step, date) in data.steps.iter().enumerate() {
            let bucket = self.resolution.bucket_of(*date);
            let sums = self.buckets.entry(bucket).or_insert_with(|| BucketSums {
                lat: data.lat.clone(),
                lon: data.lon.clone(),
                fields: Vec::new(),
                sources: Vec::new(),
            });
            if sums.lat != data.lat || sums.lon != data.lon {
                return Err(ProcessError::GridMismatch {
                    name: format!("{}..{}", bucket.start, bucket.end),
                    reason: format!("'{}' does not share the grid of earlier units", data.source),
                });
            }
            if !sums.sources.contains(&data.source) {
                sums.sources.push(data.source.clone());
            }

            for (name, field) in &data.fields {
                let position = sums.fields.iter().position(|(n, _)| n == name);
                let shape = (data.lat.len(), data.lon.len());
                let index = match position {
                    Some(index) => index,
                    None => {
                        let entry = if field.timed {
                            FieldSums::Timed {
                                sum: Array2::zeros(shape),
                                count: Array2::zeros(shape),
                                units: field.units.clone(),
                                long_name: field.long_name.clone(),
                            }
                        } else {
                            FieldSums::Static(field.clone())
                        };
                        sums.fields.push((name.clone(), entry));
                        sums.fields.len() - 1
                    }
                };
                if let (FieldSums::Timed { sum, count, .. }, true) = (&mut sums.fields[index].1, field.timed) {
                    let slice = field.values.index_axis(ArrayAxis(0), step);
                    ndarray::Zip::from(sum)
                        .and(count)
                        .and(&slice)
                        .for_each(|s, c, &v| {
                            if v.is_finite() {
                                *s += v;
                                *c += 1;
                            }
                        });
                }
            }
        }
        Ok(())
    }

    /// Removes and returns the buckets ending before `date`, in chronological order.
    pub fn flush_before(&mut self, date: NaiveDate) -> Vec<AggregatedBucket> {
        let done: Vec<TemporalBucket> = self.buckets.keys().filter(|b| b.end < date).copied().collect();
        done.into_iter()
            .filter_map(|bucket| self.buckets.remove(&bucket).map(|sums| finalize(bucket, sums)))
            .collect()
    }

    /// Returns every remaining bucket, in chronological order.
    pub fn finish(self) -> Vec<AggregatedBucket> {
        self.buckets
            .into_iter()
            .map(|(bucket, sums)| finalize(bucket, sums))
            .collect()
    }
}

fn finalize(bucket: TemporalBucket, sums: BucketSums) -> AggregatedBucket {
    let shape = (1, sums.lat.len(), sums.lon.len());
    let fields = sums
        .fields
        .into_iter()
        .map(|(name, entry)| {
            let field = match entry {
                FieldSums::Timed {
                    sum,
                    count,
                    units,
                    long_name,
                } => {
                    let mean = ndarray::Zip::from(&sum)
                        .and(&count)
                        .map_collect(|&s, &c| if c > 0 { s / c as f64 } else { f64::NAN });
                    Field {
                        values: mean.into_shape_with_order(shape).unwrap_or_else(|_| Array3::from_elem(shape, f64::NAN)),
                        timed: true,
                        units,
                        long_name,
                    }
                }
                FieldSums::Static(field) => field,
            };
            (name, field)
        })
        .collect();

    AggregatedBucket {
        bucket,
        data: UnitData {
            source: sums.sources.join(","),
            steps: vec![bucket.start],
            lat: sums.lat,
            lon: sums.lon,
            fields,
        },
    }
}
