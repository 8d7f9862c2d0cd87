//! # Spatial Selection
//!
//! Maps a [`BoundingBox`] onto the index window of a grid. Every cell whose centre
//! coordinate lies inside the box is selected, and no other. Longitude selections that
//! cross the edge of the grid's convention are kept as two linear index ranges.

use crate::grid::{Axis, GridDescriptor};
use crate::selection::BoundingBox;
use serde::Serialize;
use std::ops::Range;

/// Tolerance, in degrees, for coordinates sitting exactly on a box edge
const EDGE_TOLERANCE: f64 = 1e-9;

/// Index ranges of a grid selected by a spatial filter
///
/// `lon` holds one range, or two when the selection wraps around the grid's longitude
/// seam. Ranges are listed in geographic (west to east) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexWindow {
    pub lat: Range<usize>,
    pub lon: Vec<Range<usize>>,
}

impl IndexWindow {
    /// Window covering the whole grid
    pub fn full(grid: &GridDescriptor) -> Self {
        IndexWindow {
            lat: 0..grid.lat.len(),
            lon: vec![0..grid.lon.len()],
        }
    }

    pub fn lat_len(&self) -> usize {
        self.lat.len()
    }

    pub fn lon_len(&self) -> usize {
        self.lon.iter().map(|r| r.len()).sum()
    }

    pub fn is_wrapped(&self) -> bool {
        self.lon.len() > 1
    }

    /// Selected longitude indices in output order
    pub fn lon_indices(&self) -> Vec<usize> {
        self.lon.iter().flat_map(|r| r.clone()).collect()
    }

    pub fn lat_indices(&self) -> Vec<usize> {
        self.lat.clone().collect()
    }
}

/// Filter selecting the part of a grid inside a bounding box
pub trait GridFilter {
    fn apply(&self, grid: &GridDescriptor) -> Option<IndexWindow>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialFilter {
    pub bbox: BoundingBox,
}

impl SpatialFilter {
    pub fn new(bbox: BoundingBox) -> Self {
        SpatialFilter { bbox }
    }

    fn lon_ranges(&self, axis: &Axis, grid: &GridDescriptor) -> Vec<Range<usize>> {
        if self.bbox.covers_all_longitudes() {
            return vec![0..axis.len()];
        }

        let convention = grid.lon_convention();
        let lo = convention.normalize(self.bbox.lon_min);
        let hi = convention.normalize(self.bbox.lon_max);

        if lo <= hi {
            range_filter(axis, lo, hi).into_iter().collect()
        } else {
            [
                range_filter(axis, lo, f64::INFINITY),
                range_filter(axis, f64::NEG_INFINITY, hi),
            ]
            .into_iter()
            .flatten()
            .collect()
        }
    }
}

impl GridFilter for SpatialFilter {
    fn apply(&self, grid: &GridDescriptor) -> Option<IndexWindow> {
        let lat = range_filter(&grid.lat, self.bbox.lat_min, self.bbox.lat_max)?;
        let lon = self.lon_ranges(&grid.lon, grid);
        if lon.is_empty() {
            return None;
        }
        Some(IndexWindow { lat, lon })
    }
}

/// Contiguous index range of the coordinates inside `[min, max]`.
///
/// Works for ascending and descending axes since the axis is monotonic.
fn range_filter(axis: &Axis, min: f64, max: f64) -> Option<Range<usize>> {
    let selected: Vec<usize> = (0..axis.len())
        .filter(|&idx| {
            let val = axis.value(idx);
            val >= min - EDGE_TOLERANCE && val <= max + EDGE_TOLERANCE
        })
        .collect();
    let first = *selected.first()?;
    let last = *selected.last()?;
    Some(first..last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_grid(lon_origin: f64) -> GridDescriptor {
        GridDescriptor::new(
            Axis::regular(-89.5, 1.0, 180).unwrap(),
            Axis::regular(lon_origin, 1.0, 360).unwrap(),
        )
    }

    fn filter(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> SpatialFilter {
        SpatialFilter::new(BoundingBox::new(lon_min, lon_max, lat_min, lat_max).unwrap())
    }

    #[test]
    fn test_box_inside_grid_selects_exact_cells() {
        let grid = global_grid(-180.0);
        let window = filter(-10.0, 10.0, 30.0, 40.0).apply(&grid).unwrap();

        // latitude centres 30.5 ..= 39.5
        assert_eq!(window.lat, 120..130);
        // longitude centres -10 ..= 10
        assert_eq!(window.lon, vec![170..191]);
        for idx in window.lon_indices() {
            let lon = grid.lon.value(idx);
            assert!((-10.0..=10.0).contains(&lon));
        }
        assert_eq!(window.lon_len(), 21);
        assert!(!window.is_wrapped());
    }

    #[test]
    fn test_box_exceeding_grid_is_clipped() {
        let grid = GridDescriptor::new(
            Axis::regular(50.0, 0.5, 21).unwrap(),
            Axis::regular(-5.0, 0.5, 21).unwrap(),
        );
        let window = filter(-20.0, 20.0, 40.0, 70.0).apply(&grid).unwrap();
        assert_eq!(window, IndexWindow::full(&grid));
    }

    #[test]
    fn test_box_outside_grid_selects_nothing() {
        let grid = GridDescriptor::new(
            Axis::regular(50.0, 0.5, 21).unwrap(),
            Axis::regular(-5.0, 0.5, 21).unwrap(),
        );
        assert!(filter(20.0, 30.0, 50.0, 60.0).apply(&grid).is_none());
        assert!(filter(-5.0, 5.0, -60.0, -50.0).apply(&grid).is_none());
    }

    #[test]
    fn test_antimeridian_on_positive_grid() {
        // 0..359 grid: 170 -> -170 is the contiguous band 170..=190
        let grid = global_grid(0.0);
        let window = filter(170.0, -170.0, -90.0, 90.0).apply(&grid).unwrap();
        assert_eq!(window.lon, vec![170..191]);
        assert_eq!(window.lon_indices(), (170..=190).collect::<Vec<_>>());
    }

    #[test]
    fn test_antimeridian_on_signed_grid() {
        // -180..179 grid: 170 -> -170 wraps into two ranges
        let grid = global_grid(-180.0);
        let window = filter(170.0, -170.0, -90.0, 90.0).apply(&grid).unwrap();
        assert!(window.is_wrapped());
        assert_eq!(window.lon, vec![350..360, 0..11]);

        let lons: Vec<f64> = window.lon_indices().iter().map(|&i| grid.lon.value(i)).collect();
        assert_eq!(lons.first(), Some(&170.0));
        assert_eq!(lons.last(), Some(&-170.0));
        assert_eq!(lons.len(), 21);
    }

    #[test]
    fn test_prime_meridian_on_positive_grid() {
        let grid = global_grid(0.0);
        let window = filter(-10.0, 10.0, 0.0, 10.0).apply(&grid).unwrap();
        assert_eq!(window.lon, vec![350..360, 0..11]);
    }

    #[test]
    fn test_full_longitude_span() {
        let grid = global_grid(0.0);
        let window = filter(-180.0, 180.0, -90.0, 90.0).apply(&grid).unwrap();
        assert_eq!(window, IndexWindow::full(&grid));
    }

    #[test]
    fn test_descending_latitude_gives_same_cells() {
        let ascending = GridDescriptor::new(
            Axis::regular(-89.5, 1.0, 180).unwrap(),
            Axis::regular(-179.5, 1.0, 360).unwrap(),
        );
        let descending = GridDescriptor::new(
            Axis::regular(89.5, -1.0, 180).unwrap(),
            Axis::regular(-179.5, 1.0, 360).unwrap(),
        );
        let f = filter(0.0, 5.0, 10.0, 20.0);
        let up = f.apply(&ascending).unwrap();
        let down = f.apply(&descending).unwrap();

        let mut up_lats: Vec<f64> = up.lat_indices().iter().map(|&i| ascending.lat.value(i)).collect();
        let mut down_lats: Vec<f64> =
            down.lat_indices().iter().map(|&i| descending.lat.value(i)).collect();
        up_lats.sort_by(f64::total_cmp);
        down_lats.sort_by(f64::total_cmp);
        assert_eq!(up_lats, down_lats);
        assert_eq!(up_lats.len(), 10);
    }

    #[test]
    fn test_unaligned_grid() {
        // cell centres at 0.025, 0.075, ... do not sit on the box edges
        let grid = GridDescriptor::new(
            Axis::regular(0.025, 0.05, 40).unwrap(),
            Axis::regular(0.025, 0.05, 40).unwrap(),
        );
        let window = filter(0.5, 1.0, 0.5, 1.0).apply(&grid).unwrap();
        assert_eq!(window.lat, 10..20);
        assert_eq!(window.lon, vec![10..20]);
    }
}
