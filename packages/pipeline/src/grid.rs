//! Bounding-box stepping for the grid-expansion stage.

use crate::types::GridBounds;

/// Latitude step between grid rows (about half a mile).
pub const LAT_STEP: f64 = 0.007233;
/// Longitude step between grid cells (about half a mile at mid latitudes).
pub const LNG_STEP: f64 = 0.0083175;

/// Walk a bounding box west to east, then one row north, emitting one
/// search cell per step. A cell is emitted only while a full step still
/// fits inside the bounds, so the walk always terminates and every cell's
/// search radius stays within the requested box.
pub fn grid_cells(bounds: &GridBounds) -> Vec<(f64, f64)> {
    let mut cells = Vec::new();
    let mut lat = bounds.start_lat;
    while lat + LAT_STEP <= bounds.end_lat {
        let mut lng = bounds.start_lng;
        while lng + LNG_STEP <= bounds.end_lng {
            cells.push((lat, lng));
            lng += LNG_STEP;
        }
        lat += LAT_STEP;
    }
    cells
}
