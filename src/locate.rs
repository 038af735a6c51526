//! Nearest-point lookup for pointer hit testing.
//!
//! Distances are measured in screen pixels: the pointer is converted to data
//! space once and each candidate's data-space offset is scaled by the
//! per-axis pixels-per-unit. Ties go to the point that comes first in
//! ascending (cluster id, point id) order.

use std::collections::HashMap;

use crate::dataset::{ClusterId, Dataset, MapPoint, PointId};
use crate::filter::FilterState;
use crate::geom::{DataPoint, ScreenPoint};
use crate::transform::Transform;
use crate::view::Viewport;

/// Cap on grid cells scanned per query before falling back to a full scan.
const MAX_QUERY_CELLS: usize = 4096;

/// A located point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMatch {
    /// Matched point.
    pub point_id: PointId,
    /// Cluster owning the matched point.
    pub cluster_id: ClusterId,
    /// Data-space position of the point.
    pub position: DataPoint,
    /// Screen-space position of the point.
    pub screen: ScreenPoint,
    /// Pixel distance between the query and the point.
    pub distance: f64,
}

/// Whether a point takes part in hit testing.
pub(crate) fn is_visible(
    point: &MapPoint,
    filter: &FilterState,
    focus: Option<&ClusterId>,
) -> bool {
    focus.is_none_or(|focus| &point.cluster_id == focus) && filter.passes(point)
}

/// Find the visible point nearest to `screen` within `tolerance_px`.
pub fn locate(
    screen: ScreenPoint,
    dataset: &Dataset,
    viewport: &Viewport,
    filter: &FilterState,
    tolerance_px: f64,
) -> Option<PointMatch> {
    locate_in(screen, dataset, viewport, filter, None, tolerance_px)
}

/// Like [`locate`], restricted to one cluster when `focus` is set.
pub fn locate_in(
    screen: ScreenPoint,
    dataset: &Dataset,
    viewport: &Viewport,
    filter: &FilterState,
    focus: Option<&ClusterId>,
    tolerance_px: f64,
) -> Option<PointMatch> {
    if !tolerance_px.is_finite() || tolerance_px < 0.0 {
        return None;
    }
    let transform = Transform::new(*viewport)?;
    let query = transform.screen_to_data(screen);
    let scale = transform.pixels_per_unit();
    let threshold_sq = tolerance_px * tolerance_px;

    let mut best: Option<(&MapPoint, f64)> = None;
    for point in dataset.points() {
        if !is_visible(point, filter, focus) {
            continue;
        }
        let dist = pixel_distance_sq(point.position, query, scale);
        if dist > threshold_sq {
            continue;
        }
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((point, dist));
        }
    }

    best.map(|(point, dist)| PointMatch {
        point_id: point.id.clone(),
        cluster_id: point.cluster_id.clone(),
        position: point.position,
        screen: transform.data_to_screen(point.position),
        distance: dist.sqrt(),
    })
}

fn pixel_distance_sq(point: DataPoint, query: DataPoint, scale: (f64, f64)) -> f64 {
    let dx = (point.x - query.x) * scale.0;
    let dy = (point.y - query.y) * scale.1;
    dx * dx + dy * dy
}

/// Inputs a grid was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridKey {
    generation: u64,
    filter: FilterState,
    focus: Option<ClusterId>,
    scale: (u64, u64),
}

impl GridKey {
    /// Key for a dataset, filter, focus, and viewport scale.
    ///
    /// Translation is not part of the key: panning never invalidates a grid.
    pub fn new(
        dataset: &Dataset,
        filter: &FilterState,
        focus: Option<&ClusterId>,
        viewport: &Viewport,
    ) -> Self {
        Self {
            generation: dataset.generation(),
            filter: *filter,
            focus: focus.cloned(),
            scale: (
                viewport.pixels_per_unit_x().to_bits(),
                viewport.pixels_per_unit_y().to_bits(),
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct GridEntry {
    rank: usize,
    point_id: PointId,
    cluster_id: ClusterId,
    position: DataPoint,
}

/// Uniform grid over the visible points, in data space.
///
/// Produces the same answers as [`locate_in`], including tie-breaks.
#[derive(Debug, Clone)]
pub struct PointGrid {
    key: GridKey,
    cell: (f64, f64),
    entries: Vec<GridEntry>,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl PointGrid {
    /// Build a grid whose cells are `cell_px` pixels wide at the viewport's
    /// current scale.
    ///
    /// Returns `None` for a non-invertible viewport or a non-positive cell.
    pub fn build(
        dataset: &Dataset,
        filter: &FilterState,
        focus: Option<&ClusterId>,
        viewport: &Viewport,
        cell_px: f64,
    ) -> Option<Self> {
        if !cell_px.is_finite() || cell_px <= 0.0 {
            return None;
        }
        let transform = Transform::new(*viewport)?;
        let cell = transform.pixels_to_data(cell_px);

        let mut entries = Vec::new();
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (rank, point) in dataset.points().enumerate() {
            if !is_visible(point, filter, focus) {
                continue;
            }
            let index = entries.len();
            entries.push(GridEntry {
                rank,
                point_id: point.id.clone(),
                cluster_id: point.cluster_id.clone(),
                position: point.position,
            });
            cells
                .entry(cell_of(point.position, cell))
                .or_default()
                .push(index);
        }

        Some(Self {
            key: GridKey::new(dataset, filter, focus, viewport),
            cell,
            entries,
            cells,
        })
    }

    /// Whether the grid was built for these inputs.
    pub fn is_current(&self, key: &GridKey) -> bool {
        &self.key == key
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the grid indexes no points.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the indexed point nearest to `screen` within `tolerance_px`.
    ///
    /// `viewport` must have the same scale the grid was built with; only the
    /// translation may differ.
    pub fn locate(
        &self,
        screen: ScreenPoint,
        viewport: &Viewport,
        tolerance_px: f64,
    ) -> Option<PointMatch> {
        if !tolerance_px.is_finite() || tolerance_px < 0.0 {
            return None;
        }
        let transform = Transform::new(*viewport)?;
        let query = transform.screen_to_data(screen);
        let scale = transform.pixels_per_unit();
        let (rx, ry) = transform.pixels_to_data(tolerance_px);
        let threshold_sq = tolerance_px * tolerance_px;

        let lo = cell_of(DataPoint::new(query.x - rx, query.y - ry), self.cell);
        let hi = cell_of(DataPoint::new(query.x + rx, query.y + ry), self.cell);
        let span_x = hi.0.saturating_sub(lo.0).saturating_add(1) as u64;
        let span_y = hi.1.saturating_sub(lo.1).saturating_add(1) as u64;

        let mut best: Option<(usize, f64)> = None;
        let mut consider = |index: usize| {
            let entry = &self.entries[index];
            let dist = pixel_distance_sq(entry.position, query, scale);
            if dist > threshold_sq {
                return;
            }
            if best.is_none_or(|(best_index, best_dist)| {
                dist < best_dist
                    || (dist == best_dist && entry.rank < self.entries[best_index].rank)
            }) {
                best = Some((index, dist));
            }
        };

        if span_x.saturating_mul(span_y) > MAX_QUERY_CELLS as u64 {
            (0..self.entries.len()).for_each(&mut consider);
        } else {
            for cx in lo.0..=hi.0 {
                for cy in lo.1..=hi.1 {
                    if let Some(indices) = self.cells.get(&(cx, cy)) {
                        indices.iter().copied().for_each(&mut consider);
                    }
                }
            }
        }

        best.map(|(index, dist)| {
            let entry = &self.entries[index];
            PointMatch {
                point_id: entry.point_id.clone(),
                cluster_id: entry.cluster_id.clone(),
                position: entry.position,
                screen: transform.data_to_screen(entry.position),
                distance: dist.sqrt(),
            }
        })
    }
}

fn cell_of(point: DataPoint, cell: (f64, f64)) -> (i64, i64) {
    // `as` saturates for out-of-range floats.
    (
        (point.x / cell.0).floor() as i64,
        (point.y / cell.1).floor() as i64,
    )
}
