//! Uniform hash grid for neighbour discovery.
//!
//! Every drone index is bucketed by its position quantized to the nearest
//! cell coordinate. A neighbour query scans the square block of cells that
//! covers the search radius and then filters candidates by true Euclidean
//! distance, so the grid only ever narrows the candidate set. It never
//! changes which drones are reported.
//!
//! Cells are half-open, `[k - ½, k + ½) · cell_size` on each axis, so a
//! neighbour at exactly `range` is never more than `ceil(range / cell_size)`
//! cells away.
//!
//! ```text
//!   cell_radius = round_up(range / cell_size)
//!
//!   ┌───┬───┬───┬───┬───┐
//!   │   │   │   │   │   │     (2·r + 1)² block scanned
//!   ├───┼───┼───┼───┼───┤     around the querying cell,
//!   │   │ · │ · │   │   │     candidates kept only if
//!   ├───┼───┼───┼───┼───┤     |offset| <= range
//!   │   │ · │ X │ · │   │
//!   ├───┼───┼───┼───┼───┤
//!   │   │   │ · │   │   │
//!   └───┴───┴───┴───┴───┘
//! ```
//!
//! When that block holds more cells than the grid has occupied buckets, the
//! query walks the occupied buckets instead. Same result, bounded work.

use crate::drone::Drone;
use crate::error::{FlockError, Result};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer cell coordinate in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i64,
    pub y: i64,
}

impl GridPos {
    /// Creates a cell coordinate.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Quantizes a world position to the nearest cell.
    ///
    /// Rounds half up on each axis: `floor(p / cell_size + 0.5)`.
    pub fn from_position(position: &Vector2<f64>, cell_size: f64) -> Self {
        let scaled = position / cell_size;
        Self {
            x: (scaled.x + 0.5).floor() as i64,
            y: (scaled.y + 0.5).floor() as i64,
        }
    }

    /// Returns this coordinate shifted by `(dx, dy)` cells.
    pub fn offset(&self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Rounds to the nearest integer, bumping up by one if that underestimates.
///
/// Effectively `ceil` except that values exactly on an integer stay put.
pub fn round_up(x: f64) -> i64 {
    let rounded = x.round();
    if rounded < x {
        rounded as i64 + 1
    } else {
        rounded as i64
    }
}

/// What a drone observes about one of its neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighbourInfo {
    /// Index of the neighbour in the flock
    pub index: usize,

    /// Neighbour position
    pub position: Vector2<f64>,

    /// Unit heading of the neighbour (+x if it is stationary)
    pub forward: Vector2<f64>,

    /// Neighbour position minus observer position
    pub offset: Vector2<f64>,

    /// Euclidean distance to the neighbour
    pub distance: f64,

    /// `offset` normalized (zero if the two drones coincide)
    pub direction: Vector2<f64>,
}

impl NeighbourInfo {
    /// Builds the observation of `other` (at `index`) made from `observer`.
    pub fn observe(observer: &Vector2<f64>, index: usize, other: &Drone) -> Self {
        let offset = other.position - observer;
        let distance = offset.norm();
        Self {
            index,
            position: other.position,
            forward: unit_or_x_axis(&other.velocity),
            offset,
            distance,
            direction: unit_or_zero(&offset),
        }
    }
}

/// Normalizes `v`, returning the zero vector for zero-length input.
pub fn unit_or_zero(v: &Vector2<f64>) -> Vector2<f64> {
    v.try_normalize(0.0).unwrap_or_else(Vector2::zeros)
}

/// Normalizes `v`, falling back to the +x axis for zero-length input.
pub fn unit_or_x_axis(v: &Vector2<f64>) -> Vector2<f64> {
    v.try_normalize(0.0).unwrap_or_else(Vector2::x)
}

/// Sorts observations nearest first.
///
/// Ties are broken by flock index so results never depend on bucket order.
pub fn sort_by_distance(neighbours: &mut [NeighbourInfo]) {
    neighbours.sort_unstable_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.index.cmp(&b.index))
    });
}

/// Uniform-cell hash grid over drone indices.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Side length of a cell in world units
    cell_size: f64,

    /// Cell coordinate -> indices of the drones inside it
    buckets: HashMap<GridPos, Vec<usize>>,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    /// Returns [`FlockError::InvalidCellSize`] unless `cell_size` is finite and > 0.
    pub fn new(cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(FlockError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            buckets: HashMap::new(),
        })
    }

    /// Returns the cell side length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.buckets.len()
    }

    /// Indices stored in a given cell.
    pub fn bucket(&self, cell: GridPos) -> &[usize] {
        self.buckets.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Discards all buckets and reinserts every drone by its current position.
    pub fn rebuild(&mut self, drones: &[Drone]) {
        self.buckets.clear();
        for (index, drone) in drones.iter().enumerate() {
            let cell = GridPos::from_position(&drone.position, self.cell_size);
            self.buckets.entry(cell).or_default().push(index);
        }
    }

    /// Finds every drone within `max_range` of drone `index`, nearest first.
    ///
    /// The querying drone is never reported. `drones` must be the same slice
    /// the grid was last rebuilt from.
    pub fn query(&self, drones: &[Drone], index: usize, max_range: f64) -> Vec<NeighbourInfo> {
        let origin = drones[index].position;
        let reach = max_range / self.cell_size;

        let mut neighbours = Vec::new();
        let mut collect = |bucket: &[usize]| {
            for &other in bucket {
                if other == index {
                    continue;
                }
                let info = NeighbourInfo::observe(&origin, other, &drones[other]);
                if info.distance <= max_range {
                    neighbours.push(info);
                }
            }
        };

        // Computed in f64: an unbounded range must not saturate the loop bounds
        let side = 2.0 * reach.ceil() + 1.0;
        if side * side > self.buckets.len() as f64 {
            for bucket in self.buckets.values() {
                collect(bucket.as_slice());
            }
        } else {
            let centre = GridPos::from_position(&origin, self.cell_size);
            let cell_radius = round_up(reach);
            for dx in -cell_radius..=cell_radius {
                for dy in -cell_radius..=cell_radius {
                    if let Some(bucket) = self.buckets.get(&centre.offset(dx, dy)) {
                        collect(bucket.as_slice());
                    }
                }
            }
        }

        sort_by_distance(&mut neighbours);
        neighbours
    }
}

/// All-pairs reference query used to validate the grid.
pub fn brute_force_query(drones: &[Drone], index: usize, max_range: f64) -> Vec<NeighbourInfo> {
    let origin = drones[index].position;
    let mut neighbours: Vec<NeighbourInfo> = drones
        .iter()
        .enumerate()
        .filter(|(other, _)| *other != index)
        .map(|(other, drone)| NeighbourInfo::observe(&origin, other, drone))
        .filter(|info| info.distance <= max_range)
        .collect();
    sort_by_distance(&mut neighbours);
    neighbours
}
