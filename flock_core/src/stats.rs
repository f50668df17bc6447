//! Aggregate flock statistics.

use crate::drone::Drone;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Summary of a population at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockStats {
    /// Number of drones
    pub count: usize,

    /// Mean position
    pub centroid: Vector2<f64>,

    /// Mean distance from the centroid
    pub spread: f64,

    /// Mean speed
    pub mean_speed: f64,

    /// Fastest drone's speed
    pub max_speed: f64,
}

impl FlockStats {
    /// Computes statistics over `drones`. An empty slice yields all zeros.
    pub fn from_drones(drones: &[Drone]) -> Self {
        if drones.is_empty() {
            return Self {
                count: 0,
                centroid: Vector2::zeros(),
                spread: 0.0,
                mean_speed: 0.0,
                max_speed: 0.0,
            };
        }

        let n = drones.len() as f64;
        let centroid = drones.iter().map(|d| d.position).sum::<Vector2<f64>>() / n;
        let spread = drones.iter().map(|d| (d.position - centroid).norm()).sum::<f64>() / n;
        let mean_speed = drones.iter().map(Drone::speed).sum::<f64>() / n;
        let max_speed = drones.iter().map(Drone::speed).fold(0.0, f64::max);

        Self {
            count: drones.len(),
            centroid,
            spread,
            mean_speed,
            max_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramId;
    use approx::assert_relative_eq;

    #[test]
    fn test_stats() {
        let drones = vec![
            Drone::new(Vector2::new(-1.0, 0.0), Vector2::new(3.0, 4.0), 10.0, 1.0, ProgramId(0)),
            Drone::new(Vector2::new(1.0, 0.0), Vector2::zeros(), 10.0, 1.0, ProgramId(0)),
        ];

        let stats = FlockStats::from_drones(&drones);
        assert_eq!(stats.count, 2);
        assert_relative_eq!(stats.centroid, Vector2::zeros());
        assert_relative_eq!(stats.spread, 1.0);
        assert_relative_eq!(stats.mean_speed, 2.5);
        assert_relative_eq!(stats.max_speed, 5.0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = FlockStats::from_drones(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.spread, 0.0);
    }
}
