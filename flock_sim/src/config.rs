//! Simulation harness configuration.

use flock_core::FlockConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for spawning and prey selection
    pub seed: u64,

    /// Number of drones (predator included) for population scenarios
    pub num_drones: usize,

    /// Worker threads (0 = one per core)
    pub workers: usize,

    /// Grid cell size
    pub cell_size: f64,

    /// Tick rate in Hz
    pub tick_rate_hz: f64,

    /// Simulated duration in seconds
    pub duration_secs: f64,

    /// Radius of the disc drones spawn in
    pub spawn_radius: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_drones: 1000,
            workers: 0,
            cell_size: 15.0,
            tick_rate_hz: 60.0,
            duration_secs: 10.0,
            spawn_radius: 150.0,
        }
    }
}

impl SimConfig {
    /// Engine configuration derived from this run configuration.
    pub fn flock_config(&self) -> FlockConfig {
        FlockConfig::default()
            .with_cell_size(self.cell_size)
            .with_workers(self.workers)
            .with_tick_rate(self.tick_rate_hz)
    }

    /// Number of ticks covering `duration_secs` (at least one).
    pub fn total_ticks(&self) -> u64 {
        ((self.duration_secs * self.tick_rate_hz).round() as u64).max(1)
    }
}
