//! The flock: population, programs and the two-phase tick.
//!
//! ```text
//!   tick()
//!     │
//!     ├─ rebuild grid              (single thread, start-of-tick snapshot)
//!     │
//!     ├─ force phase  ──► worker pool: one job per drone
//!     │                   reads every drone + grid, writes forces[i]
//!     │  ═══ join ═══
//!     ├─ integrate phase ─► worker pool: one job per drone
//!     │                   reads forces[i], writes drones[i]
//!     │  ═══ join ═══
//!     ▼
//!   idle (state readable, commands may be applied)
//! ```
//!
//! Both phases run on a rayon pool built once in [`Flock::new`]. A parallel
//! iterator only returns once every job has finished, which is the barrier
//! between phases. No drone is written while any force job can read it.
//! A panicking job propagates out of [`Flock::tick`].

use crate::command::ControlCommand;
use crate::drone::Drone;
use crate::error::{FlockError, Result};
use crate::program::{FlockingProgram, ProgramId};
use crate::spatial::{NeighbourInfo, SpatialGrid};
use crate::stats::FlockStats;

use nalgebra::Vector2;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, trace, warn};

/// Default grid cell size
pub const DEFAULT_CELL_SIZE: f64 = 15.0;

/// Default tick rate in Hz
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

/// Default cap on neighbours handed to a program
pub const DEFAULT_MAX_NEIGHBOURS: usize = 10;

/// Construction-time configuration of a flock.
#[derive(Debug, Clone, PartialEq)]
pub struct FlockConfig {
    /// Grid cell side length
    pub cell_size: f64,

    /// Number of worker threads
    pub workers: usize,

    /// Fixed tick rate in Hz
    pub tick_rate_hz: f64,

    /// Only this many of the closest neighbours reach the rules
    pub max_neighbours: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            max_neighbours: DEFAULT_MAX_NEIGHBOURS,
        }
    }
}

impl FlockConfig {
    /// Sets the grid cell size.
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Sets the worker count (0 lets rayon pick).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: f64) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Sets the neighbour cap.
    pub fn with_max_neighbours(mut self, max_neighbours: usize) -> Self {
        self.max_neighbours = max_neighbours;
        self
    }
}

/// A fixed population of drones advanced in lock-step.
pub struct Flock {
    config: FlockConfig,

    /// Population; index is identity
    drones: Vec<Drone>,

    /// Program arena referenced by `Drone::program`
    programs: Vec<FlockingProgram>,

    grid: SpatialGrid,

    /// Per-drone steering force scratch, overwritten every tick
    forces: Vec<Vector2<f64>>,

    pool: rayon::ThreadPool,

    tick_count: u64,
}

impl Flock {
    /// Creates a flock and its worker pool.
    ///
    /// # Errors
    /// Fails on an invalid cell size or tick rate, a drone referencing a
    /// program that is not in `programs`, or if the pool cannot be built.
    pub fn new(drones: Vec<Drone>, programs: Vec<FlockingProgram>, config: FlockConfig) -> Result<Self> {
        if !config.tick_rate_hz.is_finite() || config.tick_rate_hz <= 0.0 {
            return Err(FlockError::InvalidTickRate(config.tick_rate_hz));
        }
        let grid = SpatialGrid::new(config.cell_size)?;

        if let Some(drone) = drones.iter().find(|d| d.program.0 >= programs.len()) {
            return Err(FlockError::UnknownProgram(drone.program.0));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("flock-worker-{}", i))
            .build()
            .map_err(FlockError::thread_pool)?;

        info!(
            "Flock created: {} drones, {} programs, {} workers, cell size {}",
            drones.len(),
            programs.len(),
            pool.current_num_threads(),
            config.cell_size
        );

        Ok(Self {
            forces: vec![Vector2::zeros(); drones.len()],
            config,
            drones,
            programs,
            grid,
            pool,
            tick_count: 0,
        })
    }

    /// Advances the simulation by one fixed time-step.
    pub fn tick(&mut self) {
        let started = Instant::now();

        self.grid.rebuild(&self.drones);
        let rebuilt = Instant::now();

        let tick_rate = self.config.tick_rate_hz;
        let max_neighbours = self.config.max_neighbours;
        let Self {
            drones,
            programs,
            grid,
            forces,
            pool,
            ..
        } = self;

        {
            let drones: &[Drone] = drones;
            let programs: &[FlockingProgram] = programs;
            let grid: &SpatialGrid = grid;
            pool.install(|| {
                forces.par_iter_mut().enumerate().for_each(|(index, slot)| {
                    *slot = steering_force(drones, programs, grid, index, max_neighbours);
                });
            });
        }
        let forced = Instant::now();

        pool.install(|| {
            drones
                .par_iter_mut()
                .zip(forces.par_iter())
                .for_each(|(drone, force)| drone.integrate(force, tick_rate));
        });

        self.tick_count += 1;
        trace!(
            tick = self.tick_count,
            grid_us = (rebuilt - started).as_micros() as u64,
            force_us = (forced - rebuilt).as_micros() as u64,
            integrate_us = forced.elapsed().as_micros() as u64,
            "tick complete"
        );
    }

    /// Applies a control command. Only possible between ticks.
    pub fn apply(&mut self, command: ControlCommand) -> Result<()> {
        command.apply_to(&mut self.programs).map_err(|e| {
            warn!("Rejected control command: {}", e);
            e
        })
    }

    /// The population, in stable index order.
    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    /// A single drone.
    pub fn drone(&self, index: usize) -> Result<&Drone> {
        self.drones.get(index).ok_or(FlockError::UnknownDrone(index))
    }

    /// Registered programs.
    pub fn programs(&self) -> &[FlockingProgram] {
        &self.programs
    }

    /// A single program.
    pub fn program(&self, id: ProgramId) -> Result<&FlockingProgram> {
        self.programs.get(id.0).ok_or(FlockError::UnknownProgram(id.0))
    }

    /// Steering forces computed in the last tick.
    pub fn last_forces(&self) -> &[Vector2<f64>] {
        &self.forces
    }

    /// Number of drones.
    pub fn len(&self) -> usize {
        self.drones.len()
    }

    /// Returns true for an empty flock.
    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    /// Configuration the flock was built with.
    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Number of worker threads in the pool.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated seconds elapsed.
    pub fn time_secs(&self) -> f64 {
        self.tick_count as f64 / self.config.tick_rate_hz
    }

    /// Aggregate statistics of the current population.
    pub fn stats(&self) -> FlockStats {
        FlockStats::from_drones(&self.drones)
    }
}

/// Force job for drone `index`: query, cap, blend.
fn steering_force(
    drones: &[Drone],
    programs: &[FlockingProgram],
    grid: &SpatialGrid,
    index: usize,
    max_neighbours: usize,
) -> Vector2<f64> {
    let drone = &drones[index];
    let program = &programs[drone.program.0];

    let mut neighbours: Vec<NeighbourInfo> = grid.query(drones, index, program.range());
    neighbours.truncate(max_neighbours);

    program.force(&drone.position, &neighbours)
}
