//! Flock Core - Grid-Indexed Flocking Engine
//!
//! Simulates large populations of drones steered by composable local rules:
//! 1. **Who is near me**: a uniform hash grid rebuilt every tick, filtered by
//!    exact distance, answers neighbour queries without an all-pairs scan
//! 2. **What do I do about it**: flocking programs blend weighted steering
//!    rules (separation, alignment, cohesion, targeting, avoidance) into one force
//! 3. **Everyone at once**: each tick runs a parallel force phase and a
//!    parallel integration phase, joined by a barrier, on a fixed worker pool
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Flock                             │
//! │  ┌──────────────┐   ┌──────────────────────────────────┐    │
//! │  │ SpatialGrid  │   │ programs: Vec<FlockingProgram>   │    │
//! │  │ cell -> [i]  │   │   [(SteeringRule, weight), ...]  │    │
//! │  └──────┬───────┘   └────────────────┬─────────────────┘    │
//! │         │ query(i, range)            │ force(pos, ns)       │
//! │  ┌──────▼────────────────────────────▼─────────────────┐    │
//! │  │ drones: Vec<Drone>   forces: Vec<Vector2>           │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                  rayon::ThreadPool (fixed)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use flock_core::{
//!     CohesionRule, ControlCommand, Drone, Flock, FlockConfig, FlockingProgram,
//!     ProgramId, SeparationRule, TargetingRule,
//! };
//! use nalgebra::Vector2;
//!
//! let program = FlockingProgram::new()
//!     .with_rule(CohesionRule::new(15.0), 0.3)
//!     .with_rule(SeparationRule::new(5.0).with_only_closest(true), 2.0)
//!     .with_rule(TargetingRule::default(), 0.2);
//!
//! let drones = (0..8)
//!     .map(|i| Drone::new(Vector2::new(i as f64, 0.0), Vector2::zeros(), 10.0, 100.0, ProgramId(0)))
//!     .collect();
//!
//! let mut flock = Flock::new(drones, vec![program], FlockConfig::default().with_workers(2)).unwrap();
//! flock.apply(ControlCommand::SetTarget {
//!     program: ProgramId(0),
//!     rule: 2,
//!     target: Vector2::new(50.0, 50.0),
//! }).unwrap();
//! flock.tick();
//! assert_eq!(flock.tick_count(), 1);
//! ```

pub mod command;
pub mod drone;
pub mod error;
pub mod flock;
pub mod program;
pub mod rules;
pub mod spatial;
pub mod stats;

// Re-export key types for convenience
pub use command::ControlCommand;
pub use drone::Drone;
pub use error::{FlockError, Result};
pub use flock::{Flock, FlockConfig};
pub use program::{FlockingProgram, ProgramId};
pub use rules::{
    AlignmentRule, AvoidanceRule, CohesionRule, MultiAvoidanceRule, SeparationRule, Steering,
    SteeringRule, TargetingRule,
};
pub use spatial::{GridPos, NeighbourInfo, SpatialGrid};
pub use stats::FlockStats;
