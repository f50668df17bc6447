//! Flock simulation harness
//!
//! Seeded scenarios that drive a [`flock_core::Flock`] and check the
//! behaviour it is supposed to show: separation, targeting, grid filtering,
//! cohesion and a full predator chase.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                     │
//! │  ┌─────────┐   drones    ┌──────────────────────────┐ │
//! │  │ Spawner │────────────►│          Flock           │ │
//! │  │ (seed)  │             │  grid ─► forces ─► move  │ │
//! │  └─────────┘             └──────────────────────────┘ │
//! │                            ▲                 │        │
//! │           ControlCommand   │                 │ frames │
//! │  ┌─────────────────────┐   │           ┌─────▼──────┐ │
//! │  │ PredatorController  │───┘           │ SimExport  │ │
//! │  └─────────────────────┘               └────────────┘ │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use flock_sim::{ScenarioId, ScenarioRunner, SimConfig};
//!
//! let runner = ScenarioRunner::new(SimConfig::default());
//! let result = runner.run(ScenarioId::PredatorChase).unwrap();
//! assert!(result.passed);
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod exporter;
pub mod presets;
pub mod runner;
pub mod scenarios;
pub mod spawn;

pub use config::SimConfig;
pub use controller::PredatorController;
pub use error::{Result, SimError};
pub use exporter::{DroneFrame, SimExport, SimFrame};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use spawn::Spawner;
