//! JSON exporter for external visualization.
//!
//! Frames carry only what a renderer needs (position and velocity per drone).
//! The export is a trace of a run, not a snapshot the engine can resume from.

use crate::error::Result;

use flock_core::{Drone, FlockStats};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Kinematic state of one drone in a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneFrame {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl DroneFrame {
    pub fn new(id: usize, drone: &Drone) -> Self {
        Self {
            id,
            x: drone.position.x,
            y: drone.position.y,
            vx: drone.velocity.x,
            vy: drone.velocity.y,
        }
    }
}

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Tick number
    pub tick: u64,

    /// Simulation time in seconds
    pub time_sec: f64,

    /// Every drone, in flock order
    pub drones: Vec<DroneFrame>,
}

impl SimFrame {
    /// Captures the population at `tick`.
    pub fn capture(tick: u64, time_sec: f64, drones: &[Drone]) -> Self {
        Self {
            tick,
            time_sec,
            drones: drones
                .iter()
                .enumerate()
                .map(|(id, drone)| DroneFrame::new(id, drone))
                .collect(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Tick rate in Hz
    pub tick_rate_hz: f64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Population statistics after the last tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_stats: Option<FlockStats>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, tick_rate_hz: f64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            tick_rate_hz,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            final_stats: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, stats: FlockStats) {
        self.passed = passed;
        self.final_stats = Some(stats);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::ProgramId;
    use nalgebra::Vector2;

    #[test]
    fn test_capture_and_serialize() {
        let drones = vec![
            Drone::new(Vector2::new(1.0, 2.0), Vector2::new(3.0, 4.0), 10.0, 100.0, ProgramId(0)),
            Drone::new(Vector2::new(-1.0, 0.5), Vector2::zeros(), 10.0, 100.0, ProgramId(0)),
        ];

        let mut export = SimExport::new("target_seek", 42, 60.0);
        export.add_frame(SimFrame::capture(0, 0.0, &drones));
        export.add_frame(SimFrame::capture(60, 1.0, &drones));
        export.finalize(true, FlockStats::from_drones(&drones));

        assert_eq!(export.duration_sec, 1.0);
        assert_eq!(export.frames[1].drones[0], DroneFrame { id: 0, x: 1.0, y: 2.0, vx: 3.0, vy: 4.0 });

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["scenario"], "target_seek");
        assert_eq!(json["frames"].as_array().unwrap().len(), 2);
        assert_eq!(json["final_stats"]["count"], 2);
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("flock_export_{}.json", std::process::id()));
        let export = SimExport::new("grid_filter", 1, 60.0);
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: SimExport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.scenario, "grid_filter");
        assert!(parsed.final_stats.is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
