//! Drone state and kinematics.

use crate::program::ProgramId;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A single flocking agent.
///
/// Identity is the drone's index in its flock; the flock never reorders or
/// resizes its population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    /// Position in world units
    pub position: Vector2<f64>,

    /// Velocity in world units per second
    pub velocity: Vector2<f64>,

    /// Speed cap
    pub max_speed: f64,

    /// Acceleration applied for a unit steering force
    pub max_acceleration: f64,

    /// Program steering this drone
    pub program: ProgramId,
}

impl Drone {
    /// Creates a drone.
    pub fn new(
        position: Vector2<f64>,
        velocity: Vector2<f64>,
        max_speed: f64,
        max_acceleration: f64,
        program: ProgramId,
    ) -> Self {
        Self {
            position,
            velocity,
            max_speed,
            max_acceleration,
            program,
        }
    }

    /// Current speed.
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Applies one semi-implicit Euler step at `tick_rate` Hz.
    ///
    /// Velocity is updated first and clamped to `max_speed`, then the new
    /// velocity moves the drone.
    pub fn integrate(&mut self, force: &Vector2<f64>, tick_rate: f64) {
        self.velocity += force * (self.max_acceleration / tick_rate);

        let speed = self.velocity.norm();
        if speed > self.max_speed {
            self.velocity *= self.max_speed / speed;
        }

        self.position += self.velocity / tick_rate;
    }
}
