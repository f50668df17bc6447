//! Deterministic population spawning.
//!
//! All randomness comes from one ChaCha8 stream seeded from the run seed, so
//! a seed reproduces the exact same starting population.

use flock_core::{Drone, ProgramId};
use nalgebra::Vector2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use std::f64::consts::TAU;

/// Maximum acceleration given to spawned drones
pub const DRONE_MAX_ACCELERATION: f64 = 100.0;

/// Upper bound on the initial speed of a spawned drone
pub const MAX_INITIAL_SPEED: f64 = 10.0;

/// Seeded generator of drones inside a disc.
pub struct Spawner {
    rng: ChaCha8Rng,

    /// Disc radius
    radius: f64,

    unit: Uniform<f64>,
    angle: Uniform<f64>,
}

impl Spawner {
    /// Creates a spawner for a disc of `radius` around the origin.
    pub fn new(seed: u64, radius: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            radius,
            unit: Uniform::new(0.0, 1.0),
            angle: Uniform::new(0.0, TAU),
        }
    }

    /// Uniformly distributed point in the disc.
    pub fn position(&mut self) -> Vector2<f64> {
        let r = self.unit.sample(&mut self.rng).sqrt() * self.radius;
        polar(r, self.angle.sample(&mut self.rng))
    }

    /// Random heading with speed in `[0, max_speed)`.
    pub fn velocity(&mut self, max_speed: f64) -> Vector2<f64> {
        let speed = self.unit.sample(&mut self.rng) * max_speed;
        polar(speed, self.angle.sample(&mut self.rng))
    }

    /// Uniform sample in `[low, high)`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        Uniform::new(low, high).sample(&mut self.rng)
    }

    /// Spawns a moving drone with the given speed cap.
    pub fn drone(&mut self, program: ProgramId, max_speed: f64) -> Drone {
        let position = self.position();
        let velocity = self.velocity(MAX_INITIAL_SPEED);
        Drone::new(position, velocity, max_speed, DRONE_MAX_ACCELERATION, program)
    }

    /// Spawns a drone at rest.
    pub fn still_drone(&mut self, program: ProgramId, max_speed: f64) -> Drone {
        let position = self.position();
        Drone::new(position, Vector2::zeros(), max_speed, DRONE_MAX_ACCELERATION, program)
    }
}

fn polar(r: f64, theta: f64) -> Vector2<f64> {
    Vector2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_spawner_deterministic() {
        let mut a = Spawner::new(42, 150.0);
        let mut b = Spawner::new(42, 150.0);

        for _ in 0..10 {
            assert_eq!(a.drone(ProgramId(0), 12.0), b.drone(ProgramId(0), 12.0));
        }
    }

    #[test]
    fn test_spawner_seeds_differ() {
        let mut a = Spawner::new(1, 150.0);
        let mut b = Spawner::new(2, 150.0);
        assert_ne!(a.position(), b.position());
    }

    #[test]
    fn test_still_drone() {
        let mut spawner = Spawner::new(7, 10.0);
        let drone = spawner.still_drone(ProgramId(1), 15.0);
        assert_eq!(drone.velocity, Vector2::zeros());
        assert_eq!(drone.max_speed, 15.0);
        assert_eq!(drone.program, ProgramId(1));
        assert_eq!(drone.max_acceleration, DRONE_MAX_ACCELERATION);
    }

    proptest! {
        #[test]
        fn prop_spawn_within_bounds(seed in any::<u64>(), radius in 1.0f64..500.0) {
            let mut spawner = Spawner::new(seed, radius);
            for _ in 0..20 {
                prop_assert!(spawner.position().norm() <= radius + 1e-9);
                prop_assert!(spawner.velocity(MAX_INITIAL_SPEED).norm() < MAX_INITIAL_SPEED + 1e-9);
                let speed = spawner.uniform(10.0, 12.5);
                prop_assert!((10.0..12.5).contains(&speed));
            }
        }
    }
}
