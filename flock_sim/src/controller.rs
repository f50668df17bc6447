//! Between-tick steering of the predator chase.
//!
//! Plays the role of the input collaborator: it reads drone positions after
//! a tick and moves the rule targets before the next one.

use crate::presets::{FLOCK_AVOID_RULE, PREDATOR_TARGET_RULE};

use flock_core::{ControlCommand, Flock, ProgramId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

/// Ticks between prey switches
pub const PREY_SWITCH_TICKS: u64 = 240;

/// Drives the predator's target and the flock's danger point.
pub struct PredatorController {
    /// Index of the predator drone
    predator: usize,

    /// Program of the prey drones
    flock_program: ProgramId,

    /// Program of the predator
    predator_program: ProgramId,

    /// Index of the drone being chased
    prey: usize,

    /// Ticks since the last prey switch
    timer: u64,

    rng: ChaCha8Rng,
    prey_dist: Uniform<usize>,
}

impl PredatorController {
    /// Creates a controller for a flock of `population` drones where drone 0
    /// is the predator. `population` must be at least 2.
    pub fn new(seed: u64, population: usize, flock_program: ProgramId, predator_program: ProgramId) -> Self {
        Self {
            predator: 0,
            flock_program,
            predator_program,
            prey: 1,
            timer: 0,
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_mul(0x517cc1b727220a95)),
            prey_dist: Uniform::new(1, population.max(2)),
        }
    }

    /// Current prey index.
    pub fn prey(&self) -> usize {
        self.prey
    }

    /// Updates both control points from the flock's current state.
    ///
    /// Returns the number of commands applied.
    pub fn steer(&mut self, flock: &mut Flock) -> flock_core::Result<usize> {
        self.timer += 1;
        if self.timer > PREY_SWITCH_TICKS {
            self.timer = 0;
            self.prey = self.prey_dist.sample(&mut self.rng);
            debug!("Predator switched to prey #{}", self.prey);
        }

        let prey_position = flock.drone(self.prey)?.position;
        let predator_position = flock.drone(self.predator)?.position;

        flock.apply(ControlCommand::SetTarget {
            program: self.predator_program,
            rule: PREDATOR_TARGET_RULE,
            target: prey_position,
        })?;
        flock.apply(ControlCommand::SetAvoidPoint {
            program: self.flock_program,
            rule: FLOCK_AVOID_RULE,
            point: predator_position,
        })?;

        Ok(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{flock_program, predator_program};
    use flock_core::{Drone, FlockConfig, SteeringRule};
    use nalgebra::Vector2;

    fn chase_flock() -> Flock {
        let drones = vec![
            Drone::new(Vector2::new(0.0, 0.0), Vector2::zeros(), 15.0, 100.0, ProgramId(1)),
            Drone::new(Vector2::new(5.0, 0.0), Vector2::zeros(), 10.0, 100.0, ProgramId(0)),
            Drone::new(Vector2::new(-5.0, 0.0), Vector2::zeros(), 10.0, 100.0, ProgramId(0)),
        ];
        Flock::new(
            drones,
            vec![flock_program(), predator_program()],
            FlockConfig::default().with_workers(1),
        )
        .unwrap()
    }

    #[test]
    fn test_steer_updates_control_points() {
        let mut flock = chase_flock();
        let mut controller = PredatorController::new(42, 3, ProgramId(0), ProgramId(1));

        assert_eq!(controller.steer(&mut flock).unwrap(), 2);

        match flock.programs()[1].rule(PREDATOR_TARGET_RULE) {
            Some(SteeringRule::Targeting(r)) => assert_eq!(r.target, Vector2::new(5.0, 0.0)),
            other => panic!("unexpected rule: {:?}", other),
        }
        match flock.programs()[0].rule(FLOCK_AVOID_RULE) {
            Some(SteeringRule::Avoidance(r)) => assert_eq!(r.target, Vector2::new(0.0, 0.0)),
            other => panic!("unexpected rule: {:?}", other),
        }
    }

    #[test]
    fn test_prey_switches_after_interval() {
        let mut flock = chase_flock();
        let mut controller = PredatorController::new(42, 3, ProgramId(0), ProgramId(1));

        for _ in 0..PREY_SWITCH_TICKS {
            controller.steer(&mut flock).unwrap();
        }
        assert_eq!(controller.prey(), 1);
        assert_eq!(controller.timer, PREY_SWITCH_TICKS);

        controller.steer(&mut flock).unwrap();
        assert_eq!(controller.timer, 0);
        assert!((1..3).contains(&controller.prey()));
    }
}
