//! Ready-made flocking programs.

use flock_core::{
    AlignmentRule, AvoidanceRule, CohesionRule, FlockingProgram, SeparationRule, TargetingRule,
};
use nalgebra::Vector2;

/// Index of the avoidance rule in [`flock_program`]
pub const FLOCK_AVOID_RULE: usize = 4;

/// Index of the targeting rule in [`predator_program`]
pub const PREDATOR_TARGET_RULE: usize = 0;

/// Radius within which the flock flees the predator
pub const PREDATOR_FEAR_RADIUS: f64 = 25.0;

/// Speed cap of the predator
pub const PREDATOR_MAX_SPEED: f64 = 15.0;

/// Speed caps of ordinary drones are drawn from this range
pub const FLOCK_SPEED_RANGE: (f64, f64) = (10.0, 12.5);

/// The standard five-rule flock: cohere, keep apart, align, drift home, flee.
pub fn flock_program() -> FlockingProgram {
    FlockingProgram::new()
        .with_rule(CohesionRule::new(15.0), 0.3)
        .with_rule(
            SeparationRule::new(5.0)
                .with_deactivate_on_no_neighbours(true)
                .with_only_closest(true),
            2.0,
        )
        .with_rule(
            AlignmentRule::new(10.0).with_deactivate_on_no_neighbours(true),
            1.0,
        )
        .with_rule(TargetingRule::new(Vector2::zeros()), 0.2)
        .with_rule(AvoidanceRule::new(Vector2::zeros(), PREDATOR_FEAR_RADIUS), 2.0)
}

/// A lone hunter that only chases its target.
pub fn predator_program() -> FlockingProgram {
    FlockingProgram::new().with_rule(TargetingRule::default(), 1.0)
}
