//! Flocking programs: weighted blends of steering rules.

use crate::rules::{Steering, SteeringRule};
use crate::spatial::NeighbourInfo;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Index of a program registered with a [`Flock`](crate::Flock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub usize);

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "program#{}", self.0)
    }
}

/// An ordered list of (rule, weight) pairs.
///
/// The output force is the weighted *average* of the active rules, so the
/// force scale does not depend on which subset of rules happens to fire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlockingProgram {
    rules: Vec<SteeringRule>,
    weights: Vec<f64>,

    /// Largest range over all rules, refreshed on every insertion
    max_range: f64,
}

impl FlockingProgram {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule with the given weight.
    pub fn add_rule(&mut self, rule: impl Into<SteeringRule>, weight: f64) {
        self.rules.push(rule.into());
        self.weights.push(weight);
        self.recalc_max_range();
    }

    /// Builder form of [`add_rule`](Self::add_rule).
    pub fn with_rule(mut self, rule: impl Into<SteeringRule>, weight: f64) -> Self {
        self.add_rule(rule, weight);
        self
    }

    /// Blends all active rules into a single steering force.
    pub fn force(&self, position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Vector2<f64> {
        let mut total_force = Vector2::zeros();
        let mut total_weight = 0.0;

        for (rule, &weight) in self.rules.iter().zip(&self.weights) {
            if let Some(force) = rule.force(position, neighbours) {
                total_force += force * weight;
                total_weight += weight;
            }
        }

        if total_weight == 0.0 {
            Vector2::zeros()
        } else {
            total_force / total_weight
        }
    }

    /// Neighbour search radius needed to serve every rule.
    pub fn range(&self) -> f64 {
        self.max_range
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the program has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over (rule, weight) pairs in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (&SteeringRule, f64)> {
        self.rules.iter().zip(self.weights.iter().copied())
    }

    /// Returns the rule at `index`.
    pub fn rule(&self, index: usize) -> Option<&SteeringRule> {
        self.rules.get(index)
    }

    /// Mutable access for control commands. Only external parameters
    /// (targets, danger points) may be changed through this.
    pub(crate) fn rule_mut(&mut self, index: usize) -> Option<&mut SteeringRule> {
        self.rules.get_mut(index)
    }

    fn recalc_max_range(&mut self) {
        self.max_range = self
            .rules
            .iter()
            .map(|rule| rule.range())
            .fold(0.0, f64::max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AlignmentRule, AvoidanceRule, CohesionRule, SeparationRule, TargetingRule};
    use crate::spatial::unit_or_zero;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn neighbour(offset: Vector2<f64>) -> NeighbourInfo {
        NeighbourInfo {
            index: 1,
            position: offset,
            forward: Vector2::x(),
            offset,
            distance: offset.norm(),
            direction: unit_or_zero(&offset),
        }
    }

    #[test]
    fn test_max_range_tracks_rules() {
        let mut program = FlockingProgram::new();
        assert_eq!(program.range(), 0.0);

        program.add_rule(TargetingRule::default(), 1.0);
        assert_eq!(program.range(), 0.0);

        program.add_rule(SeparationRule::new(5.0), 1.0);
        program.add_rule(CohesionRule::new(15.0), 1.0);
        program.add_rule(AlignmentRule::new(10.0), 1.0);
        assert_eq!(program.range(), 15.0);
        assert_eq!(program.len(), 4);
    }

    #[test]
    fn test_empty_program_is_zero() {
        let program = FlockingProgram::new();
        assert!(program.is_empty());
        assert_eq!(program.force(&Vector2::zeros(), &[]), Vector2::zeros());
    }

    #[test]
    fn test_weighted_average_of_active_rules() {
        let program = FlockingProgram::new()
            .with_rule(TargetingRule::new(Vector2::new(10.0, 0.0)), 1.0)
            .with_rule(TargetingRule::new(Vector2::new(0.0, 10.0)), 3.0);

        let force = program.force(&Vector2::zeros(), &[]);
        assert_relative_eq!(force, Vector2::new(0.25, 0.75), epsilon = 1e-12);
    }

    #[test]
    fn test_inactive_rules_carry_no_weight() {
        let program = FlockingProgram::new()
            .with_rule(TargetingRule::new(Vector2::new(10.0, 0.0)), 1.0)
            .with_rule(AvoidanceRule::new(Vector2::new(100.0, 0.0), 5.0), 50.0)
            .with_rule(SeparationRule::new(5.0).with_deactivate_on_no_neighbours(true), 2.0);

        // Only targeting fires: full unit magnitude, not diluted
        let force = program.force(&Vector2::zeros(), &[]);
        assert_relative_eq!(force, Vector2::new(1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_active_zero_force_still_dilutes() {
        let program = FlockingProgram::new()
            .with_rule(TargetingRule::new(Vector2::new(10.0, 0.0)), 1.0)
            .with_rule(CohesionRule::new(5.0), 1.0);

        // Cohesion is active with zero force when alone
        let force = program.force(&Vector2::zeros(), &[]);
        assert_relative_eq!(force, Vector2::new(0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_iff_no_rule_active() {
        let program = FlockingProgram::new()
            .with_rule(SeparationRule::new(5.0).with_deactivate_on_no_neighbours(true), 2.0)
            .with_rule(AvoidanceRule::new(Vector2::zeros(), 3.0), 1.0);

        assert_eq!(program.force(&Vector2::new(10.0, 0.0), &[]), Vector2::zeros());

        let ns = [neighbour(Vector2::new(1.0, 0.0))];
        let force = program.force(&Vector2::new(10.0, 0.0), &ns);
        assert!(force.norm() > 0.0);
    }

    proptest! {
        #[test]
        fn prop_force_is_convex_combination(
            targets in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, 0.0f64..5.0), 1..8),
            px in -50.0f64..50.0,
            py in -50.0f64..50.0,
        ) {
            let position = Vector2::new(px, py);
            let mut program = FlockingProgram::new();
            let mut max_norm: f64 = 0.0;
            for &(tx, ty, weight) in &targets {
                let rule = TargetingRule::new(Vector2::new(tx, ty));
                let rule_force = rule.force(&position, &[]).unwrap_or_else(Vector2::zeros);
                max_norm = max_norm.max(rule_force.norm());
                program.add_rule(rule, weight);
            }

            let force = program.force(&position, &[]);
            prop_assert!(force.iter().all(|c| c.is_finite()));
            prop_assert!(force.norm() <= max_norm + 1e-9);
        }
    }
}
