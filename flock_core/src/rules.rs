//! Steering rules.
//!
//! A rule turns the observer's position and its neighbour list into an
//! optional steering direction. `None` means the rule is inactive for this
//! call: it then carries no weight in the program's blend, which is different
//! from an active rule returning the zero vector.
//!
//! Neighbour lists are always sorted nearest first, so range-limited rules
//! stop at the first neighbour beyond their range.

use crate::spatial::{unit_or_x_axis, NeighbourInfo};

use nalgebra::Vector2;

/// The two operations every steering rule provides.
pub trait Steering {
    /// Computes the rule's steering direction, or `None` if inactive.
    fn force(&self, position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>>;

    /// Radius of neighbours this rule looks at (0 for rules that ignore them).
    fn range(&self) -> f64;
}

/// Neighbours of a sorted list that lie within `range`.
fn within(neighbours: &[NeighbourInfo], range: f64) -> impl Iterator<Item = &NeighbourInfo> {
    neighbours.iter().take_while(move |n| n.distance <= range)
}

/// Steer away from nearby drones.
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationRule {
    /// Neighbours closer than this are avoided
    pub range: f64,

    /// Report inactive rather than zero force when nobody is in range
    pub deactivate_on_no_neighbours: bool,

    /// Only steer away from the single closest neighbour
    pub only_closest: bool,
}

impl SeparationRule {
    /// Creates a separation rule over all neighbours in `range`.
    pub fn new(range: f64) -> Self {
        Self {
            range,
            deactivate_on_no_neighbours: false,
            only_closest: false,
        }
    }

    /// Sets whether the rule goes inactive with no neighbours in range.
    pub fn with_deactivate_on_no_neighbours(mut self, deactivate: bool) -> Self {
        self.deactivate_on_no_neighbours = deactivate;
        self
    }

    /// Sets whether only the closest neighbour is considered.
    pub fn with_only_closest(mut self, only_closest: bool) -> Self {
        self.only_closest = only_closest;
        self
    }
}

impl Steering for SeparationRule {
    fn force(&self, _position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        let limit = if self.only_closest { 1 } else { usize::MAX };
        let total: Vector2<f64> = within(neighbours, self.range)
            .take(limit)
            .map(|n| -n.direction)
            .sum();

        match total.try_normalize(0.0) {
            Some(dir) => Some(dir),
            None => (!self.deactivate_on_no_neighbours).then(Vector2::zeros),
        }
    }

    fn range(&self) -> f64 {
        self.range
    }
}

/// Match heading with nearby drones.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRule {
    /// Neighbours within this range are matched
    pub range: f64,

    /// Always output a unit vector. Otherwise the summed headings are
    /// divided by the length of the whole neighbour list.
    pub normalise: bool,

    /// Report inactive rather than zero force when nobody is in range
    pub deactivate_on_no_neighbours: bool,
}

impl AlignmentRule {
    /// Creates an unnormalised alignment rule.
    pub fn new(range: f64) -> Self {
        Self {
            range,
            normalise: false,
            deactivate_on_no_neighbours: false,
        }
    }

    /// Sets unit-length output.
    pub fn with_normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    /// Sets whether the rule goes inactive with no neighbours in range.
    pub fn with_deactivate_on_no_neighbours(mut self, deactivate: bool) -> Self {
        self.deactivate_on_no_neighbours = deactivate;
        self
    }
}

impl Steering for AlignmentRule {
    fn force(&self, _position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        let total: Vector2<f64> = within(neighbours, self.range).map(|n| n.forward).sum();

        if total.norm() > 0.0 {
            if self.normalise {
                Some(total.normalize())
            } else {
                // Divides by every candidate, not only the ones in range
                Some(total / neighbours.len() as f64)
            }
        } else {
            (!self.deactivate_on_no_neighbours).then(Vector2::zeros)
        }
    }

    fn range(&self) -> f64 {
        self.range
    }
}

/// Steer toward nearby drones.
#[derive(Debug, Clone, PartialEq)]
pub struct CohesionRule {
    /// Neighbours within this range attract
    pub range: f64,

    /// Report inactive rather than zero force when nobody is in range
    pub deactivate_on_no_neighbours: bool,
}

impl CohesionRule {
    /// Creates a cohesion rule.
    pub fn new(range: f64) -> Self {
        Self {
            range,
            deactivate_on_no_neighbours: false,
        }
    }

    /// Sets whether the rule goes inactive with no neighbours in range.
    pub fn with_deactivate_on_no_neighbours(mut self, deactivate: bool) -> Self {
        self.deactivate_on_no_neighbours = deactivate;
        self
    }
}

impl Steering for CohesionRule {
    fn force(&self, _position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        let total: Vector2<f64> = within(neighbours, self.range).map(|n| n.direction).sum();

        match total.try_normalize(0.0) {
            Some(dir) => Some(dir),
            None => (!self.deactivate_on_no_neighbours).then(Vector2::zeros),
        }
    }

    fn range(&self) -> f64 {
        self.range
    }
}

/// Pure attraction toward an externally driven point.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetingRule {
    /// Point to steer toward
    pub target: Vector2<f64>,
}

impl TargetingRule {
    /// Creates a targeting rule.
    pub fn new(target: Vector2<f64>) -> Self {
        Self { target }
    }
}

impl Default for TargetingRule {
    fn default() -> Self {
        Self::new(Vector2::zeros())
    }
}

impl Steering for TargetingRule {
    fn force(&self, position: &Vector2<f64>, _neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        // +x when sitting on the target
        Some(unit_or_x_axis(&(self.target - position)))
    }

    fn range(&self) -> f64 {
        0.0
    }
}

/// Flee a single danger point once inside a threshold distance.
#[derive(Debug, Clone, PartialEq)]
pub struct AvoidanceRule {
    /// Point to keep away from
    pub target: Vector2<f64>,

    /// Rule is active only strictly closer than this
    pub threshold: f64,
}

impl AvoidanceRule {
    /// Creates an avoidance rule.
    pub fn new(target: Vector2<f64>, threshold: f64) -> Self {
        Self { target, threshold }
    }
}

impl Steering for AvoidanceRule {
    fn force(&self, position: &Vector2<f64>, _neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        let away = position - self.target;
        (away.norm() < self.threshold).then(|| unit_or_x_axis(&away))
    }

    fn range(&self) -> f64 {
        0.0
    }
}

/// Flee every danger point within a threshold distance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiAvoidanceRule {
    /// Points to keep away from
    pub targets: Vec<Vector2<f64>>,

    /// Points count only strictly closer than this
    pub threshold: f64,
}

impl MultiAvoidanceRule {
    /// Creates a multi-point avoidance rule.
    pub fn new(targets: Vec<Vector2<f64>>, threshold: f64) -> Self {
        Self { targets, threshold }
    }
}

impl Steering for MultiAvoidanceRule {
    fn force(&self, position: &Vector2<f64>, _neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        let total: Vector2<f64> = self
            .targets
            .iter()
            .map(|target| position - target)
            .filter(|away| away.norm() < self.threshold)
            .map(|away| unit_or_x_axis(&away))
            .sum();

        total.try_normalize(0.0)
    }

    fn range(&self) -> f64 {
        0.0
    }
}

/// Every rule a flocking program can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum SteeringRule {
    Separation(SeparationRule),
    Alignment(AlignmentRule),
    Cohesion(CohesionRule),
    Targeting(TargetingRule),
    Avoidance(AvoidanceRule),
    MultiAvoidance(MultiAvoidanceRule),
}

impl SteeringRule {
    /// Returns the variant name (for logging and error messages).
    pub fn name(&self) -> &'static str {
        match self {
            SteeringRule::Separation(_) => "separation",
            SteeringRule::Alignment(_) => "alignment",
            SteeringRule::Cohesion(_) => "cohesion",
            SteeringRule::Targeting(_) => "targeting",
            SteeringRule::Avoidance(_) => "avoidance",
            SteeringRule::MultiAvoidance(_) => "multi_avoidance",
        }
    }

    fn as_steering(&self) -> &dyn Steering {
        match self {
            SteeringRule::Separation(r) => r,
            SteeringRule::Alignment(r) => r,
            SteeringRule::Cohesion(r) => r,
            SteeringRule::Targeting(r) => r,
            SteeringRule::Avoidance(r) => r,
            SteeringRule::MultiAvoidance(r) => r,
        }
    }
}

impl Steering for SteeringRule {
    fn force(&self, position: &Vector2<f64>, neighbours: &[NeighbourInfo]) -> Option<Vector2<f64>> {
        self.as_steering().force(position, neighbours)
    }

    fn range(&self) -> f64 {
        self.as_steering().range()
    }
}

impl From<SeparationRule> for SteeringRule {
    fn from(rule: SeparationRule) -> Self {
        SteeringRule::Separation(rule)
    }
}

impl From<AlignmentRule> for SteeringRule {
    fn from(rule: AlignmentRule) -> Self {
        SteeringRule::Alignment(rule)
    }
}

impl From<CohesionRule> for SteeringRule {
    fn from(rule: CohesionRule) -> Self {
        SteeringRule::Cohesion(rule)
    }
}

impl From<TargetingRule> for SteeringRule {
    fn from(rule: TargetingRule) -> Self {
        SteeringRule::Targeting(rule)
    }
}

impl From<AvoidanceRule> for SteeringRule {
    fn from(rule: AvoidanceRule) -> Self {
        SteeringRule::Avoidance(rule)
    }
}

impl From<MultiAvoidanceRule> for SteeringRule {
    fn from(rule: MultiAvoidanceRule) -> Self {
        SteeringRule::MultiAvoidance(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::unit_or_zero;
    use approx::assert_relative_eq;

    /// Observation of a neighbour at `offset` moving with `velocity`, seen from the origin.
    fn neighbour(index: usize, offset: Vector2<f64>, velocity: Vector2<f64>) -> NeighbourInfo {
        NeighbourInfo {
            index,
            position: offset,
            forward: unit_or_x_axis(&velocity),
            offset,
            distance: offset.norm(),
            direction: unit_or_zero(&offset),
        }
    }

    fn origin() -> Vector2<f64> {
        Vector2::zeros()
    }

    #[test]
    fn test_separation_pushes_away() {
        let rule = SeparationRule::new(5.0);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(0.0, 2.0), Vector2::zeros()),
        ];

        let force = rule.force(&origin(), &ns).unwrap();
        let expected = Vector2::new(-1.0, -1.0).normalize();
        assert_relative_eq!(force, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_separation_only_closest() {
        let rule = SeparationRule::new(5.0).with_only_closest(true);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(0.0, 2.0), Vector2::zeros()),
        ];

        let force = rule.force(&origin(), &ns).unwrap();
        assert_relative_eq!(force, Vector2::new(-1.0, 0.0));
    }

    #[test]
    fn test_separation_stops_at_range() {
        let rule = SeparationRule::new(1.5);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(0.0, 2.0), Vector2::zeros()),
        ];

        let force = rule.force(&origin(), &ns).unwrap();
        assert_relative_eq!(force, Vector2::new(-1.0, 0.0));
    }

    #[test]
    fn test_separation_no_neighbours_policy() {
        let active = SeparationRule::new(5.0);
        let inactive = SeparationRule::new(5.0).with_deactivate_on_no_neighbours(true);

        assert_eq!(active.force(&origin(), &[]), Some(Vector2::zeros()));
        assert_eq!(inactive.force(&origin(), &[]), None);

        // Out-of-range neighbours count as none
        let far = [neighbour(1, Vector2::new(9.0, 0.0), Vector2::zeros())];
        assert_eq!(inactive.force(&origin(), &far), None);
    }

    #[test]
    fn test_separation_cancelling_neighbours() {
        let rule = SeparationRule::new(5.0).with_deactivate_on_no_neighbours(true);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(-1.0, 0.0), Vector2::zeros()),
        ];

        let force = rule.force(&origin(), &ns);
        assert_eq!(force, None);
    }

    #[test]
    fn test_alignment_normalised() {
        let rule = AlignmentRule::new(10.0).with_normalise(true);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::new(3.0, 0.0)),
            neighbour(2, Vector2::new(2.0, 0.0), Vector2::new(0.0, 7.0)),
        ];

        let force = rule.force(&origin(), &ns).unwrap();
        assert_relative_eq!(force, Vector2::new(1.0, 1.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn test_alignment_divides_by_full_list_length() {
        let rule = AlignmentRule::new(5.0);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::new(0.0, 4.0)),
            neighbour(2, Vector2::new(2.0, 0.0), Vector2::new(0.0, 1.0)),
            neighbour(3, Vector2::new(8.0, 0.0), Vector2::new(1.0, 0.0)),
            neighbour(4, Vector2::new(9.0, 0.0), Vector2::new(1.0, 0.0)),
        ];

        // Two neighbours in range, four in the list
        let force = rule.force(&origin(), &ns).unwrap();
        assert_relative_eq!(force, Vector2::new(0.0, 0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_alignment_stationary_neighbours() {
        // Resting neighbours head along +x and keep the rule active
        let plain = AlignmentRule::new(5.0);
        let deactivating = AlignmentRule::new(5.0).with_deactivate_on_no_neighbours(true);
        let ns = [
            neighbour(1, Vector2::new(1.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(2.0, 0.0), Vector2::zeros()),
        ];

        assert_eq!(plain.force(&origin(), &ns), Some(Vector2::new(1.0, 0.0)));
        assert_eq!(deactivating.force(&origin(), &ns), Some(Vector2::new(1.0, 0.0)));
        assert_eq!(deactivating.force(&origin(), &ns[..0]), None);
    }

    #[test]
    fn test_cohesion_pulls_toward_neighbours() {
        let rule = CohesionRule::new(15.0);
        let ns = [
            neighbour(1, Vector2::new(3.0, 0.0), Vector2::zeros()),
            neighbour(2, Vector2::new(0.0, 10.0), Vector2::zeros()),
        ];

        let force = rule.force(&origin(), &ns).unwrap();
        assert_relative_eq!(force, Vector2::new(1.0, 1.0).normalize(), epsilon = 1e-12);
        assert_eq!(rule.range(), 15.0);
    }

    #[test]
    fn test_cohesion_no_neighbours() {
        let rule = CohesionRule::new(15.0);
        assert_eq!(rule.force(&origin(), &[]), Some(Vector2::zeros()));

        let rule = rule.with_deactivate_on_no_neighbours(true);
        assert_eq!(rule.force(&origin(), &[]), None);
    }

    #[test]
    fn test_targeting() {
        let rule = TargetingRule::new(Vector2::new(10.0, 0.0));
        let force = rule.force(&Vector2::new(0.0, 0.0), &[]).unwrap();
        assert_relative_eq!(force, Vector2::new(1.0, 0.0));
        assert_eq!(rule.range(), 0.0);
    }

    #[test]
    fn test_targeting_on_target_heads_along_x() {
        let rule = TargetingRule::new(Vector2::new(2.0, 2.0));
        let force = rule.force(&Vector2::new(2.0, 2.0), &[]).unwrap();
        assert_eq!(force, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_avoidance_threshold_is_strict() {
        let rule = AvoidanceRule::new(Vector2::new(0.0, 0.0), 25.0);

        let inside = rule.force(&Vector2::new(0.0, 24.0), &[]).unwrap();
        assert_relative_eq!(inside, Vector2::new(0.0, 1.0));

        assert_eq!(rule.force(&Vector2::new(0.0, 25.0), &[]), None);
        assert_eq!(rule.force(&Vector2::new(30.0, 0.0), &[]), None);
    }

    #[test]
    fn test_avoidance_at_danger_point() {
        let rule = AvoidanceRule::new(Vector2::new(3.0, -1.0), 25.0);
        let force = rule.force(&Vector2::new(3.0, -1.0), &[]);
        assert_eq!(force, Some(Vector2::new(1.0, 0.0)));

        // A zero threshold never fires, not even on the point
        let rule = AvoidanceRule::new(Vector2::new(3.0, -1.0), 0.0);
        assert_eq!(rule.force(&Vector2::new(3.0, -1.0), &[]), None);
    }

    #[test]
    fn test_multi_avoidance_coincident_point() {
        let rule = MultiAvoidanceRule::new(vec![Vector2::zeros()], 5.0);
        assert_eq!(rule.force(&origin(), &[]), Some(Vector2::new(1.0, 0.0)));

        // Coincident point plus one below: (1, 0) + (0, 1)
        let rule = MultiAvoidanceRule::new(vec![Vector2::zeros(), Vector2::new(0.0, -2.0)], 5.0);
        let force = rule.force(&origin(), &[]).unwrap();
        assert_relative_eq!(force, Vector2::new(1.0, 1.0).normalize(), epsilon = 1e-12);
        assert!(force.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_multi_avoidance_sums_points_in_threshold() {
        let rule = MultiAvoidanceRule::new(
            vec![Vector2::new(-1.0, 0.0), Vector2::new(0.0, -1.0), Vector2::new(50.0, 0.0)],
            5.0,
        );

        let force = rule.force(&origin(), &[]).unwrap();
        assert_relative_eq!(force, Vector2::new(1.0, 1.0).normalize(), epsilon = 1e-12);
    }

    #[test]
    fn test_multi_avoidance_inactive_when_cancelled_or_empty() {
        let cancelled = MultiAvoidanceRule::new(vec![Vector2::new(-1.0, 0.0), Vector2::new(1.0, 0.0)], 5.0);
        assert_eq!(cancelled.force(&origin(), &[]), None);

        let empty = MultiAvoidanceRule::default();
        assert_eq!(empty.force(&origin(), &[]), None);
    }

    #[test]
    fn test_enum_dispatch() {
        let rule: SteeringRule = SeparationRule::new(5.0).into();
        assert_eq!(rule.name(), "separation");
        assert_eq!(rule.range(), 5.0);

        let rule: SteeringRule = AvoidanceRule::new(Vector2::zeros(), 3.0).into();
        assert_eq!(rule.range(), 0.0);
        assert!(rule.force(&Vector2::new(1.0, 0.0), &[]).is_some());
    }
}
