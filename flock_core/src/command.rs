//! Control commands applied between ticks.
//!
//! Rendering/input collaborators steer the simulation by moving the external
//! points some rules react to. Commands need `&mut Flock`, so they can never
//! race a tick in progress.

use crate::error::{FlockError, Result};
use crate::program::{FlockingProgram, ProgramId};
use crate::rules::SteeringRule;

use nalgebra::Vector2;

/// An update to an externally driven rule parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Move the target of a targeting rule
    SetTarget {
        program: ProgramId,
        rule: usize,
        target: Vector2<f64>,
    },

    /// Move the danger point of an avoidance rule
    SetAvoidPoint {
        program: ProgramId,
        rule: usize,
        point: Vector2<f64>,
    },

    /// Replace the danger points of a multi-avoidance rule
    SetAvoidPoints {
        program: ProgramId,
        rule: usize,
        points: Vec<Vector2<f64>>,
    },
}

impl ControlCommand {
    /// Program the command is addressed to.
    pub fn program(&self) -> ProgramId {
        match self {
            ControlCommand::SetTarget { program, .. }
            | ControlCommand::SetAvoidPoint { program, .. }
            | ControlCommand::SetAvoidPoints { program, .. } => *program,
        }
    }

    /// Writes the new parameter into the addressed rule.
    pub(crate) fn apply_to(self, programs: &mut [FlockingProgram]) -> Result<()> {
        let program_id = self.program();
        let program = programs
            .get_mut(program_id.0)
            .ok_or(FlockError::UnknownProgram(program_id.0))?;

        match self {
            ControlCommand::SetTarget { rule, target, .. } => match lookup(program, program_id, rule)? {
                SteeringRule::Targeting(r) => r.target = target,
                other => return Err(mismatch(rule, other, "targeting")),
            },
            ControlCommand::SetAvoidPoint { rule, point, .. } => match lookup(program, program_id, rule)? {
                SteeringRule::Avoidance(r) => r.target = point,
                other => return Err(mismatch(rule, other, "avoidance")),
            },
            ControlCommand::SetAvoidPoints { rule, points, .. } => match lookup(program, program_id, rule)? {
                SteeringRule::MultiAvoidance(r) => r.targets = points,
                other => return Err(mismatch(rule, other, "multi_avoidance")),
            },
        }
        Ok(())
    }
}

fn lookup(program: &mut FlockingProgram, id: ProgramId, rule: usize) -> Result<&mut SteeringRule> {
    program.rule_mut(rule).ok_or(FlockError::UnknownRule {
        program: id.0,
        rule,
    })
}

fn mismatch(rule: usize, found: &SteeringRule, expected: &'static str) -> FlockError {
    FlockError::RuleMismatch {
        rule,
        actual: found.name(),
        expected,
    }
}
