//! Scenario runner - executes the built-in flocking scenarios.
//!
//! Every scenario builds its own population, ticks it for the configured
//! duration and then checks the contract it was written to exercise.

use crate::config::SimConfig;
use crate::controller::PredatorController;
use crate::error::{Result, SimError};
use crate::exporter::{SimExport, SimFrame};
use crate::presets::{flock_program, predator_program, FLOCK_SPEED_RANGE, PREDATOR_MAX_SPEED};
use crate::scenarios::ScenarioId;
use crate::spawn::{Spawner, DRONE_MAX_ACCELERATION};

use flock_core::{
    CohesionRule, Drone, Flock, FlockStats, FlockingProgram, ProgramId, SeparationRule,
    TargetingRule,
};
use nalgebra::Vector2;
use std::time::Instant;
use tracing::{debug, info};

/// Slack allowed on speed-cap comparisons
const SPEED_EPSILON: f64 = 1e-9;

/// Minimum simulated seconds for scenarios whose contract needs time to show
const SETTLE_SECS: f64 = 1.0;
const COHESION_SECS: f64 = 10.0;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Population statistics at the end
    pub final_stats: FlockStats,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Mean wall-clock duration of a tick (µs)
    pub mean_tick_us: f64,

    /// Slowest tick (µs)
    pub max_tick_us: u64,

    /// Control commands applied between ticks
    pub commands_applied: u64,

    /// Worker threads used by the flock
    pub workers: usize,
}

/// Frame capture during a recorded run.
struct Recorder {
    interval: u64,
    export: SimExport,
}

impl Recorder {
    fn observe(&mut self, flock: &Flock) {
        if flock.tick_count() % self.interval == 0 {
            self.export
                .add_frame(SimFrame::capture(flock.tick_count(), flock.time_secs(), flock.drones()));
        }
    }
}

/// Per-run bookkeeping shared by every scenario.
struct Session {
    metrics: ScenarioMetrics,
    total_tick_us: u64,
    failure: Option<String>,
    recorder: Option<Recorder>,
}

impl Session {
    fn new(recorder: Option<Recorder>) -> Self {
        Self {
            metrics: ScenarioMetrics::default(),
            total_tick_us: 0,
            failure: None,
            recorder,
        }
    }

    fn start(&mut self, flock: &Flock) {
        self.metrics.workers = flock.workers();
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.observe(flock);
        }
    }

    /// Ticks once, timing the tick and capturing a frame if due.
    fn step(&mut self, flock: &mut Flock) {
        let started = Instant::now();
        flock.tick();
        let elapsed = started.elapsed().as_micros() as u64;

        self.total_tick_us += elapsed;
        self.metrics.max_tick_us = self.metrics.max_tick_us.max(elapsed);

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.observe(flock);
        }
    }

    /// Records a failure. Only the first one is reported.
    fn fail(&mut self, reason: String) {
        if self.failure.is_none() {
            debug!("Check failed: {}", reason);
            self.failure = Some(reason);
        }
    }

    fn finish(mut self, scenario: ScenarioId, seed: u64, flock: &Flock) -> (ScenarioResult, Option<SimExport>) {
        let ticks = flock.tick_count();
        if ticks > 0 {
            self.metrics.mean_tick_us = self.total_tick_us as f64 / ticks as f64;
        }

        let passed = self.failure.is_none();
        let final_stats = flock.stats();
        let export = self.recorder.map(|mut recorder| {
            recorder.export.finalize(passed, final_stats.clone());
            recorder.export
        });

        let result = ScenarioResult {
            scenario,
            seed,
            passed,
            total_ticks: ticks,
            final_time_secs: flock.time_secs(),
            final_stats,
            failure_reason: self.failure,
            metrics: self.metrics,
        };
        (result, export)
    }
}

/// Runs flocking scenarios.
pub struct ScenarioRunner {
    config: SimConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(config: SimConfig) -> Self {
        Self { config }
    }

    /// Sets the simulated duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.config.duration_secs = secs;
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the population of scenarios that take it from the config.
    pub fn with_population(mut self, num_drones: usize) -> Self {
        self.config.num_drones = num_drones;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runs a scenario and returns the result.
    ///
    /// # Errors
    /// Fails if the scenario cannot be set up. A scenario that runs but
    /// breaks its contract is reported through [`ScenarioResult::passed`].
    pub fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult> {
        self.execute(scenario, None).map(|(result, _)| result)
    }

    /// Runs a scenario, capturing a frame every `interval` ticks.
    pub fn run_recorded(&self, scenario: ScenarioId, interval: u64) -> Result<(ScenarioResult, SimExport)> {
        let recorder = Recorder {
            interval: interval.max(1),
            export: SimExport::new(scenario.name(), self.config.seed, self.config.tick_rate_hz),
        };
        let (result, export) = self.execute(scenario, Some(recorder))?;
        let export = export.unwrap_or_else(|| {
            SimExport::new(scenario.name(), self.config.seed, self.config.tick_rate_hz)
        });
        Ok((result, export))
    }

    fn execute(&self, scenario: ScenarioId, recorder: Option<Recorder>) -> Result<(ScenarioResult, Option<SimExport>)> {
        info!(
            "Starting scenario: {} (seed={}, {})",
            scenario.name(),
            self.config.seed,
            scenario.description()
        );

        let mut session = Session::new(recorder);
        let flock = match scenario {
            ScenarioId::SeparationPair => self.run_separation_pair(&mut session)?,
            ScenarioId::TargetSeek => self.run_target_seek(&mut session)?,
            ScenarioId::GridFilter => self.run_grid_filter(&mut session)?,
            ScenarioId::CohesionContract => self.run_cohesion_contract(&mut session)?,
            ScenarioId::PredatorChase => self.run_predator_chase(&mut session)?,
        };

        let (result, export) = session.finish(scenario, self.config.seed, &flock);
        info!(
            "Scenario {} finished: {} ticks, {:.1}µs/tick, passed={}",
            scenario.name(),
            result.total_ticks,
            result.metrics.mean_tick_us,
            result.passed
        );
        Ok((result, export))
    }

    /// Configured tick count, raised to cover at least `min_secs`.
    fn ticks_at_least(&self, min_secs: f64) -> u64 {
        let min_ticks = (min_secs * self.config.tick_rate_hz).round() as u64;
        self.config.total_ticks().max(min_ticks)
    }

    /// Two drones 3 apart with separation range 5.
    ///
    /// **Assertion**: after one tick they head apart; at the end they are
    /// out of each other's range.
    fn run_separation_pair(&self, session: &mut Session) -> Result<Flock> {
        let drones = vec![
            still(Vector2::new(0.0, 0.0), 10.0),
            still(Vector2::new(3.0, 0.0), 10.0),
        ];
        let program = FlockingProgram::new().with_rule(SeparationRule::new(5.0), 1.0);
        let mut flock = Flock::new(drones, vec![program], self.config.flock_config())?;
        session.start(&flock);

        session.step(&mut flock);
        let (left, right) = (flock.drones()[0].velocity.x, flock.drones()[1].velocity.x);
        if !(left < 0.0 && right > 0.0) {
            session.fail(format!("Drones did not separate: vx = ({:.3}, {:.3})", left, right));
        }

        for _ in 1..self.ticks_at_least(SETTLE_SECS) {
            session.step(&mut flock);
        }

        let distance = (flock.drones()[1].position - flock.drones()[0].position).norm();
        if distance <= 5.0 {
            session.fail(format!("Final distance {:.3} still inside separation range", distance));
        }
        Ok(flock)
    }

    /// A lone drone seeking (10, 0) from rest.
    ///
    /// **Assertion**: first-tick velocity is `accel / tick_rate` along +x and
    /// the speed never exceeds the cap.
    fn run_target_seek(&self, session: &mut Session) -> Result<Flock> {
        let max_speed = 10.0;
        let drones = vec![still(Vector2::zeros(), max_speed)];
        let program = FlockingProgram::new().with_rule(TargetingRule::new(Vector2::new(10.0, 0.0)), 1.0);
        let mut flock = Flock::new(drones, vec![program], self.config.flock_config())?;
        session.start(&flock);

        let expected = Vector2::new(DRONE_MAX_ACCELERATION / self.config.tick_rate_hz, 0.0);
        for tick in 0..self.config.total_ticks() {
            session.step(&mut flock);
            let drone = &flock.drones()[0];

            if tick == 0 && (drone.velocity - expected).norm() > 1e-9 {
                session.fail(format!(
                    "First tick velocity ({:.4}, {:.4}) expected ({:.4}, 0)",
                    drone.velocity.x, drone.velocity.y, expected.x
                ));
            }
            if drone.speed() > max_speed + SPEED_EPSILON {
                session.fail(format!("Speed {:.4} exceeds cap at tick {}", drone.speed(), tick + 1));
            }
        }
        Ok(flock)
    }

    /// Cell 15, drones 20 apart, cohesion range 10 that deactivates.
    ///
    /// **Assertion**: nobody sees a neighbour, so every force is zero and no
    /// drone moves.
    fn run_grid_filter(&self, session: &mut Session) -> Result<Flock> {
        let start = [Vector2::new(0.0, 0.0), Vector2::new(20.0, 0.0)];
        let drones = start.iter().map(|p| still(*p, 10.0)).collect();
        let program = FlockingProgram::new()
            .with_rule(CohesionRule::new(10.0).with_deactivate_on_no_neighbours(true), 1.0);
        let config = self.config.flock_config().with_cell_size(15.0);
        let mut flock = Flock::new(drones, vec![program], config)?;
        session.start(&flock);

        for tick in 0..self.config.total_ticks() {
            session.step(&mut flock);

            if let Some(force) = flock.last_forces().iter().find(|f| f.norm() != 0.0) {
                session.fail(format!("Non-zero force ({:.3}, {:.3}) at tick {}", force.x, force.y, tick + 1));
            }
            let moved = flock
                .drones()
                .iter()
                .zip(start.iter())
                .any(|(drone, origin)| drone.position != *origin);
            if moved {
                session.fail(format!("Drone moved at tick {}", tick + 1));
            }
        }
        Ok(flock)
    }

    /// A hundred drones at rest, cohesion only, everyone in range.
    ///
    /// **Assertion**: spread falls below half its start value while the
    /// centroid moves less than 0.3 × the initial spread.
    fn run_cohesion_contract(&self, session: &mut Session) -> Result<Flock> {
        let mut spawner = Spawner::new(self.config.seed, 50.0);
        let drones = (0..100).map(|_| spawner.still_drone(ProgramId(0), 10.0)).collect();
        let program = FlockingProgram::new().with_rule(CohesionRule::new(150.0), 1.0);
        let config = self
            .config
            .flock_config()
            .with_cell_size(50.0)
            .with_max_neighbours(100);
        let mut flock = Flock::new(drones, vec![program], config)?;
        session.start(&flock);

        let initial = flock.stats();
        for tick in 0..self.ticks_at_least(COHESION_SECS) {
            session.step(&mut flock);
            if tick % 60 == 0 {
                debug!("  t={:.1}s | spread={:.2}", flock.time_secs(), flock.stats().spread);
            }
        }

        let last = flock.stats();
        if last.spread >= 0.5 * initial.spread {
            session.fail(format!(
                "Spread {:.2} did not halve from {:.2}",
                last.spread, initial.spread
            ));
        }
        let drift = (last.centroid - initial.centroid).norm();
        if drift >= 0.3 * initial.spread {
            session.fail(format!("Centroid drifted {:.2}", drift));
        }
        Ok(flock)
    }

    /// Predator chase over the configured population.
    ///
    /// **Assertion**: every drone stays finite and under its own speed cap.
    fn run_predator_chase(&self, session: &mut Session) -> Result<Flock> {
        let population = self.config.num_drones;
        if population < 2 {
            return Err(SimError::PopulationTooSmall {
                scenario: ScenarioId::PredatorChase.name(),
                required: 2,
                actual: population,
            });
        }

        let flock_id = ProgramId(0);
        let predator_id = ProgramId(1);
        let mut spawner = Spawner::new(
            self.config.seed.wrapping_mul(0x9e3779b97f4a7c15),
            self.config.spawn_radius,
        );

        let mut drones = Vec::with_capacity(population);
        drones.push(spawner.drone(predator_id, PREDATOR_MAX_SPEED));
        for _ in 1..population {
            let max_speed = spawner.uniform(FLOCK_SPEED_RANGE.0, FLOCK_SPEED_RANGE.1);
            drones.push(spawner.drone(flock_id, max_speed));
        }

        let mut flock = Flock::new(
            drones,
            vec![flock_program(), predator_program()],
            self.config.flock_config(),
        )?;
        let mut controller = PredatorController::new(self.config.seed, population, flock_id, predator_id);
        session.start(&flock);

        for tick in 0..self.config.total_ticks() {
            session.metrics.commands_applied += controller.steer(&mut flock)? as u64;
            session.step(&mut flock);

            let bad = flock.drones().iter().position(|d| {
                !(d.position.iter().all(|v| v.is_finite()) && d.velocity.iter().all(|v| v.is_finite()))
                    || d.speed() > d.max_speed + SPEED_EPSILON
            });
            if let Some(index) = bad {
                session.fail(format!("Drone #{} invalid at tick {}", index, tick + 1));
            }

            if tick % 60 == 0 {
                let stats = flock.stats();
                debug!(
                    "  t={:.1}s | prey=#{} | spread={:.1} | mean speed={:.2}",
                    flock.time_secs(),
                    controller.prey(),
                    stats.spread,
                    stats.mean_speed
                );
            }
        }
        Ok(flock)
    }
}

/// A drone at rest running program 0.
fn still(position: Vector2<f64>, max_speed: f64) -> Drone {
    Drone::new(position, Vector2::zeros(), max_speed, DRONE_MAX_ACCELERATION, ProgramId(0))
}
