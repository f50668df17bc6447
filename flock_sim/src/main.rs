//! Flock Simulator CLI
//!
//! Run the built-in flocking scenarios, optionally exporting frames.

use clap::Parser;
use flock_sim::{ScenarioId, ScenarioResult, ScenarioRunner, SimConfig};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Frames are captured every this many ticks when exporting
const EXPORT_INTERVAL: u64 = 10;

/// Deterministic flocking simulation CLI
#[derive(Parser, Debug)]
#[command(name = "flock-sim")]
#[command(about = "Run seeded flocking scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of drones for population scenarios
    #[arg(short = 'n', long, default_value = "1000")]
    drones: usize,

    /// Worker threads (0 = one per core)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Spatial grid cell size
    #[arg(long, default_value = "15")]
    cell_size: f64,

    /// Scenario to run (separation_pair, target_seek, grid_filter, cohesion_contract, predator_chase, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Simulated duration in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Flock Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
                eprintln!("Available scenarios: {}, all", names.join(", "));
                std::process::exit(1);
            }
        }
    };

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let config = SimConfig {
        seed,
        num_drones: args.drones,
        workers: args.workers,
        cell_size: args.cell_size,
        duration_secs: args.duration,
        ..Default::default()
    };
    let runner = ScenarioRunner::new(config);

    if let Some(export_path) = &args.export {
        if scenarios.len() > 1 {
            eprintln!("Error: --export only supports a single scenario, not 'all'");
            std::process::exit(1);
        }
        run_with_export(&runner, scenarios[0], export_path);
        return;
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for scenario in &scenarios {
        let result = match runner.run(*scenario) {
            Ok(result) => result,
            Err(e) => {
                error!("✗ {} could not run: {}", scenario.name(), e);
                failed_count += 1;
                continue;
            }
        };

        if !args.json {
            if result.passed {
                info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
            } else {
                error!(
                    "✗ {} (seed={}) FAILED: {}",
                    scenario.name(),
                    seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }

        if !result.passed {
            failed_count += 1;
        }
        all_results.push(result);
    }

    let total = scenarios.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "drones": r.final_stats.count,
                    "spread": r.final_stats.spread,
                    "mean_speed": r.final_stats.mean_speed,
                    "mean_tick_us": r.metrics.mean_tick_us,
                    "max_tick_us": r.metrics.max_tick_us,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario.name(),
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}

/// Runs one scenario with frame capture and writes the export.
fn run_with_export(runner: &ScenarioRunner, scenario: ScenarioId, export_path: &str) {
    info!("Running with export to: {}", export_path);

    let (result, export) = match runner.run_recorded(scenario, EXPORT_INTERVAL) {
        Ok(recorded) => recorded,
        Err(e) => {
            error!("✗ {} could not run: {}", scenario.name(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = export.write_to_file(export_path) {
        error!("Failed to write export: {}", e);
        std::process::exit(1);
    }
    info!("Exported {} frames to {}", export.frames.len(), export_path);

    if result.passed {
        info!("✓ {} (seed={}) PASSED", scenario.name(), result.seed);
    } else {
        error!(
            "✗ {} FAILED: {}",
            scenario.name(),
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
        std::process::exit(1);
    }
}
