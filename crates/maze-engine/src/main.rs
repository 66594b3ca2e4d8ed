//! Maze engine binary.
//!
//! Generates a maze with randomized Prim, walks it with a Trémaux robot, and
//! prints the final grid as text.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `maze-config.yaml` (or `MAZE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Seed the random source (configured seed or a fresh one, logged)
//! 4. Create operator state and hook Ctrl-C to a clean stop
//! 5. Generate the maze cooperatively
//! 6. Step the robot until it reaches End or a boundary is hit
//! 7. Log the result and print the final grid

mod error;
mod progress;
mod render;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use maze_core::config::{LoggingConfig, SimulationConfig};
use maze_core::operator::OperatorState;
use maze_core::runner::{self, GenerationOutcome};
use maze_core::simulation::Simulation;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "maze-config.yaml";

/// Steps between progress reports.
const PROGRESS_REPORT_EVERY: u64 = 100;

/// Application entry point for the maze engine.
///
/// # Errors
///
/// Returns an error if configuration, generation, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run().await?;
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, config_path, found) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        path = %config_path.display(),
        found,
        "maze-engine starting"
    );

    // 3. Seed the random source.
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = SmallRng::seed_from_u64(seed);
    let side_length = config.maze.default_side_length;
    info!(
        seed,
        side_length,
        generation_delay_ms = config.maze.generation_delay_ms,
        speed_percent = config.simulation.speed_percent,
        "Configuration loaded"
    );

    // 4. Operator state and Ctrl-C.
    let operator = Arc::new(OperatorState::new(&config.simulation));
    let stopper = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, requesting stop");
            stopper.request_stop();
        }
    });
    info!(
        max_steps = operator.max_steps(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        step_interval_ms = operator.step_interval_ms(),
        "Operator state initialized"
    );

    // 5. Generate.
    let mut simulation = Simulation::new(side_length, config.maze.bounds())?;
    let generation = runner::run_generation(
        &mut simulation,
        side_length,
        &mut rng,
        &operator,
        config.maze.generation_delay_ms,
    )
    .await?;
    let GenerationOutcome::Completed(endpoints) = generation else {
        info!("Generation cancelled, nothing to run");
        return Ok(());
    };
    info!(
        start = %endpoints.start,
        end = %endpoints.end,
        "Maze ready"
    );

    // 6. Step the robot.
    let mut callback = ProgressCallback::new(PROGRESS_REPORT_EVERY);
    let result =
        runner::run_simulation(&mut simulation, &mut rng, &operator, &mut callback).await?;

    // 7. Report.
    runner::log_simulation_end(&result);
    let frame = render::render(&simulation.snapshot());
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(frame.as_bytes())?;
    stdout.flush()?;

    info!(
        end_reason = ?result.end_reason,
        total_steps = result.total_steps,
        blocked = callback.blocked(),
        elapsed_seconds = operator.elapsed_seconds(),
        "maze-engine shutdown complete"
    );
    Ok(())
}

/// Load the configuration from `MAZE_CONFIG` or `maze-config.yaml`.
///
/// A missing file yields defaults (with environment overrides applied).
/// Returns the config, the path consulted, and whether the file existed.
fn load_config() -> Result<(SimulationConfig, PathBuf, bool), EngineError> {
    let path = std::env::var_os("MAZE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, path, true))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, path, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
