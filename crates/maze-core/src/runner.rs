//! Async loops that drive generation and robot stepping under operator
//! control.
//!
//! - [`run_generation`] runs Prim iterations cooperatively, pausing for the
//!   configured generation delay (or yielding) between iterations, and
//!   cancels cleanly if a stop is requested.
//! - [`run_simulation`] steps the robot at the operator's current interval
//!   until it reaches End, a boundary is hit, or the operator stops it.

use std::sync::Arc;

use maze_world::Endpoints;
use rand::Rng;
use tracing::{info, warn};

use crate::operator::{OperatorState, SimulationEndReason};
use crate::simulation::{GenerationProgress, Simulation, SimulationError, StepSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A simulation command failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },
}

/// How a generation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The maze is complete.
    Completed(Endpoints),
    /// The operator stopped generation; the grid was cleared.
    Cancelled,
}

/// Result of a stepping run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the run ended.
    pub end_reason: SimulationEndReason,
    /// The last step summary, if any step completed.
    pub final_summary: Option<StepSummary>,
    /// Number of steps executed by this run.
    pub total_steps: u64,
}

/// Callback invoked after each step completes.
///
/// Implementations can redraw the maze, stream summaries, and so on.
pub trait StepCallback: Send {
    /// Called after a step completes successfully.
    fn on_step(&mut self, summary: &StepSummary, simulation: &Simulation);
}

/// A no-op step callback.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _simulation: &Simulation) {}
}

/// Generate a maze one frontier iteration at a time.
///
/// Between iterations the loop honours pause, checks for a stop request,
/// and sleeps `delay_ms` (yielding when zero) so other tasks stay live.
///
/// # Errors
///
/// Returns [`RunnerError`] if generation cannot begin (wrong state or bad
/// side length) or hits a defect, in which case the grid has already been
/// discarded.
pub async fn run_generation<R: Rng + ?Sized>(
    simulation: &mut Simulation,
    side_length: usize,
    rng: &mut R,
    operator: &Arc<OperatorState>,
    delay_ms: u64,
) -> Result<GenerationOutcome, RunnerError> {
    simulation.begin_generation(side_length, rng)?;

    loop {
        if operator.is_paused() {
            info!("Generation paused, waiting for resume...");
            operator.wait_if_paused().await;
        }

        if operator.is_stop_requested() {
            simulation.cancel_generation()?;
            return Ok(GenerationOutcome::Cancelled);
        }

        if let GenerationProgress::Complete(endpoints) = simulation.advance_generation(rng)? {
            return Ok(GenerationOutcome::Completed(endpoints));
        }

        if delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

/// Step the robot until a termination condition is met.
///
/// Starts the simulation if it is not already running. On operator stop or
/// a boundary the simulation is left in `Stopped`; reaching End stops it
/// automatically. The operator's wall clock restarts when the run begins.
///
/// # Errors
///
/// Returns [`RunnerError`] if the simulation cannot be started or a step
/// fails with a defect.
pub async fn run_simulation<R: Rng + ?Sized>(
    simulation: &mut Simulation,
    rng: &mut R,
    operator: &Arc<OperatorState>,
    callback: &mut dyn StepCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<StepSummary> = None;
    let mut total_steps: u64 = 0;

    if !simulation.can_stop() {
        simulation.start()?;
    }
    operator.restart_clock();

    info!(
        max_steps = operator.max_steps(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        step_interval_ms = operator.step_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            return finish(
                simulation,
                operator,
                SimulationEndReason::OperatorStop,
                last_summary,
                total_steps,
            )
            .await;
        }

        // --- Check time limit ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            return finish(
                simulation,
                operator,
                SimulationEndReason::MaxRealTimeReached,
                last_summary,
                total_steps,
            )
            .await;
        }

        // --- Check step limit (counted since generation) ---
        if operator.step_limit_reached(simulation.steps()) {
            info!(
                step = simulation.steps(),
                max_steps = operator.max_steps(),
                "Step limit reached"
            );
            return finish(
                simulation,
                operator,
                SimulationEndReason::MaxStepsReached,
                last_summary,
                total_steps,
            )
            .await;
        }

        // --- Execute step ---
        let summary = simulation.step(rng)?;
        total_steps = total_steps.saturating_add(1);
        callback.on_step(&summary, simulation);

        if summary.at_end {
            return finish(
                simulation,
                operator,
                SimulationEndReason::ReachedEnd,
                Some(summary),
                total_steps,
            )
            .await;
        }

        last_summary = Some(summary);

        // --- Sleep for step interval ---
        let interval_ms = operator.step_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

async fn finish(
    simulation: &mut Simulation,
    operator: &Arc<OperatorState>,
    end_reason: SimulationEndReason,
    final_summary: Option<StepSummary>,
    total_steps: u64,
) -> Result<SimulationResult, RunnerError> {
    if simulation.can_stop() {
        simulation.stop()?;
    }
    operator.set_end_reason(end_reason).await;
    Ok(SimulationResult {
        end_reason,
        final_summary,
        total_steps,
    })
}

/// Log how a stepping run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_steps = result.total_steps,
        final_step = result.final_summary.as_ref().map(|s| s.step),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            step = summary.step,
            position = %summary.position,
            direction = ?summary.direction,
            at_end = summary.at_end,
            "Final step summary"
        );
    } else {
        warn!("Simulation ended with no steps executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maze_types::SimulationState;
    use maze_world::SizeBounds;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::SpeedConfig;

    fn fast_operator(max_steps: u64) -> Arc<OperatorState> {
        Arc::new(OperatorState::new(&SpeedConfig {
            speed_percent: 100,
            min_step_interval_ms: 0,
            max_step_interval_ms: 0,
            max_steps,
            max_real_time_seconds: 0,
        }))
    }

    async fn generated(side: usize, seed: u64) -> (Simulation, SmallRng) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut sim = Simulation::new(side, SizeBounds::default()).unwrap();
        let outcome = run_generation(&mut sim, side, &mut rng, &fast_operator(0), 0)
            .await
            .unwrap();
        assert!(matches!(outcome, GenerationOutcome::Completed(_)));
        (sim, rng)
    }

    #[tokio::test]
    async fn generation_completes() {
        let (sim, _) = generated(21, 4).await;
        assert_eq!(sim.state(), SimulationState::MazeGenerated);
        assert!(sim.robot().location().is_some());
    }

    #[tokio::test]
    async fn generation_cancelled_by_stop() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut sim = Simulation::new(21, SizeBounds::default()).unwrap();
        let operator = fast_operator(0);
        operator.request_stop();
        let outcome = run_generation(&mut sim, 21, &mut rng, &operator, 0)
            .await
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Cancelled);
        assert_eq!(sim.state(), SimulationState::Default);
        assert!(sim.grid().cells().all(|c| !c.is_passage()));
    }

    #[tokio::test]
    async fn generation_rejects_bad_side_length() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut sim = Simulation::new(21, SizeBounds::default()).unwrap();
        let result = run_generation(&mut sim, 8, &mut rng, &fast_operator(0), 0).await;
        assert!(result.is_err());
        assert_eq!(sim.state(), SimulationState::Default);
    }

    #[tokio::test]
    async fn runs_until_end() {
        let (mut sim, mut rng) = generated(15, 9).await;
        let operator = fast_operator(0);
        let result = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::ReachedEnd);
        assert!(result.final_summary.unwrap().at_end);
        assert_eq!(result.total_steps, sim.steps());
        assert_eq!(sim.state(), SimulationState::Stopped);
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::ReachedEnd)
        );
    }

    #[tokio::test]
    async fn bounded_by_max_steps() {
        let (mut sim, mut rng) = generated(41, 9).await;
        let result = run_simulation(&mut sim, &mut rng, &fast_operator(3), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxStepsReached);
        assert_eq!(result.total_steps, 3);
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[tokio::test]
    async fn resuming_at_step_limit_runs_no_further_steps() {
        let (mut sim, mut rng) = generated(41, 9).await;
        let operator = fast_operator(3);
        run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(sim.steps(), 3);

        let again = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(again.end_reason, SimulationEndReason::MaxStepsReached);
        assert_eq!(again.total_steps, 0);
        assert!(again.final_summary.is_none());
        assert_eq!(sim.steps(), 3);
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[tokio::test]
    async fn raised_step_limit_continues_up_to_it() {
        let (mut sim, mut rng) = generated(41, 9).await;
        run_simulation(&mut sim, &mut rng, &fast_operator(3), &mut NoOpCallback)
            .await
            .unwrap();
        let more = run_simulation(&mut sim, &mut rng, &fast_operator(5), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(more.end_reason, SimulationEndReason::MaxStepsReached);
        assert_eq!(more.total_steps, 2);
        assert_eq!(sim.steps(), 5);
    }

    #[tokio::test]
    async fn time_limit_starts_with_stepping() {
        let operator = Arc::new(OperatorState::new(&SpeedConfig {
            speed_percent: 100,
            min_step_interval_ms: 0,
            max_step_interval_ms: 0,
            max_steps: 0,
            max_real_time_seconds: 1,
        }));
        let (mut sim, mut rng) = generated(15, 9).await;
        // Time spent before stepping (generation, setup) is not charged.
        tokio::time::sleep(tokio::time::Duration::from_millis(1100)).await;
        assert!(operator.time_limit_reached());

        let result = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::ReachedEnd);
        assert!(sim.is_at_end());
    }

    #[tokio::test]
    async fn operator_stop() {
        let (mut sim, mut rng) = generated(11, 1).await;
        let operator = fast_operator(0);
        operator.request_stop();
        let result = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_steps, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(sim.state(), SimulationState::Stopped);
    }

    #[tokio::test]
    async fn step_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl StepCallback for CountCallback {
            fn on_step(&mut self, _summary: &StepSummary, _simulation: &Simulation) {
                self.count = self.count.saturating_add(1);
            }
        }

        let (mut sim, mut rng) = generated(11, 2).await;
        let mut cb = CountCallback { count: 0 };
        let result = run_simulation(&mut sim, &mut rng, &fast_operator(0), &mut cb)
            .await
            .unwrap();
        assert_eq!(cb.count, result.total_steps);
    }

    #[tokio::test]
    async fn restart_after_end_is_rejected() {
        let (mut sim, mut rng) = generated(9, 3).await;
        let operator = fast_operator(0);
        run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        let again = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback).await;
        assert!(matches!(
            again,
            Err(RunnerError::Simulation {
                source: SimulationError::InvalidTransition { .. }
            })
        ));
    }
}
