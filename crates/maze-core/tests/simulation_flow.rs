//! End-to-end tests: generate mazes through the state gate, walk them with
//! the robot, and check the structural guarantees hold across seeds and
//! sizes.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::time::Duration;

use maze_agents::StepOutcome;
use maze_core::config::{SimulationConfig, SpeedConfig};
use maze_core::operator::{OperatorState, SimulationEndReason};
use maze_core::runner::{GenerationOutcome, NoOpCallback, run_generation, run_simulation};
use maze_core::simulation::Simulation;
use maze_types::{CellMark, CellRole, Position, SimulationState};
use maze_world::Grid;
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn passage_count(grid: &Grid) -> usize {
    grid.cells().filter(|c| c.is_passage()).count()
}

fn node_count(grid: &Grid) -> usize {
    grid.nodes_per_side() * grid.nodes_per_side()
}

fn instant(max_steps: u64) -> Arc<OperatorState> {
    Arc::new(OperatorState::new(&SpeedConfig {
        speed_percent: 100,
        min_step_interval_ms: 0,
        max_step_interval_ms: 0,
        max_steps,
        max_real_time_seconds: 0,
    }))
}

#[test]
fn generated_mazes_are_spanning_trees() {
    let config = SimulationConfig::default();
    for side in [5, 7, 15, 31] {
        for seed in 0..5 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut sim = Simulation::new(side, config.maze.bounds()).unwrap();
            let endpoints = sim.generate(side, &mut rng).unwrap();
            let grid = sim.grid();

            // Every node open, joined by exactly nodes - 1 wall cells.
            let nodes = node_count(grid);
            assert_eq!(passage_count(grid), 2 * nodes - 1, "side {side} seed {seed}");
            for k in 0..nodes {
                assert!(grid.cell(grid.node_at(k).unwrap()).unwrap().is_passage());
            }

            // Boundary stays wall.
            for (pos, cell) in grid.positioned_cells() {
                if grid.is_edge(pos) {
                    assert!(!cell.is_passage());
                }
            }

            assert_eq!(endpoints.start, Position::new(1, 1));
            assert_eq!(endpoints.end, Position::new(side - 2, side - 2));
            assert_eq!(grid.find_role(CellRole::Start), Some(endpoints.start));
            assert_eq!(grid.find_role(CellRole::End), Some(endpoints.end));
        }
    }
}

#[test]
fn robot_reaches_end_without_revisiting_past_twice() {
    for side in [5, 9, 21, 41] {
        for seed in 10..15 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut sim = Simulation::new(side, Default::default()).unwrap();
            sim.generate(side, &mut rng).unwrap();
            let edges = u64::try_from(passage_count(sim.grid()) - 1).unwrap();
            sim.start().unwrap();

            let mut previous: Vec<CellMark> = sim.grid().cells().map(|c| c.mark()).collect();
            while sim.state() == SimulationState::Running {
                let summary = sim.step(&mut rng).unwrap();
                assert!(matches!(summary.outcome, StepOutcome::Moved { .. }));
                assert_eq!(sim.grid().occupied_positions(), vec![summary.position]);

                let marks: Vec<CellMark> = sim.grid().cells().map(|c| c.mark()).collect();
                for (before, after) in previous.iter().zip(&marks) {
                    assert!(after >= before, "marks only grow");
                }
                previous = marks;
                assert!(sim.steps() <= 2 * edges, "side {side} seed {seed}");
            }
            assert!(sim.is_at_end());
        }
    }
}

#[tokio::test]
async fn full_run_through_the_runner() {
    let config = SimulationConfig::default();
    let side = 25;
    let mut rng = SmallRng::seed_from_u64(2024);
    let mut sim = Simulation::new(side, config.maze.bounds()).unwrap();
    let operator = instant(0);

    let outcome = run_generation(&mut sim, side, &mut rng, &operator, 0)
        .await
        .unwrap();
    let GenerationOutcome::Completed(endpoints) = outcome else {
        panic!("generation did not complete");
    };

    let result = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
        .await
        .unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::ReachedEnd);
    assert_eq!(sim.robot().location(), Some(endpoints.end));

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.state, SimulationState::Stopped);
    assert!(snapshot.at_end);
    assert_eq!(snapshot.steps, result.total_steps);

    sim.reset().unwrap();
    assert_eq!(passage_count(sim.grid()), 0);
}

#[tokio::test]
async fn stop_from_another_task_halts_the_run() {
    let side = 101;
    let mut rng = SmallRng::seed_from_u64(5);
    let mut sim = Simulation::new(side, Default::default()).unwrap();
    sim.generate(side, &mut rng).unwrap();

    let operator = Arc::new(OperatorState::new(&SpeedConfig {
        speed_percent: 100,
        min_step_interval_ms: 5,
        max_step_interval_ms: 5,
        max_steps: 0,
        max_real_time_seconds: 0,
    }));
    let stopper = Arc::clone(&operator);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        stopper.request_stop();
    });

    let result = run_simulation(&mut sim, &mut rng, &operator, &mut NoOpCallback)
        .await
        .unwrap();
    handle.await.unwrap();

    assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
    assert_eq!(sim.state(), SimulationState::Stopped);
    assert!(!sim.is_at_end());

    // The maze survives a stop. A limit already used up runs nothing more.
    let before = sim.steps();
    assert!(before > 0);
    let resumed = run_simulation(&mut sim, &mut rng, &instant(1), &mut NoOpCallback)
        .await
        .unwrap();
    assert_eq!(resumed.end_reason, SimulationEndReason::MaxStepsReached);
    assert_eq!(resumed.total_steps, 0);
    assert_eq!(sim.steps(), before);

    // A higher limit lets the robot carry on from where it stopped.
    let carried = run_simulation(&mut sim, &mut rng, &instant(before + 1), &mut NoOpCallback)
        .await
        .unwrap();
    assert_eq!(carried.end_reason, SimulationEndReason::MaxStepsReached);
    assert_eq!(carried.total_steps, 1);
    assert_eq!(sim.steps(), before + 1);
}
