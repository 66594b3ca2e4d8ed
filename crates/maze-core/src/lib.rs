//! Simulation orchestration for the maze robot simulator.
//!
//! This crate ties the grid, the maze builder, and the Trémaux robot into a
//! single state-gated simulation and provides the control plane around it.
//!
//! # Modules
//!
//! - [`clock`] -- Step counter with checked arithmetic.
//! - [`config`] -- Configuration loading from `maze-config.yaml` into
//!   strongly-typed structs.
//! - [`operator`] -- Pause, resume, speed, and stop controls shared with the
//!   run loops.
//! - [`runner`] -- Async generation and stepping loops.
//! - [`simulation`] -- [`Simulation`] state gate and [`MazeSnapshot`]
//!   projection.
//!
//! [`Simulation`]: simulation::Simulation
//! [`MazeSnapshot`]: simulation::MazeSnapshot

pub mod clock;
pub mod config;
pub mod operator;
pub mod runner;
pub mod simulation;
