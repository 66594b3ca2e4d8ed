//! Trémaux navigation for the maze robot simulator.
//!
//! This crate holds the robot: where it stands, which way it faces, and the
//! per-step state machine that marks cells and chooses where to go next.
//!
//! # Modules
//!
//! - [`error`] -- Error types for robot placement and stepping.
//! - [`robot`] -- [`Robot`], its lifecycle [`RobotStatus`], and the
//!   [`StepOutcome`] of each step.

pub mod error;
pub mod robot;

pub use error::AgentError;
pub use robot::{Robot, RobotStatus, StepOutcome};
