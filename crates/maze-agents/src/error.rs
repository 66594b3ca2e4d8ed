//! Error types for the maze-agents crate.
//!
//! Robot operations either reject bad arguments up front (nothing is
//! mutated) or surface a [`WorldError`] defect from the grid, in which case
//! the step must be abandoned.

use maze_types::Position;
use maze_world::WorldError;

/// Errors that can occur while placing or stepping the robot.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The robot was asked to stand somewhere it cannot.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Explanation of the rejected argument.
        reason: String,
    },

    /// The segment passed to `step` was captured around a different cell.
    #[error("segment centred on {actual} but robot is at {expected}")]
    SegmentMismatch {
        /// Where the robot stands.
        expected: Position,
        /// Where the segment was captured.
        actual: Position,
    },

    /// A grid operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

impl AgentError {
    /// Whether this error signals a broken navigation invariant.
    pub const fn is_defect(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } | Self::SegmentMismatch { .. } => false,
            Self::World { source } => source.is_defect(),
        }
    }
}
