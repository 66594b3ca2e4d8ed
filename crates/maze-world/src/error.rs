//! Error types for the `maze-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. The variants
//! fall into two classes: recoverable input errors (bad configuration, bad
//! arguments) and defects, which mean an algorithm invariant was broken and
//! the operation must be abandoned. [`WorldError::is_defect`] tells them
//! apart.

use maze_types::{CellRole, Position};

/// Errors that can occur during grid, generation, and segment operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The requested grid size is not supported.
    #[error("invalid grid configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the size.
        reason: String,
    },

    /// A required argument was absent or unusable.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Explanation of the rejected argument.
        reason: String,
    },

    /// Two cells passed to `connect` are not exactly two steps apart.
    #[error("cannot connect {from} to {to}: cells are not two steps apart")]
    InvalidTopology {
        /// First node cell.
        from: Position,
        /// Second node cell.
        to: Position,
    },

    /// A position lies outside the grid.
    #[error("position {0} is outside the grid")]
    CellOutOfBounds(Position),

    /// A cell already marked twice was marked again.
    #[error("cell {0} is already marked twice")]
    MarkOverflow(Position),

    /// A role was assigned to a cell that already has one.
    #[error("cell {position} already has role {role:?}")]
    RoleAlreadyAssigned {
        /// The cell.
        position: Position,
        /// The role it already holds.
        role: CellRole,
    },

    /// A role was assigned to a wall cell.
    #[error("cannot assign a role to wall cell {0}")]
    RoleOnWall(Position),

    /// A segment that must have an open side has none.
    #[error("segment centred on {0} has no passage neighbours")]
    NoPassageNeighbours(Position),

    /// Arithmetic overflow during a checked grid computation.
    #[error("arithmetic overflow in grid calculation")]
    ArithmeticOverflow,
}

impl WorldError {
    /// Whether this error signals a broken algorithm invariant rather than
    /// bad caller input.
    pub const fn is_defect(&self) -> bool {
        !matches!(self, Self::InvalidConfig { .. } | Self::InvalidArgument { .. })
    }
}
