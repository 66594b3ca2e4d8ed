//! Grid, cells, maze generation, and local segments for the maze robot
//! simulator.
//!
//! This crate models the physical maze: a square arena of cells at double
//! resolution, randomized Prim generation over it, and the five-cell local
//! view the robot classifies on every step.
//!
//! # Modules
//!
//! - [`builder`] -- Resumable randomized Prim generation with start/end
//!   assignment.
//! - [`cell`] -- The atomic [`Cell`]: type, role, mark, occupancy.
//! - [`error`] -- Error types, split into input errors and defects.
//! - [`grid`] -- The [`Grid`] arena, size bounds, neighbour and edge
//!   queries, and the `connect` operation.
//! - [`segment`] -- [`LocalSegment`] classification into dead end,
//!   corridor, or junction, and direction choice.

pub mod builder;
pub mod cell;
pub mod error;
pub mod grid;
pub mod segment;

// Re-export primary types at crate root.
pub use builder::{BuildProgress, Endpoints, MazeBuilder};
pub use cell::Cell;
pub use error::WorldError;
pub use grid::{Grid, MIN_SUPPORTED_SIDE_LENGTH, SizeBounds};
pub use segment::{LocalSegment, SegmentSide};
