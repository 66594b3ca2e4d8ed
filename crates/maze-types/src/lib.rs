//! Shared type definitions for the maze robot simulator.
//!
//! Every crate in the workspace speaks in these types: the world crate stores
//! them in cells, the agents crate reasons about them, and the core crate
//! projects them into snapshots for whatever sits on top.
//!
//! # Modules
//!
//! - [`enums`] -- Cell type, role and mark, compass directions, segment
//!   shapes and the simulation state gate
//! - [`position`] -- Checked `(row, col)` grid coordinates
//! - [`view`] -- Read-only per-cell projection for renderers

pub mod enums;
pub mod position;
pub mod view;

// Re-export all public types at crate root for convenience.
pub use enums::{CellMark, CellRole, CellType, Direction, SegmentType, SimulationState};
pub use position::Position;
pub use view::CellView;
