//! Enumeration types for the maze robot simulator.
//!
//! Cell classification, visitation marks, compass directions, local segment
//! shapes, and the outer simulation state gate.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// Whether a cell blocks or allows movement.
///
/// Mutable while a maze is being generated and fixed afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// Solid cell. Every cell starts as a wall.
    #[default]
    Wall,
    /// Open cell the robot can stand on.
    Passage,
}

/// The special role of a passage cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellRole {
    /// An ordinary cell.
    #[default]
    None,
    /// The cell the robot is placed on after generation.
    Start,
    /// The exit. Reaching it ends navigation.
    End,
}

/// Visitation mark left by the robot on non-junction cells.
///
/// Marks only ever increase: `None` -> `Once` -> `Twice`. A cell marked
/// twice is closed to further traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellMark {
    /// Never visited.
    #[default]
    None,
    /// Visited once.
    Once,
    /// Visited twice; permanently closed.
    Twice,
}

impl CellMark {
    /// The mark that follows this one, or `None` if already at `Twice`.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::None => Some(Self::Once),
            Self::Once => Some(Self::Twice),
            Self::Twice => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A compass direction on the grid. North is row 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0.
    #[default]
    North,
    /// Towards the last column.
    East,
    /// Towards the last row.
    South,
    /// Towards column 0.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting at north.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The direction rotated by 180 degrees.
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Whether `other` lies on the same axis as `self`.
    pub const fn is_opposite(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::North, Self::South)
                | (Self::South, Self::North)
                | (Self::East, Self::West)
                | (Self::West, Self::East)
        )
    }
}

/// Shape of the local 5-cell neighbourhood around the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// Exactly one open neighbour.
    DeadEnd,
    /// Two open neighbours on opposite sides.
    Corridor,
    /// Anything else: turns, forks, crossings.
    Junction,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Lifecycle state of a simulation.
///
/// The state acts as a gate: only one generation may be in flight, and the
/// maze cannot be reset while the robot is moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationState {
    /// Empty grid, ready to generate.
    #[default]
    Default,
    /// A generation run is in progress.
    MazeGenerating,
    /// Maze generated and robot placed on the start cell.
    MazeGenerated,
    /// The robot is being stepped.
    Running,
    /// Stepping halted, either by request or because the robot reached the end.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_advance_until_twice() {
        assert_eq!(CellMark::None.next(), Some(CellMark::Once));
        assert_eq!(CellMark::Once.next(), Some(CellMark::Twice));
        assert_eq!(CellMark::Twice.next(), None);
    }

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert!(dir.is_opposite(dir.opposite()));
            assert!(!dir.is_opposite(dir));
        }
    }

    #[test]
    fn adjacent_directions_are_not_opposite() {
        assert!(!Direction::North.is_opposite(Direction::East));
        assert!(!Direction::West.is_opposite(Direction::South));
    }

    #[test]
    fn defaults_match_fresh_cells() {
        assert_eq!(CellType::default(), CellType::Wall);
        assert_eq!(CellRole::default(), CellRole::None);
        assert_eq!(CellMark::default(), CellMark::None);
        assert_eq!(Direction::default(), Direction::North);
        assert_eq!(SimulationState::default(), SimulationState::Default);
    }
}
