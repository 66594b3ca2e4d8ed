//! Grid coordinates.
//!
//! A [`Position`] is a `(row, col)` pair inside a square grid. All offset
//! arithmetic is checked; stepping off the grid yields `None` rather than
//! wrapping.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::Direction;

/// A cell coordinate in a square grid. Row 0 is the northern edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index, increasing southwards.
    pub row: usize,
    /// Column index, increasing eastwards.
    pub col: usize,
}

impl Position {
    /// Create a position from a row and a column.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Recover a position from a row-major index.
    ///
    /// Returns `None` if `side_length` is zero or the index lies outside
    /// a `side_length x side_length` grid.
    pub fn from_index(index: usize, side_length: usize) -> Option<Self> {
        let row = index.checked_div(side_length)?;
        let col = index.checked_rem(side_length)?;
        (row < side_length).then_some(Self { row, col })
    }

    /// Row-major index of this position in a grid of the given side length.
    ///
    /// Returns `None` if the position is outside the grid or the index
    /// would overflow.
    pub fn index(self, side_length: usize) -> Option<usize> {
        if self.row >= side_length || self.col >= side_length {
            return None;
        }
        self.row.checked_mul(side_length)?.checked_add(self.col)
    }

    /// The position `distance` cells away in `direction`.
    ///
    /// Returns `None` when the result would leave a grid of the given side
    /// length.
    pub fn offset(self, direction: Direction, distance: usize, side_length: usize) -> Option<Self> {
        let moved = match direction {
            Direction::North => Self::new(self.row.checked_sub(distance)?, self.col),
            Direction::South => Self::new(self.row.checked_add(distance)?, self.col),
            Direction::West => Self::new(self.row, self.col.checked_sub(distance)?),
            Direction::East => Self::new(self.row, self.col.checked_add(distance)?),
        };
        (moved.row < side_length && moved.col < side_length).then_some(moved)
    }

    /// The direction and distance from `self` to `other` if both lie on the
    /// same row or column and differ.
    pub const fn direction_to(self, other: Self) -> Option<(Direction, usize)> {
        if self.row == other.row {
            if other.col > self.col {
                return Some((Direction::East, other.col.abs_diff(self.col)));
            }
            if other.col < self.col {
                return Some((Direction::West, self.col.abs_diff(other.col)));
            }
            return None;
        }
        if self.col == other.col {
            if other.row > self.row {
                return Some((Direction::South, other.row.abs_diff(self.row)));
            }
            return Some((Direction::North, self.row.abs_diff(other.row)));
        }
        None
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_through_from_index() {
        let pos = Position::new(3, 7);
        let idx = pos.index(11);
        assert_eq!(idx, Some(40));
        assert_eq!(Position::from_index(40, 11), Some(pos));
    }

    #[test]
    fn index_rejects_out_of_grid() {
        assert_eq!(Position::new(11, 0).index(11), None);
        assert_eq!(Position::new(0, 11).index(11), None);
        assert_eq!(Position::from_index(121, 11), None);
        assert_eq!(Position::from_index(0, 0), None);
    }

    #[test]
    fn offset_stays_inside_grid() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.offset(Direction::North, 1, 5), None);
        assert_eq!(corner.offset(Direction::West, 1, 5), None);
        assert_eq!(corner.offset(Direction::South, 2, 5), Some(Position::new(2, 0)));
        assert_eq!(corner.offset(Direction::East, 4, 5), Some(Position::new(0, 4)));
        assert_eq!(corner.offset(Direction::East, 5, 5), None);
    }

    #[test]
    fn direction_to_detects_axis_and_distance() {
        let a = Position::new(3, 3);
        assert_eq!(a.direction_to(Position::new(1, 3)), Some((Direction::North, 2)));
        assert_eq!(a.direction_to(Position::new(3, 5)), Some((Direction::East, 2)));
        assert_eq!(a.direction_to(Position::new(4, 3)), Some((Direction::South, 1)));
        assert_eq!(a.direction_to(Position::new(3, 0)), Some((Direction::West, 3)));
        assert_eq!(a.direction_to(Position::new(5, 5)), None);
        assert_eq!(a.direction_to(a), None);
    }
}
