//! The atomic grid unit.
//!
//! A [`Cell`] knows nothing about where it sits; the owning
//! [`Grid`](crate::Grid) performs all position-aware checks and exposes the
//! only public mutation paths. Inside this crate the setters are plain.

use maze_types::{CellMark, CellRole, CellType, CellView};

/// One square of the maze.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    /// Wall or passage.
    cell_type: CellType,
    /// Start, end, or none. Only ever set on passages.
    role: CellRole,
    /// Trémaux visitation mark.
    mark: CellMark,
    /// Whether the robot stands here.
    occupied: bool,
}

impl Cell {
    /// A fresh wall cell with no role, no mark, and no occupant.
    pub const fn wall() -> Self {
        Self {
            cell_type: CellType::Wall,
            role: CellRole::None,
            mark: CellMark::None,
            occupied: false,
        }
    }

    /// Wall or passage.
    pub const fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Start, end, or none.
    pub const fn role(&self) -> CellRole {
        self.role
    }

    /// Current visitation mark.
    pub const fn mark(&self) -> CellMark {
        self.mark
    }

    /// Whether the robot stands here.
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Shorthand for `cell_type() == CellType::Passage`.
    pub const fn is_passage(&self) -> bool {
        matches!(self.cell_type, CellType::Passage)
    }

    /// Project the cell into a renderer-facing view.
    pub const fn view(&self) -> CellView {
        CellView {
            cell_type: self.cell_type,
            role: self.role,
            mark: self.mark,
            occupied: self.occupied,
        }
    }

    pub(crate) const fn open(&mut self) {
        self.cell_type = CellType::Passage;
    }

    pub(crate) const fn set_role(&mut self, role: CellRole) {
        self.role = role;
    }

    pub(crate) const fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }

    /// Advance the mark one level. Returns `None` if it is already `Twice`.
    pub(crate) fn advance_mark(&mut self) -> Option<CellMark> {
        let next = self.mark.next()?;
        self.mark = next;
        Some(next)
    }
}
