//! The square cell arena.
//!
//! A [`Grid`] owns a row-major array of `side_length * side_length` cells.
//! Everything else in the workspace refers to cells by [`Position`], never by
//! reference, so the robot, the builder, and any renderer can coexist without
//! aliasing.
//!
//! The grid is double resolution: maze nodes sit on odd `(row, col)`
//! coordinates and a single wall cell separates each pair of neighbouring
//! nodes. The outer ring of cells is always wall. For that parity to hold the
//! side length must be odd, which [`SizeBounds::validate`] enforces.

use maze_types::{CellMark, CellRole, CellView, Direction, Position};

use crate::cell::Cell;
use crate::error::WorldError;

/// Smallest side length that still contains more than one maze node.
pub const MIN_SUPPORTED_SIDE_LENGTH: usize = 5;

/// Inclusive bounds on the grid side length, supplied by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBounds {
    /// Smallest accepted side length.
    pub min: usize,
    /// Largest accepted side length.
    pub max: usize,
}

impl SizeBounds {
    /// Create bounds from an inclusive minimum and maximum.
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Check a requested side length against these bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the length is outside the
    /// bounds, below [`MIN_SUPPORTED_SIDE_LENGTH`], or even.
    pub fn validate(&self, side_length: usize) -> Result<(), WorldError> {
        if side_length < self.min || side_length > self.max {
            return Err(WorldError::InvalidConfig {
                reason: format!(
                    "side length {side_length} is outside {}..={}",
                    self.min, self.max
                ),
            });
        }
        if side_length < MIN_SUPPORTED_SIDE_LENGTH {
            return Err(WorldError::InvalidConfig {
                reason: format!(
                    "side length {side_length} is below the minimum of {MIN_SUPPORTED_SIDE_LENGTH}"
                ),
            });
        }
        if side_length.is_multiple_of(2) {
            return Err(WorldError::InvalidConfig {
                reason: format!("side length {side_length} must be odd"),
            });
        }
        Ok(())
    }
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self::new(MIN_SUPPORTED_SIDE_LENGTH, 101)
    }
}

/// Fixed-size square arena of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Number of cells along each side.
    side_length: usize,
    /// Row-major cell storage, `index = row * side_length + col`.
    cells: Vec<Cell>,
}

impl Grid {
    /// Allocate an all-wall grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if `side_length` fails
    /// [`SizeBounds::validate`], or [`WorldError::ArithmeticOverflow`] if
    /// the cell count does not fit in `usize`.
    pub fn new(side_length: usize, bounds: &SizeBounds) -> Result<Self, WorldError> {
        bounds.validate(side_length)?;
        let count = side_length
            .checked_mul(side_length)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(Self {
            side_length,
            cells: vec![Cell::wall(); count],
        })
    }

    /// Reallocate every cell as a fresh wall, possibly at a new size.
    ///
    /// Nothing is mutated if validation fails.
    ///
    /// # Errors
    ///
    /// Same as [`Grid::new`].
    pub fn reset(&mut self, side_length: usize, bounds: &SizeBounds) -> Result<(), WorldError> {
        *self = Self::new(side_length, bounds)?;
        Ok(())
    }

    /// Turn every cell back into a fresh wall, keeping the current size.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::wall());
    }

    // -------------------------------------------------------------------
    // Shape queries
    // -------------------------------------------------------------------

    /// Number of cells along each side.
    pub const fn side_length(&self) -> usize {
        self.side_length
    }

    /// Total number of cells.
    pub const fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether the position lies inside the grid.
    pub const fn contains(&self, pos: Position) -> bool {
        pos.row < self.side_length && pos.col < self.side_length
    }

    /// Whether the position lies on the outer boundary ring.
    pub fn is_edge(&self, pos: Position) -> bool {
        let last = self.side_length.saturating_sub(1);
        pos.row == 0 || pos.col == 0 || pos.row == last || pos.col == last
    }

    /// Whether the position is a maze node: interior, odd row, odd column.
    pub fn is_node(&self, pos: Position) -> bool {
        self.contains(pos)
            && !self.is_edge(pos)
            && !pos.row.is_multiple_of(2)
            && !pos.col.is_multiple_of(2)
    }

    /// Number of maze nodes along each side.
    pub const fn nodes_per_side(&self) -> usize {
        self.side_length / 2
    }

    /// Position of the `k`-th node in row-major node order.
    pub fn node_at(&self, k: usize) -> Option<Position> {
        let per_side = self.nodes_per_side();
        let node_row = k.checked_div(per_side)?;
        let node_col = k.checked_rem(per_side)?;
        if node_row >= per_side {
            return None;
        }
        let row = node_row.checked_mul(2)?.checked_add(1)?;
        let col = node_col.checked_mul(2)?.checked_add(1)?;
        Some(Position::new(row, col))
    }

    // -------------------------------------------------------------------
    // Cell access
    // -------------------------------------------------------------------

    /// The cell at a position, if inside the grid.
    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos.index(self.side_length)?)
    }

    /// Iterate over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Iterate over `(position, cell)` pairs in row-major order.
    pub fn positioned_cells(&self) -> impl Iterator<Item = (Position, &Cell)> {
        let side = self.side_length;
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            Position::from_index(idx, side).map(|pos| (pos, cell))
        })
    }

    /// Read-only projection of every cell, row-major.
    pub fn views(&self) -> Vec<CellView> {
        self.cells.iter().map(Cell::view).collect()
    }

    /// First position (in row-major order) holding the given role.
    pub fn find_role(&self, role: CellRole) -> Option<Position> {
        self.positioned_cells()
            .find(|(_, cell)| cell.role() == role)
            .map(|(pos, _)| pos)
    }

    /// All positions whose cell is flagged as occupied.
    pub fn occupied_positions(&self) -> Vec<Position> {
        self.positioned_cells()
            .filter(|(_, cell)| cell.is_occupied())
            .map(|(pos, _)| pos)
            .collect()
    }

    fn cell_mut(&mut self, pos: Position) -> Result<&mut Cell, WorldError> {
        let idx = pos
            .index(self.side_length)
            .ok_or(WorldError::CellOutOfBounds(pos))?;
        self.cells
            .get_mut(idx)
            .ok_or(WorldError::CellOutOfBounds(pos))
    }

    // -------------------------------------------------------------------
    // Neighbour queries
    // -------------------------------------------------------------------

    /// The position `offset` steps away in `direction`, if inside the grid.
    pub fn neighbour(&self, pos: Position, direction: Direction, offset: usize) -> Option<Position> {
        pos.offset(direction, offset, self.side_length)
    }

    /// Neighbours `offset` steps away, omitting directions that leave the grid.
    ///
    /// `offset = 1` gives the direct neighbours used when stepping the robot;
    /// `offset = 2` gives the neighbouring maze nodes used during generation.
    pub fn neighbours(&self, pos: Position, offset: usize) -> Vec<(Direction, Position)> {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbour(pos, dir, offset).map(|n| (dir, n)))
            .collect()
    }

    // -------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------

    /// Turn a cell into a passage.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellOutOfBounds`] if the position is outside the grid.
    pub fn open(&mut self, pos: Position) -> Result<(), WorldError> {
        self.cell_mut(pos)?.open();
        Ok(())
    }

    /// Open the single wall cell midway between two nodes two steps apart.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidTopology`] if the cells are not exactly two
    /// steps apart on one axis or either lies outside the grid.
    pub fn connect(&mut self, from: Position, to: Position) -> Result<(), WorldError> {
        let topology = WorldError::InvalidTopology { from, to };
        if !self.contains(from) || !self.contains(to) {
            return Err(topology);
        }
        let Some((direction, 2)) = from.direction_to(to) else {
            return Err(topology);
        };
        let Some(midpoint) = self.neighbour(from, direction, 1) else {
            return Err(topology);
        };
        self.open(midpoint)
    }

    /// Give a passage cell the start or end role.
    ///
    /// Assigning [`CellRole::None`] is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RoleOnWall`] for wall cells and
    /// [`WorldError::RoleAlreadyAssigned`] if the cell already has a role.
    pub fn assign_role(&mut self, pos: Position, role: CellRole) -> Result<(), WorldError> {
        if role == CellRole::None {
            return Ok(());
        }
        let cell = self.cell_mut(pos)?;
        if !cell.is_passage() {
            return Err(WorldError::RoleOnWall(pos));
        }
        if cell.role() != CellRole::None {
            return Err(WorldError::RoleAlreadyAssigned {
                position: pos,
                role: cell.role(),
            });
        }
        cell.set_role(role);
        Ok(())
    }

    /// Advance a cell's visitation mark and return the new mark.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MarkOverflow`] if the cell is already marked twice.
    pub fn mark(&mut self, pos: Position) -> Result<CellMark, WorldError> {
        self.cell_mut(pos)?
            .advance_mark()
            .ok_or(WorldError::MarkOverflow(pos))
    }

    /// Set or clear the occupancy flag on a cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellOutOfBounds`] if the position is outside the grid.
    pub fn set_occupied(&mut self, pos: Position, occupied: bool) -> Result<(), WorldError> {
        self.cell_mut(pos)?.set_occupied(occupied);
        Ok(())
    }
}
