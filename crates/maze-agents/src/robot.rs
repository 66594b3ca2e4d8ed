//! The maze-solving robot.
//!
//! [`Robot`] walks the maze with Trémaux's algorithm. Each step it is handed
//! a [`LocalSegment`] captured around its cell and:
//!
//! 1. marks its cell unless the segment is a junction,
//! 2. picks a new facing from the segment (straight on in corridors, the only
//!    opening in dead ends, unexplored then half-explored branches at
//!    junctions, otherwise back the way it came),
//! 3. moves one cell that way unless the target is a wall or marked twice,
//!    in which case it stays put for this step.
//!
//! Marks cap at twice, so every passage is walked at most once in each
//! direction and the robot reaches the end within twice the number of
//! passage edges.
//!
//! The robot stores only a [`Position`]; the grid owns the cells and the
//! occupancy flags. After [`Robot::place`] exactly one cell is occupied.

use maze_types::{CellMark, CellRole, Direction, Position, SegmentType};
use maze_world::{Grid, LocalSegment};
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::error::AgentError;

/// Where the robot is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RobotStatus {
    /// Not in the maze.
    Unplaced,
    /// In the maze, still looking for the exit.
    Navigating,
    /// Standing on the end cell. Further steps do nothing.
    AtEnd,
}

/// What a single [`Robot::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StepOutcome {
    /// Nothing happened: the robot is unplaced or already at the end.
    Idle,
    /// The robot moved one cell.
    Moved {
        /// Cell left.
        from: Position,
        /// Cell entered.
        to: Position,
        /// Direction of travel.
        direction: Direction,
    },
    /// The chosen neighbour was closed, so the robot stayed put.
    Blocked {
        /// Cell the robot remains on.
        at: Position,
        /// Direction it tried to move.
        direction: Direction,
    },
}

/// A robot that navigates a maze one cell per step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Robot {
    /// Current cell, or `None` before placement.
    location: Option<Position>,
    /// Current facing.
    direction: Direction,
    /// Steps that did something (moved or blocked).
    steps_taken: u64,
}

impl Robot {
    /// Create an unplaced robot facing north.
    pub const fn new() -> Self {
        Self {
            location: None,
            direction: Direction::North,
            steps_taken: 0,
        }
    }

    /// Current cell, if placed.
    pub const fn location(&self) -> Option<Position> {
        self.location
    }

    /// Current facing.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of steps that moved or attempted to move.
    pub const fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Lifecycle status, read from the role of the occupied cell.
    pub fn status(&self, grid: &Grid) -> RobotStatus {
        match self.location {
            None => RobotStatus::Unplaced,
            Some(pos) => {
                if grid.cell(pos).is_some_and(|c| c.role() == CellRole::End) {
                    RobotStatus::AtEnd
                } else {
                    RobotStatus::Navigating
                }
            }
        }
    }

    /// Shorthand for `status(grid) == RobotStatus::AtEnd`.
    pub fn is_at_end(&self, grid: &Grid) -> bool {
        self.status(grid) == RobotStatus::AtEnd
    }

    /// Put the robot on a passage cell, vacating any cell it held before.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidArgument`] if the position is outside the
    /// grid or not a passage. Nothing is mutated in that case.
    pub fn place(&mut self, grid: &mut Grid, pos: Position) -> Result<(), AgentError> {
        let Some(cell) = grid.cell(pos) else {
            return Err(AgentError::InvalidArgument {
                reason: format!("cannot place robot at {pos}: outside the grid"),
            });
        };
        if !cell.is_passage() {
            return Err(AgentError::InvalidArgument {
                reason: format!("cannot place robot at {pos}: cell is a wall"),
            });
        }
        if let Some(previous) = self.location {
            grid.set_occupied(previous, false)?;
        }
        grid.set_occupied(pos, true)?;
        self.location = Some(pos);
        debug!(%pos, direction = ?self.direction, "Robot placed");
        Ok(())
    }

    /// Take the robot out of the maze.
    ///
    /// # Errors
    ///
    /// Returns a world error if the held position is no longer inside the grid.
    pub fn remove(&mut self, grid: &mut Grid) -> Result<(), AgentError> {
        if let Some(pos) = self.location.take() {
            grid.set_occupied(pos, false)?;
            debug!(%pos, "Robot removed");
        }
        Ok(())
    }

    /// Forget the current cell without touching the grid.
    ///
    /// Used when the grid has already been cleared or replaced wholesale.
    pub const fn detach(&mut self) {
        self.location = None;
    }

    /// Advance one Trémaux step.
    ///
    /// The robot stays in place, reporting [`StepOutcome::Blocked`], when the
    /// cell it turns toward is a wall or already marked twice.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::SegmentMismatch`] if the segment was not captured
    /// around the robot's cell. Any world error returned is a defect (a mark
    /// overflow or a segment with no openings) and the maze should be
    /// discarded.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        segment: &LocalSegment,
        rng: &mut R,
    ) -> Result<StepOutcome, AgentError> {
        let Some(current) = self.location else {
            return Ok(StepOutcome::Idle);
        };
        if self.is_at_end(grid) {
            return Ok(StepOutcome::Idle);
        }
        if segment.center() != current {
            return Err(AgentError::SegmentMismatch {
                expected: current,
                actual: segment.center(),
            });
        }

        if segment.segment_type() != SegmentType::Junction {
            let mark = grid.mark(current)?;
            trace!(%current, ?mark, "Cell marked");
        }

        self.direction = segment.choose_direction(self.direction, rng)?;
        self.steps_taken = self.steps_taken.saturating_add(1);

        let target = segment.side(self.direction);
        let destination = target
            .position
            .filter(|_| target.is_passage() && target.mark != CellMark::Twice);

        let Some(next) = destination else {
            warn!(
                at = %current,
                direction = ?self.direction,
                "Robot blocked, staying in place"
            );
            grid.set_occupied(current, true)?;
            return Ok(StepOutcome::Blocked {
                at: current,
                direction: self.direction,
            });
        };

        grid.set_occupied(current, false)?;
        grid.set_occupied(next, true)?;
        self.location = Some(next);
        trace!(from = %current, to = %next, direction = ?self.direction, "Robot moved");
        Ok(StepOutcome::Moved {
            from: current,
            to: next,
            direction: self.direction,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use maze_world::{MazeBuilder, SizeBounds, WorldError};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn blank(side: usize) -> Grid {
        Grid::new(side, &SizeBounds::default()).unwrap()
    }

    /// A 5x5 grid with the given cells opened.
    fn grid_with(open: &[(usize, usize)]) -> Grid {
        let mut g = blank(5);
        for &(r, c) in open {
            g.open(Position::new(r, c)).unwrap();
        }
        g
    }

    fn step_once(robot: &mut Robot, grid: &mut Grid, rng: &mut SmallRng) -> StepOutcome {
        let seg = LocalSegment::around(grid, robot.location().unwrap()).unwrap();
        robot.step(grid, &seg, rng).unwrap()
    }

    /// Count pairs of orthogonally adjacent passage cells.
    fn passage_edges(grid: &Grid) -> u64 {
        let mut edges = 0;
        for (pos, cell) in grid.positioned_cells() {
            if !cell.is_passage() {
                continue;
            }
            for dir in [Direction::East, Direction::South] {
                if let Some(n) = grid.neighbour(pos, dir, 1)
                    && grid.cell(n).unwrap().is_passage()
                {
                    edges += 1;
                }
            }
        }
        edges
    }

    #[test]
    fn new_robot_is_unplaced_and_idle() {
        let mut grid = grid_with(&[(2, 2)]);
        let mut robot = Robot::new();
        assert_eq!(robot.status(&grid), RobotStatus::Unplaced);
        let seg = LocalSegment::around(&grid, Position::new(2, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(robot.step(&mut grid, &seg, &mut rng).unwrap(), StepOutcome::Idle);
        assert!(grid.occupied_positions().is_empty());
    }

    #[test]
    fn place_moves_occupancy() {
        let mut grid = grid_with(&[(1, 1), (1, 2)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(1, 1)).unwrap();
        assert_eq!(grid.occupied_positions(), vec![Position::new(1, 1)]);
        robot.place(&mut grid, Position::new(1, 2)).unwrap();
        assert_eq!(grid.occupied_positions(), vec![Position::new(1, 2)]);
        assert_eq!(robot.status(&grid), RobotStatus::Navigating);
    }

    #[test]
    fn place_rejects_walls_and_off_grid() {
        let mut grid = grid_with(&[(1, 1)]);
        let mut robot = Robot::new();
        let wall = robot.place(&mut grid, Position::new(2, 2));
        assert!(matches!(wall, Err(AgentError::InvalidArgument { .. })));
        let outside = robot.place(&mut grid, Position::new(9, 9));
        assert!(matches!(outside, Err(AgentError::InvalidArgument { .. })));
        assert_eq!(robot.location(), None);
        assert!(grid.occupied_positions().is_empty());
    }

    #[test]
    fn remove_clears_occupancy() {
        let mut grid = grid_with(&[(1, 1)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(1, 1)).unwrap();
        robot.remove(&mut grid).unwrap();
        assert_eq!(robot.status(&grid), RobotStatus::Unplaced);
        assert!(grid.occupied_positions().is_empty());
    }

    #[test]
    fn dead_end_marks_and_turns_toward_opening() {
        // Centre (2,2) with only north open.
        let mut grid = grid_with(&[(1, 2), (2, 2)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let seg = LocalSegment::around(&grid, Position::new(2, 2)).unwrap();
        assert_eq!(seg.segment_type(), SegmentType::DeadEnd);
        let outcome = robot.step(&mut grid, &seg, &mut rng).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Moved {
                from: Position::new(2, 2),
                to: Position::new(1, 2),
                direction: Direction::North,
            }
        );
        assert_eq!(grid.cell(Position::new(2, 2)).unwrap().mark(), CellMark::Once);
        assert_eq!(grid.occupied_positions(), vec![Position::new(1, 2)]);
    }

    #[test]
    fn corridor_keeps_direction() {
        let mut grid = grid_with(&[(1, 2), (2, 2), (3, 2)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        robot.direction = Direction::South;
        let mut rng = SmallRng::seed_from_u64(0);
        let outcome = step_once(&mut robot, &mut grid, &mut rng);
        assert_eq!(robot.direction(), Direction::South);
        assert_eq!(
            outcome,
            StepOutcome::Moved {
                from: Position::new(2, 2),
                to: Position::new(3, 2),
                direction: Direction::South,
            }
        );
        assert_eq!(grid.cell(Position::new(2, 2)).unwrap().mark(), CellMark::Once);
    }

    #[test]
    fn junction_is_not_marked_and_prefers_unvisited() {
        // North unmarked, east and west once-marked, south wall.
        let mut grid = grid_with(&[(1, 2), (2, 1), (2, 2), (2, 3)]);
        grid.mark(Position::new(2, 1)).unwrap();
        grid.mark(Position::new(2, 3)).unwrap();
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(9);
        step_once(&mut robot, &mut grid, &mut rng);
        assert_eq!(robot.direction(), Direction::North);
        assert_eq!(robot.location(), Some(Position::new(1, 2)));
        assert_eq!(grid.cell(Position::new(2, 2)).unwrap().mark(), CellMark::None);
    }

    #[test]
    fn junction_with_four_once_marked_reverses() {
        let mut grid = grid_with(&[(1, 2), (2, 1), (2, 2), (2, 3), (3, 2)]);
        for pos in [(1, 2), (2, 1), (2, 3), (3, 2)] {
            grid.mark(Position::new(pos.0, pos.1)).unwrap();
        }
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        robot.direction = Direction::East;
        let mut rng = SmallRng::seed_from_u64(4);
        step_once(&mut robot, &mut grid, &mut rng);
        assert_eq!(robot.direction(), Direction::West);
        assert_eq!(robot.location(), Some(Position::new(2, 1)));
    }

    #[test]
    fn twice_marked_target_blocks_move() {
        // Corridor heading north into a twice-marked cell.
        let mut grid = grid_with(&[(1, 2), (2, 2), (3, 2)]);
        grid.mark(Position::new(1, 2)).unwrap();
        grid.mark(Position::new(1, 2)).unwrap();
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let outcome = step_once(&mut robot, &mut grid, &mut rng);
        assert_eq!(
            outcome,
            StepOutcome::Blocked {
                at: Position::new(2, 2),
                direction: Direction::North,
            }
        );
        assert_eq!(robot.location(), Some(Position::new(2, 2)));
        assert_eq!(grid.occupied_positions(), vec![Position::new(2, 2)]);
    }

    #[test]
    fn heading_into_a_wall_blocks_until_the_cell_overflows() {
        // East-west corridor, robot in the middle facing the north wall.
        let mut grid = grid_with(&[(2, 1), (2, 2), (2, 3)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        robot.direction = Direction::North;
        let mut rng = SmallRng::seed_from_u64(0);

        for expected in [CellMark::Once, CellMark::Twice] {
            let outcome = step_once(&mut robot, &mut grid, &mut rng);
            assert_eq!(
                outcome,
                StepOutcome::Blocked {
                    at: Position::new(2, 2),
                    direction: Direction::North,
                }
            );
            assert_eq!(grid.cell(Position::new(2, 2)).unwrap().mark(), expected);
            assert_eq!(grid.occupied_positions(), vec![Position::new(2, 2)]);
        }

        let seg = LocalSegment::around(&grid, Position::new(2, 2)).unwrap();
        let err = robot.step(&mut grid, &seg, &mut rng).unwrap_err();
        assert!(err.is_defect());
        assert!(matches!(
            err,
            AgentError::World {
                source: WorldError::MarkOverflow(p)
            } if p == Position::new(2, 2)
        ));
    }

    #[test]
    fn marking_a_twice_marked_cell_is_a_defect() {
        let mut grid = grid_with(&[(1, 2), (2, 2), (3, 2)]);
        grid.mark(Position::new(2, 2)).unwrap();
        grid.mark(Position::new(2, 2)).unwrap();
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        let seg = LocalSegment::around(&grid, Position::new(2, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let err = robot.step(&mut grid, &seg, &mut rng).unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn stale_segment_is_rejected() {
        let mut grid = grid_with(&[(1, 2), (2, 2)]);
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        let seg = LocalSegment::around(&grid, Position::new(1, 2)).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let err = robot.step(&mut grid, &seg, &mut rng).unwrap_err();
        assert!(matches!(err, AgentError::SegmentMismatch { .. }));
        assert!(!err.is_defect());
        assert_eq!(grid.cell(Position::new(2, 2)).unwrap().mark(), CellMark::None);
    }

    #[test]
    fn steps_at_end_are_no_ops() {
        let mut grid = grid_with(&[(1, 2), (2, 2)]);
        grid.assign_role(Position::new(2, 2), CellRole::End).unwrap();
        let mut robot = Robot::new();
        robot.place(&mut grid, Position::new(2, 2)).unwrap();
        assert_eq!(robot.status(&grid), RobotStatus::AtEnd);
        let before = grid.clone();
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..3 {
            assert_eq!(step_once(&mut robot, &mut grid, &mut rng), StepOutcome::Idle);
        }
        assert_eq!(grid, before);
        assert_eq!(robot.steps_taken(), 0);
    }

    #[test]
    fn reaches_end_of_generated_mazes_within_bound() {
        for (side, seed) in [(5, 0), (11, 1), (11, 2), (15, 3), (21, 4), (31, 5)] {
            let mut grid = blank(side);
            let mut rng = SmallRng::seed_from_u64(seed);
            let endpoints = MazeBuilder::generate(&mut grid, &mut rng).unwrap();
            let bound = 2 * passage_edges(&grid);

            let mut robot = Robot::new();
            robot.place(&mut grid, endpoints.start).unwrap();
            let mut steps = 0;
            while !robot.is_at_end(&grid) {
                let outcome = step_once(&mut robot, &mut grid, &mut rng);
                assert!(matches!(outcome, StepOutcome::Moved { .. }), "side {side}: {outcome:?}");
                steps += 1;
                assert!(steps <= bound, "side {side} seed {seed}: exceeded {bound} steps");
            }
            assert_eq!(robot.location(), Some(endpoints.end));
        }
    }

    #[test]
    fn marks_never_decrease_and_one_cell_is_occupied() {
        for seed in 0..15 {
            let mut grid = blank(13);
            let mut rng = SmallRng::seed_from_u64(seed);
            let endpoints = MazeBuilder::generate(&mut grid, &mut rng).unwrap();
            let mut robot = Robot::new();
            robot.place(&mut grid, endpoints.start).unwrap();
            assert_eq!(grid.occupied_positions().len(), 1);

            let mut previous: Vec<CellMark> = grid.cells().map(|c| c.mark()).collect();
            while !robot.is_at_end(&grid) {
                step_once(&mut robot, &mut grid, &mut rng);
                let current: Vec<CellMark> = grid.cells().map(|c| c.mark()).collect();
                for (before, after) in previous.iter().zip(&current) {
                    assert!(after >= before, "seed {seed}: mark decreased");
                }
                assert_eq!(grid.occupied_positions(), vec![robot.location().unwrap()]);
                previous = current;
            }
        }
    }
}
