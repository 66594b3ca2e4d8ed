//! Local segment classification.
//!
//! A [`LocalSegment`] is a copy of the five cells around the robot: the cell
//! it stands on and its four direct neighbours. Neighbours outside the grid
//! are filled with [`SegmentSide::WALL`], so classification is total over
//! every position, including the boundary.
//!
//! The segment is rebuilt each step and never writes back to the grid.

use maze_types::{CellMark, CellType, Direction, Position, SegmentType};
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::WorldError;
use crate::grid::Grid;

/// One neighbour as seen from the segment centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSide {
    /// Where the neighbour is, or `None` for the off-grid sentinel.
    pub position: Option<Position>,
    /// Wall or passage.
    pub cell_type: CellType,
    /// Visitation mark.
    pub mark: CellMark,
}

impl SegmentSide {
    /// Stand-in for a neighbour outside the grid: a permanent, unmarked wall.
    pub const WALL: Self = Self {
        position: None,
        cell_type: CellType::Wall,
        mark: CellMark::None,
    };

    /// Whether the robot could step onto this neighbour's cell type.
    pub const fn is_passage(&self) -> bool {
        matches!(self.cell_type, CellType::Passage)
    }
}

/// Read-only view of a centre cell and its four neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSegment {
    center: Position,
    north: SegmentSide,
    east: SegmentSide,
    south: SegmentSide,
    west: SegmentSide,
    segment_type: SegmentType,
    unvisited_passages: Vec<Direction>,
    once_marked_passages: Vec<Direction>,
}

impl LocalSegment {
    /// Capture the segment around `center` from the grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidArgument`] if `center` is outside the grid.
    pub fn around(grid: &Grid, center: Position) -> Result<Self, WorldError> {
        if !grid.contains(center) {
            return Err(WorldError::InvalidArgument {
                reason: format!("segment centre {center} is outside the grid"),
            });
        }
        let side = |dir: Direction| {
            grid.neighbour(center, dir, 1)
                .and_then(|pos| {
                    grid.cell(pos).map(|cell| SegmentSide {
                        position: Some(pos),
                        cell_type: cell.cell_type(),
                        mark: cell.mark(),
                    })
                })
                .unwrap_or(SegmentSide::WALL)
        };
        Ok(Self::from_sides(
            center,
            side(Direction::North),
            side(Direction::East),
            side(Direction::South),
            side(Direction::West),
        ))
    }

    /// Build a segment from explicit neighbours and classify it.
    pub fn from_sides(
        center: Position,
        north: SegmentSide,
        east: SegmentSide,
        south: SegmentSide,
        west: SegmentSide,
    ) -> Self {
        let mut segment = Self {
            center,
            north,
            east,
            south,
            west,
            segment_type: SegmentType::Junction,
            unvisited_passages: Vec::new(),
            once_marked_passages: Vec::new(),
        };
        segment.segment_type = segment.classify();
        if segment.segment_type == SegmentType::Junction {
            segment.unvisited_passages = segment.passages_marked(CellMark::None);
            segment.once_marked_passages = segment.passages_marked(CellMark::Once);
        }
        segment
    }

    /// The cell the segment is centred on.
    pub const fn center(&self) -> Position {
        self.center
    }

    /// The neighbour in a given direction.
    pub const fn side(&self, direction: Direction) -> &SegmentSide {
        match direction {
            Direction::North => &self.north,
            Direction::East => &self.east,
            Direction::South => &self.south,
            Direction::West => &self.west,
        }
    }

    /// Dead end, corridor, or junction.
    pub const fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    /// Directions whose neighbour is a passage, clockwise from north.
    pub fn passage_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.side(*dir).is_passage())
            .collect()
    }

    /// Unmarked passage directions. Populated for junctions only.
    pub fn unvisited_passages(&self) -> &[Direction] {
        &self.unvisited_passages
    }

    /// Once-marked passage directions. Populated for junctions only.
    pub fn once_marked_passages(&self) -> &[Direction] {
        &self.once_marked_passages
    }

    /// Pick the direction to face next, given the current facing.
    ///
    /// - Corridor: keep going.
    /// - Dead end: face the only opening.
    /// - Junction: prefer a random unmarked passage, then a random
    ///   once-marked passage (unless all four are once-marked), otherwise
    ///   turn around.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoPassageNeighbours`] for a segment with no open
    /// side; a robot standing in a connected maze always has one.
    pub fn choose_direction<R: Rng + ?Sized>(
        &self,
        current: Direction,
        rng: &mut R,
    ) -> Result<Direction, WorldError> {
        match self.segment_type {
            SegmentType::Corridor => Ok(current),
            SegmentType::DeadEnd => self
                .passage_directions()
                .first()
                .copied()
                .ok_or(WorldError::NoPassageNeighbours(self.center)),
            SegmentType::Junction => {
                if self.passage_directions().is_empty() {
                    return Err(WorldError::NoPassageNeighbours(self.center));
                }
                if let Some(&dir) = self.unvisited_passages.choose(rng) {
                    return Ok(dir);
                }
                if self.once_marked_passages.len() < Direction::ALL.len()
                    && let Some(&dir) = self.once_marked_passages.choose(rng)
                {
                    return Ok(dir);
                }
                Ok(current.opposite())
            }
        }
    }

    fn classify(&self) -> SegmentType {
        match self.passage_directions().as_slice() {
            [_] => SegmentType::DeadEnd,
            [a, b] if a.is_opposite(*b) => SegmentType::Corridor,
            _ => SegmentType::Junction,
        }
    }

    fn passages_marked(&self, mark: CellMark) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                let side = self.side(*dir);
                side.is_passage() && side.mark == mark
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::grid::SizeBounds;

    const CENTER: Position = Position::new(2, 2);

    fn open(mark: CellMark) -> SegmentSide {
        SegmentSide {
            position: None,
            cell_type: CellType::Passage,
            mark,
        }
    }

    const WALL: SegmentSide = SegmentSide::WALL;

    #[test]
    fn single_opening_is_dead_end() {
        let seg = LocalSegment::from_sides(CENTER, open(CellMark::None), WALL, WALL, WALL);
        assert_eq!(seg.segment_type(), SegmentType::DeadEnd);
        let mut rng = SmallRng::seed_from_u64(1);
        let dir = seg.choose_direction(Direction::South, &mut rng).unwrap();
        assert_eq!(dir, Direction::North);
    }

    #[test]
    fn every_single_opening_is_a_dead_end() {
        let mut rng = SmallRng::seed_from_u64(1);
        for open_dir in Direction::ALL {
            let pick = |d: Direction| if d == open_dir { open(CellMark::Once) } else { WALL };
            let seg = LocalSegment::from_sides(
                CENTER,
                pick(Direction::North),
                pick(Direction::East),
                pick(Direction::South),
                pick(Direction::West),
            );
            assert_eq!(seg.segment_type(), SegmentType::DeadEnd);
            assert_eq!(seg.choose_direction(open_dir.opposite(), &mut rng).unwrap(), open_dir);
        }
    }

    #[test]
    fn opposite_openings_are_corridor() {
        let ns = LocalSegment::from_sides(
            CENTER,
            open(CellMark::None),
            WALL,
            open(CellMark::None),
            WALL,
        );
        assert_eq!(ns.segment_type(), SegmentType::Corridor);
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(ns.choose_direction(Direction::South, &mut rng).unwrap(), Direction::South);
        assert_eq!(ns.choose_direction(Direction::North, &mut rng).unwrap(), Direction::North);

        let ew = LocalSegment::from_sides(CENTER, WALL, open(CellMark::Once), WALL, open(CellMark::None));
        assert_eq!(ew.segment_type(), SegmentType::Corridor);
        assert!(ew.unvisited_passages().is_empty());
    }

    #[test]
    fn adjacent_openings_are_junction() {
        let seg = LocalSegment::from_sides(CENTER, open(CellMark::None), open(CellMark::None), WALL, WALL);
        assert_eq!(seg.segment_type(), SegmentType::Junction);
        assert_eq!(seg.unvisited_passages(), &[Direction::North, Direction::East]);
    }

    #[test]
    fn three_and_four_openings_are_junctions() {
        let three = LocalSegment::from_sides(
            CENTER,
            open(CellMark::None),
            open(CellMark::Once),
            WALL,
            open(CellMark::Twice),
        );
        assert_eq!(three.segment_type(), SegmentType::Junction);
        assert_eq!(three.unvisited_passages(), &[Direction::North]);
        assert_eq!(three.once_marked_passages(), &[Direction::East]);

        let four = LocalSegment::from_sides(
            CENTER,
            open(CellMark::None),
            open(CellMark::None),
            open(CellMark::None),
            open(CellMark::None),
        );
        assert_eq!(four.segment_type(), SegmentType::Junction);
        assert_eq!(four.unvisited_passages().len(), 4);
    }

    #[test]
    fn no_openings_is_junction_and_a_defect_to_resolve() {
        let seg = LocalSegment::from_sides(CENTER, WALL, WALL, WALL, WALL);
        assert_eq!(seg.segment_type(), SegmentType::Junction);
        let mut rng = SmallRng::seed_from_u64(1);
        let err = seg.choose_direction(Direction::North, &mut rng).unwrap_err();
        assert!(matches!(err, WorldError::NoPassageNeighbours(p) if p == CENTER));
        assert!(err.is_defect());
    }

    #[test]
    fn junction_prefers_unvisited_passage() {
        let seg = LocalSegment::from_sides(
            CENTER,
            open(CellMark::None),
            open(CellMark::Once),
            WALL,
            open(CellMark::Once),
        );
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_eq!(
                seg.choose_direction(Direction::East, &mut rng).unwrap(),
                Direction::North
            );
        }
    }

    #[test]
    fn junction_retraces_once_marked_when_nothing_unvisited() {
        let seg = LocalSegment::from_sides(
            CENTER,
            open(CellMark::Twice),
            open(CellMark::Once),
            WALL,
            open(CellMark::Twice),
        );
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(seg.choose_direction(Direction::North, &mut rng).unwrap(), Direction::East);
    }

    #[test]
    fn junction_choices_stay_within_candidates() {
        let seg = LocalSegment::from_sides(
            CENTER,
            open(CellMark::None),
            WALL,
            open(CellMark::None),
            open(CellMark::None),
        );
        let mut rng = SmallRng::seed_from_u64(17);
        for _ in 0..100 {
            let dir = seg.choose_direction(Direction::North, &mut rng).unwrap();
            assert_ne!(dir, Direction::East);
        }
    }

    #[test]
    fn all_four_once_marked_reverses() {
        let seg = LocalSegment::from_sides(
            CENTER,
            open(CellMark::Once),
            open(CellMark::Once),
            open(CellMark::Once),
            open(CellMark::Once),
        );
        let mut rng = SmallRng::seed_from_u64(5);
        for dir in Direction::ALL {
            assert_eq!(seg.choose_direction(dir, &mut rng).unwrap(), dir.opposite());
        }
    }

    #[test]
    fn all_twice_marked_reverses() {
        let seg = LocalSegment::from_sides(
            CENTER,
            open(CellMark::Twice),
            open(CellMark::Twice),
            WALL,
            WALL,
        );
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(seg.choose_direction(Direction::West, &mut rng).unwrap(), Direction::East);
    }

    #[test]
    fn around_uses_wall_sentinel_off_grid() {
        let mut grid = Grid::new(5, &SizeBounds::default()).unwrap();
        grid.open(Position::new(0, 1)).unwrap();
        grid.open(Position::new(1, 0)).unwrap();
        let seg = LocalSegment::around(&grid, Position::new(0, 0)).unwrap();
        assert_eq!(*seg.side(Direction::North), SegmentSide::WALL);
        assert_eq!(*seg.side(Direction::West), SegmentSide::WALL);
        assert_eq!(seg.side(Direction::East).position, Some(Position::new(0, 1)));
        assert_eq!(seg.segment_type(), SegmentType::Junction);
    }

    #[test]
    fn around_copies_marks_without_mutating() {
        let mut grid = Grid::new(5, &SizeBounds::default()).unwrap();
        for pos in [Position::new(1, 2), Position::new(2, 2), Position::new(3, 2)] {
            grid.open(pos).unwrap();
        }
        grid.mark(Position::new(1, 2)).unwrap();
        let before = grid.clone();
        let seg = LocalSegment::around(&grid, CENTER).unwrap();
        assert_eq!(seg.segment_type(), SegmentType::Corridor);
        assert_eq!(seg.side(Direction::North).mark, CellMark::Once);
        assert_eq!(seg.side(Direction::South).mark, CellMark::None);
        assert_eq!(grid, before);
    }

    #[test]
    fn around_rejects_centre_outside_grid() {
        let grid = Grid::new(5, &SizeBounds::default()).unwrap();
        assert!(matches!(
            LocalSegment::around(&grid, Position::new(5, 5)),
            Err(WorldError::InvalidArgument { .. })
        ));
    }
}
