//! Randomized Prim maze generation.
//!
//! [`MazeBuilder`] grows a spanning tree over the grid's node cells. It is
//! resumable: [`MazeBuilder::advance`] performs exactly one frontier
//! iteration, so a host loop can yield, observe, or cancel between
//! iterations. [`MazeBuilder::generate`] drives it to completion in one call.
//!
//! # Algorithm
//!
//! 1. Clear the grid and open a random node.
//! 2. Seed the frontier with its wall node neighbours (two steps away).
//! 3. Repeatedly pull a random frontier cell. Skip it if it is already open
//!    (it can be queued twice from two different neighbours). Otherwise join
//!    it to one random open node neighbour by opening the wall between them,
//!    open it, and queue its own wall node neighbours.
//! 4. When the frontier is empty, the first open cell in row-major order
//!    becomes the start and the last becomes the end.
//!
//! Every node is joined exactly once, through exactly one wall, so the open
//! cells form a tree: one path between any two nodes.

use maze_types::{CellRole, Position};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::error::WorldError;
use crate::grid::Grid;

/// Start and end cells of a generated maze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Endpoints {
    /// The first passage in row-major order.
    pub start: Position,
    /// The last passage in row-major order.
    pub end: Position,
}

/// Result of a single [`MazeBuilder::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProgress {
    /// More frontier cells remain.
    Pending {
        /// Frontier size after this iteration.
        frontier: usize,
    },
    /// The frontier is exhausted; call [`MazeBuilder::finish`].
    Complete,
}

/// One in-flight generation run. Holds no state beyond a single run.
#[derive(Debug, Clone)]
pub struct MazeBuilder {
    /// Wall node cells waiting to be joined. May contain duplicates.
    frontier: Vec<Position>,
    /// Frontier iterations performed so far.
    iterations: u64,
}

impl MazeBuilder {
    /// Clear the grid, open a uniformly random node, and seed the frontier.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the grid has no nodes.
    pub fn start<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Result<Self, WorldError> {
        let per_side = grid.nodes_per_side();
        let node_count = per_side
            .checked_mul(per_side)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if node_count == 0 {
            return Err(WorldError::InvalidConfig {
                reason: "grid has no maze nodes".to_owned(),
            });
        }
        let origin = grid
            .node_at(rng.random_range(0..node_count))
            .ok_or(WorldError::ArithmeticOverflow)?;
        Self::start_at(grid, origin)
    }

    /// Clear the grid and begin generation from a chosen node.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidArgument`] if `origin` is not a node cell.
    pub fn start_at(grid: &mut Grid, origin: Position) -> Result<Self, WorldError> {
        if !grid.is_node(origin) {
            return Err(WorldError::InvalidArgument {
                reason: format!("generation origin {origin} is not a maze node"),
            });
        }
        grid.clear();
        grid.open(origin)?;
        let frontier = frontier_neighbours(grid, origin);
        debug!(
            %origin,
            side_length = grid.side_length(),
            frontier = frontier.len(),
            "Maze generation started"
        );
        Ok(Self {
            frontier,
            iterations: 0,
        })
    }

    /// Run generation to completion on a grid and assign start and end.
    ///
    /// # Errors
    ///
    /// Propagates defect errors from [`MazeBuilder::advance`] and
    /// [`MazeBuilder::finish`].
    pub fn generate<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Result<Endpoints, WorldError> {
        let mut builder = Self::start(grid, rng)?;
        while builder.advance(grid, rng)? != BuildProgress::Complete {}
        builder.finish(grid)
    }

    /// Number of frontier entries still queued.
    pub const fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Number of frontier iterations performed so far.
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Whether the frontier has been exhausted.
    pub const fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Perform one frontier iteration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidTopology`] if joining a frontier cell to
    /// its chosen neighbour fails, which means the frontier held a cell that
    /// is not a node.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<BuildProgress, WorldError> {
        if self.frontier.is_empty() {
            return Ok(BuildProgress::Complete);
        }
        self.iterations = self.iterations.saturating_add(1);

        let pick = rng.random_range(0..self.frontier.len());
        let current = self.frontier.swap_remove(pick);

        let already_open = grid.cell(current).is_some_and(|c| c.is_passage());
        if !already_open {
            let joined: Vec<Position> = grid
                .neighbours(current, 2)
                .into_iter()
                .map(|(_, pos)| pos)
                .filter(|pos| grid.cell(*pos).is_some_and(|c| c.is_passage()))
                .collect();
            if let Some(&neighbour) = joined.choose(rng) {
                grid.connect(current, neighbour)?;
                grid.open(current)?;
                self.frontier.extend(frontier_neighbours(grid, current));
            }
        }

        if self.frontier.is_empty() {
            Ok(BuildProgress::Complete)
        } else {
            Ok(BuildProgress::Pending {
                frontier: self.frontier.len(),
            })
        }
    }

    /// Assign the start and end roles and consume the builder.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidArgument`] if the frontier is not yet
    /// empty, or a role error if the grid has fewer than two passages.
    pub fn finish(self, grid: &mut Grid) -> Result<Endpoints, WorldError> {
        if !self.is_complete() {
            return Err(WorldError::InvalidArgument {
                reason: format!(
                    "generation finished with {} frontier cells left",
                    self.frontier.len()
                ),
            });
        }
        let mut passages = grid
            .positioned_cells()
            .filter(|(_, cell)| cell.is_passage())
            .map(|(pos, _)| pos);
        let start = passages
            .next()
            .ok_or_else(|| WorldError::InvalidArgument {
                reason: "generated grid has no passages".to_owned(),
            })?;
        let end = passages.last().unwrap_or(start);

        grid.assign_role(start, CellRole::Start)?;
        grid.assign_role(end, CellRole::End)?;

        info!(
            side_length = grid.side_length(),
            iterations = self.iterations,
            %start,
            %end,
            "Maze generated"
        );
        Ok(Endpoints { start, end })
    }
}

/// Wall node cells two steps from `pos` that are not on the boundary.
fn frontier_neighbours(grid: &Grid, pos: Position) -> Vec<Position> {
    grid.neighbours(pos, 2)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| !grid.is_edge(*n) && grid.cell(*n).is_some_and(|c| !c.is_passage()))
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};

    use maze_types::{CellType, Direction};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::grid::SizeBounds;

    fn grid(side: usize) -> Grid {
        Grid::new(side, &SizeBounds::default()).unwrap()
    }

    fn generated(side: usize, seed: u64) -> (Grid, Endpoints) {
        let mut g = grid(side);
        let mut rng = SmallRng::seed_from_u64(seed);
        let endpoints = MazeBuilder::generate(&mut g, &mut rng).unwrap();
        (g, endpoints)
    }

    fn is_open(g: &Grid, pos: Position) -> bool {
        g.cell(pos).is_some_and(|c| c.is_passage())
    }

    /// Node-to-node edges through opened wall cells.
    fn node_edges(g: &Grid) -> Vec<(Position, Position)> {
        let mut edges = Vec::new();
        for k in 0..g.nodes_per_side() * g.nodes_per_side() {
            let node = g.node_at(k).unwrap();
            for dir in [Direction::East, Direction::South] {
                let (Some(wall), Some(next)) =
                    (g.neighbour(node, dir, 1), g.neighbour(node, dir, 2))
                else {
                    continue;
                };
                if g.is_node(next) && is_open(g, wall) {
                    edges.push((node, next));
                }
            }
        }
        edges
    }

    #[test]
    fn every_node_is_opened() {
        let (g, _) = generated(11, 1);
        for k in 0..25 {
            assert!(is_open(&g, g.node_at(k).unwrap()));
        }
    }

    #[test]
    fn passages_form_a_spanning_tree() {
        for seed in 0..20 {
            let (g, _) = generated(15, seed);
            let nodes = g.nodes_per_side() * g.nodes_per_side();
            let edges = node_edges(&g);
            assert_eq!(edges.len(), nodes - 1, "seed {seed}: tree must have n-1 edges");

            let mut seen = BTreeSet::new();
            let mut queue = VecDeque::from([Position::new(1, 1)]);
            seen.insert(Position::new(1, 1));
            while let Some(node) = queue.pop_front() {
                for &(a, b) in &edges {
                    let other = if a == node {
                        b
                    } else if b == node {
                        a
                    } else {
                        continue;
                    };
                    if seen.insert(other) {
                        queue.push_back(other);
                    }
                }
            }
            assert_eq!(seen.len(), nodes, "seed {seed}: all nodes reachable");
        }
    }

    #[test]
    fn only_nodes_and_joining_walls_are_opened() {
        let (g, _) = generated(13, 7);
        for (pos, cell) in g.positioned_cells() {
            if cell.is_passage() {
                let row_odd = !pos.row.is_multiple_of(2);
                let col_odd = !pos.col.is_multiple_of(2);
                assert!(row_odd || col_odd, "{pos} is a corner cell and must stay wall");
            }
        }
    }

    #[test]
    fn boundary_stays_wall() {
        for seed in 0..10 {
            let (g, _) = generated(11, seed);
            for (pos, cell) in g.positioned_cells() {
                if g.is_edge(pos) {
                    assert_eq!(cell.cell_type(), CellType::Wall, "seed {seed}: {pos}");
                }
            }
        }
    }

    #[test]
    fn exactly_one_start_and_one_end() {
        for seed in 0..10 {
            let (g, endpoints) = generated(11, seed);
            let starts: Vec<_> = g.cells().filter(|c| c.role() == CellRole::Start).collect();
            let ends: Vec<_> = g.cells().filter(|c| c.role() == CellRole::End).collect();
            assert_eq!(starts.len(), 1);
            assert_eq!(ends.len(), 1);
            assert!(starts[0].is_passage());
            assert!(ends[0].is_passage());
            assert_eq!(g.find_role(CellRole::Start), Some(endpoints.start));
            assert_eq!(g.find_role(CellRole::End), Some(endpoints.end));
        }
    }

    #[test]
    fn start_and_end_are_first_and_last_nodes() {
        let (_, endpoints) = generated(11, 3);
        assert_eq!(endpoints.start, Position::new(1, 1));
        assert_eq!(endpoints.end, Position::new(9, 9));
    }

    #[test]
    fn fixed_origin_and_seed_are_deterministic() {
        let run = || {
            let mut g = grid(11);
            let mut rng = SmallRng::seed_from_u64(99);
            let mut builder = MazeBuilder::start_at(&mut g, Position::new(1, 1)).unwrap();
            while builder.advance(&mut g, &mut rng).unwrap() != BuildProgress::Complete {}
            let endpoints = builder.finish(&mut g).unwrap();
            (g, endpoints)
        };
        let (first, first_ends) = run();
        let (second, second_ends) = run();
        assert_eq!(first, second);
        assert_eq!(first_ends, second_ends);

        // The origin's wall neighbours are passage only where a join happened,
        // and each open one leads to an open node.
        let origin = Position::new(1, 1);
        for (dir, wall) in first.neighbours(origin, 1) {
            if is_open(&first, wall) {
                let node = first.neighbour(origin, dir, 2).unwrap();
                assert!(is_open(&first, node));
            }
        }
        assert!(!is_open(&first, Position::new(0, 1)));
        assert!(!is_open(&first, Position::new(1, 0)));
    }

    #[test]
    fn start_at_rejects_non_nodes() {
        let mut g = grid(11);
        for bad in [Position::new(0, 0), Position::new(2, 3), Position::new(11, 1)] {
            assert!(matches!(
                MazeBuilder::start_at(&mut g, bad),
                Err(WorldError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn start_clears_previous_maze() {
        let (mut g, _) = generated(9, 5);
        let mut rng = SmallRng::seed_from_u64(5);
        let builder = MazeBuilder::start(&mut g, &mut rng).unwrap();
        assert_eq!(g.cells().filter(|c| c.is_passage()).count(), 1);
        assert!(g.cells().all(|c| c.role() == CellRole::None));
        assert!(builder.frontier_len() >= 2);
    }

    #[test]
    fn advance_reports_progress_until_complete() {
        let mut g = grid(9);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut builder = MazeBuilder::start(&mut g, &mut rng).unwrap();
        let mut pending = 0_u32;
        loop {
            match builder.advance(&mut g, &mut rng).unwrap() {
                BuildProgress::Pending { frontier } => {
                    assert_eq!(frontier, builder.frontier_len());
                    pending += 1;
                }
                BuildProgress::Complete => break,
            }
        }
        assert!(pending > 0);
        assert!(builder.is_complete());
        assert_eq!(builder.advance(&mut g, &mut rng).unwrap(), BuildProgress::Complete);
    }

    #[test]
    fn finish_refuses_incomplete_generation() {
        let mut g = grid(9);
        let builder = MazeBuilder::start_at(&mut g, Position::new(3, 3)).unwrap();
        assert!(matches!(
            builder.finish(&mut g),
            Err(WorldError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn endpoints_serialize_as_positions() {
        let mut g = grid(7);
        let mut rng = SmallRng::seed_from_u64(2);
        let endpoints = MazeBuilder::generate(&mut g, &mut rng).unwrap();
        let json = serde_json::to_value(endpoints).unwrap();
        assert_eq!(json["start"]["row"], 1);
        assert_eq!(json["start"]["col"], 1);
        assert_eq!(json["end"]["row"], 5);
        assert_eq!(json["end"]["col"], 5);
    }
}
