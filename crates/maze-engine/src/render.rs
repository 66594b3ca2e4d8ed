//! Plain-text rendering of a [`MazeSnapshot`].
//!
//! One character per cell, one line per row:
//!
//! | Char | Meaning                         |
//! |------|---------------------------------|
//! | `#`  | wall                            |
//! | `^>v<` | robot, pointing where it faces |
//! | `S`  | Start                           |
//! | `E`  | End                             |
//! | `:`  | passage marked twice            |
//! | `.`  | passage marked once             |
//! | ` `  | unmarked passage                |

use maze_core::simulation::MazeSnapshot;
use maze_types::{CellMark, CellRole, CellType, CellView, Direction};

/// Render the snapshot as newline-terminated rows.
pub fn render(snapshot: &MazeSnapshot) -> String {
    let side = snapshot.side_length;
    let mut out = String::with_capacity(side.saturating_add(1).saturating_mul(side));
    for row in snapshot.cells.chunks(side.max(1)) {
        out.extend(row.iter().map(|view| glyph(*view, snapshot.direction)));
        out.push('\n');
    }
    out
}

const fn glyph(view: CellView, facing: Direction) -> char {
    if view.occupied {
        return match facing {
            Direction::North => '^',
            Direction::East => '>',
            Direction::South => 'v',
            Direction::West => '<',
        };
    }
    match (view.cell_type, view.role, view.mark) {
        (CellType::Wall, _, _) => '#',
        (CellType::Passage, CellRole::Start, _) => 'S',
        (CellType::Passage, CellRole::End, _) => 'E',
        (CellType::Passage, CellRole::None, CellMark::Twice) => ':',
        (CellType::Passage, CellRole::None, CellMark::Once) => '.',
        (CellType::Passage, CellRole::None, CellMark::None) => ' ',
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use maze_core::simulation::Simulation;
    use maze_types::{Position, SimulationState};
    use maze_world::SizeBounds;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn snapshot_of(cells: Vec<CellView>, side_length: usize, direction: Direction) -> MazeSnapshot {
        MazeSnapshot {
            state: SimulationState::Running,
            side_length,
            cells,
            endpoints: None,
            robot: None,
            direction,
            at_end: false,
            steps: 0,
        }
    }

    fn passage(role: CellRole, mark: CellMark) -> CellView {
        CellView {
            cell_type: CellType::Passage,
            role,
            mark,
            occupied: false,
        }
    }

    #[test]
    fn glyphs_cover_every_cell_kind() {
        let wall = CellView::default();
        let robot = CellView {
            occupied: true,
            ..passage(CellRole::None, CellMark::Once)
        };
        let cells = vec![
            wall,
            passage(CellRole::Start, CellMark::None),
            passage(CellRole::End, CellMark::None),
            passage(CellRole::None, CellMark::None),
            passage(CellRole::None, CellMark::Once),
            passage(CellRole::None, CellMark::Twice),
            robot,
            wall,
            wall,
        ];
        let text = render(&snapshot_of(cells, 3, Direction::East));
        assert_eq!(text, "#SE\n .:\n>##\n");
    }

    #[test]
    fn robot_glyph_follows_heading() {
        let robot = CellView {
            occupied: true,
            ..passage(CellRole::Start, CellMark::None)
        };
        for (direction, expected) in [
            (Direction::North, "^\n"),
            (Direction::South, "v\n"),
            (Direction::West, "<\n"),
        ] {
            assert_eq!(render(&snapshot_of(vec![robot], 1, direction)), expected);
        }
    }

    #[test]
    fn generated_maze_renders_square_with_wall_border() {
        let mut rng = SmallRng::seed_from_u64(17);
        let mut sim = Simulation::new(11, SizeBounds::default()).unwrap();
        sim.generate(11, &mut rng).unwrap();
        let text = render(&sim.snapshot());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines.iter().all(|l| l.chars().count() == 11));
        assert_eq!(lines[0], "###########");
        assert_eq!(lines[10], "###########");
        assert!(lines.iter().all(|l| l.starts_with('#') && l.ends_with('#')));

        // Robot sits on Start, facing North; End is bottom-right.
        assert_eq!(lines[1].chars().nth(1), Some('^'));
        assert_eq!(lines[9].chars().nth(9), Some('E'));
        assert_eq!(sim.robot().location(), Some(Position::new(1, 1)));
    }
}
