//! Read-only projections handed to rendering and observer layers.

use serde::{Deserialize, Serialize};

use crate::enums::{CellMark, CellRole, CellType};

/// Everything a renderer needs to draw one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    /// Wall or passage.
    pub cell_type: CellType,
    /// Start, end, or none.
    pub role: CellRole,
    /// Visitation mark left by the robot.
    pub mark: CellMark,
    /// Whether the robot currently stands here.
    pub occupied: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cell_view_serializes_with_variant_names() {
        let view = CellView {
            cell_type: CellType::Passage,
            role: CellRole::End,
            mark: CellMark::Once,
            occupied: true,
        };
        let json = serde_json::to_value(view).unwrap();
        assert_eq!(json["cell_type"], "Passage");
        assert_eq!(json["role"], "End");
        assert_eq!(json["mark"], "Once");
        assert_eq!(json["occupied"], true);
    }
}
