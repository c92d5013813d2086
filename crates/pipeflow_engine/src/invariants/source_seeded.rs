//! Source seeded invariant: the source always holds water.

use super::Invariant;
use crate::grid::Grid;

/// Invariant: the source tile is connected, carries water and never leaks.
pub struct SourceSeededInvariant;

impl Invariant<Grid> for SourceSeededInvariant {
    fn holds(grid: &Grid) -> bool {
        grid.get(grid.source())
            .is_some_and(|tile| tile.connected() && tile.has_water() && !tile.leaking())
    }

    fn description() -> &'static str {
        "Source tile is always connected and watered"
    }
}
