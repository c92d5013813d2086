//! Fixed endpoints invariant: one source at (0,0), one inlet at (N−1,N−1).

use super::Invariant;
use crate::grid::Grid;
use crate::tile::TileKind;

/// Invariant: exactly one `Start` at the top-left corner and exactly one
/// `End` at the bottom-right corner, and every tile sits where it claims.
pub struct FixedEndpointsInvariant;

impl Invariant<Grid> for FixedEndpointsInvariant {
    fn holds(grid: &Grid) -> bool {
        let source_ok = grid
            .get(grid.source())
            .is_some_and(|tile| tile.kind() == TileKind::Start);
        let inlet_ok = grid
            .get(grid.inlet())
            .is_some_and(|tile| tile.kind() == TileKind::End);
        let placed = grid.rows().enumerate().all(|(row, tiles)| {
            tiles
                .iter()
                .enumerate()
                .all(|(col, tile)| tile.row() == row && tile.col() == col)
        });

        source_ok
            && inlet_ok
            && placed
            && grid.count_kind(TileKind::Start) == 1
            && grid.count_kind(TileKind::End) == 1
    }

    fn description() -> &'static str {
        "Source and inlet are unique and fixed at opposite corners"
    }
}
