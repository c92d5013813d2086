//! Water mirrors connection invariant.

use super::Invariant;
use crate::grid::Grid;

/// Invariant: a tile carries water exactly when it is connected.
pub struct WaterMirrorsConnectionInvariant;

impl Invariant<Grid> for WaterMirrorsConnectionInvariant {
    fn holds(grid: &Grid) -> bool {
        grid.tiles()
            .iter()
            .all(|tile| tile.has_water() == tile.connected())
    }

    fn description() -> &'static str {
        "has_water equals connected on every tile"
    }
}
