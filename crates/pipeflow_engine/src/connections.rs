//! Connection resolution: which directions a tile opens towards.
//!
//! Pure functions over `(kind, rotation)`. Both flow propagation and any
//! renderer read through here, so the two can never disagree.

use crate::direction::{Connections, Direction};
use crate::tile::{Rotation, Tile, TileKind};

/// Openings of a tile kind at rotation 0.
pub fn canonical_connections(kind: TileKind) -> Connections {
    use Direction::{Down, Left, Right, Up};

    let directions: &[Direction] = match kind {
        TileKind::StraightH => &[Left, Right],
        TileKind::StraightV => &[Up, Down],
        TileKind::CurveTr => &[Up, Right],
        TileKind::CurveRb => &[Right, Down],
        TileKind::CurveBl => &[Down, Left],
        TileKind::CurveLt => &[Left, Up],
        TileKind::TJunction => &[Up, Left, Right],
        TileKind::Cross => &[Up, Down, Left, Right],
        TileKind::EndCap => &[],
        // Leaks in every direction it declares.
        TileKind::Broken => &[Up, Down, Left, Right],
        TileKind::Start => &[Right, Down],
        TileKind::End => &[Up, Left],
    };

    directions.iter().copied().collect()
}

/// Openings of a tile kind after applying a clockwise rotation.
pub fn rotated_connections(kind: TileKind, rotation: Rotation) -> Connections {
    canonical_connections(kind).rotated_cw(rotation.steps())
}

/// Absolute directions the tile currently connects.
pub fn effective_connections(tile: &Tile) -> Connections {
    rotated_connections(tile.kind(), tile.rotation())
}
