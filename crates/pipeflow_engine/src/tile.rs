//! Tile kinds, rotations and the per-cell tile record.

use crate::grid::Coord;
use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Shape of the pipe segment occupying a cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TileKind {
    /// Horizontal straight pipe.
    StraightH,
    /// Vertical straight pipe.
    StraightV,
    /// Elbow joining top and right.
    CurveTr,
    /// Elbow joining right and bottom.
    CurveRb,
    /// Elbow joining bottom and left.
    CurveBl,
    /// Elbow joining left and top.
    CurveLt,
    /// Three-way junction.
    TJunction,
    /// Four-way junction.
    Cross,
    /// Sealed cap, no openings.
    EndCap,
    /// Cracked pipe; water escapes here.
    Broken,
    /// Water source, fixed at the top-left corner.
    Start,
    /// Tank inlet, fixed at the bottom-right corner.
    End,
}

impl TileKind {
    /// Kinds drawn uniformly when filling a fresh grid (before the broken override).
    pub const PIPE_CATALOG: [TileKind; 8] = [
        TileKind::StraightH,
        TileKind::StraightV,
        TileKind::CurveTr,
        TileKind::CurveRb,
        TileKind::CurveBl,
        TileKind::CurveLt,
        TileKind::TJunction,
        TileKind::Cross,
    ];

    /// Source and destination never move or rotate.
    pub fn is_fixed(self) -> bool {
        matches!(self, TileKind::Start | TileKind::End)
    }
}

/// Clockwise rotation of a tile in quarter turns.
///
/// Only the four right angles are representable, so the rotation domain
/// holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    /// 0 degrees.
    #[default]
    Deg0,
    /// 90 degrees.
    Deg90,
    /// 180 degrees.
    Deg180,
    /// 270 degrees.
    Deg270,
}

impl Rotation {
    /// All rotations in clockwise order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Number of clockwise quarter turns (0-3).
    pub fn steps(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    /// Rotation in degrees.
    pub fn degrees(self) -> u16 {
        u16::from(self.steps()) * 90
    }

    /// The next quarter turn clockwise, wrapping 270 → 0.
    pub fn clockwise(self) -> Self {
        Self::ALL[usize::from((self.steps() + 1) % 4)]
    }

    /// Draws a rotation uniformly at random.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl TryFrom<u16> for Rotation {
    type Error = RotationError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(RotationError { degrees: other }),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A rotation that is not a multiple of 90 below 360.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Rotation must be 0, 90, 180 or 270 degrees, got {}", degrees)]
pub struct RotationError {
    /// The rejected value.
    pub degrees: u16,
}

/// One grid cell: a pipe shape, its rotation and the flow flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    kind: TileKind,
    rotation: Rotation,
    row: usize,
    col: usize,
    connected: bool,
    has_water: bool,
    leaking: bool,
    fixed: bool,
}

impl Tile {
    /// Creates a dry tile at the given cell.
    #[instrument(level = "trace")]
    pub fn new(kind: TileKind, rotation: Rotation, at: Coord) -> Self {
        Self {
            kind,
            rotation,
            row: at.row,
            col: at.col,
            connected: false,
            has_water: false,
            leaking: false,
            fixed: kind.is_fixed(),
        }
    }

    /// Pipe shape.
    pub fn kind(&self) -> TileKind {
        self.kind
    }

    /// Clockwise rotation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Row index.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Column index.
    pub fn col(&self) -> usize {
        self.col
    }

    /// Cell coordinate.
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    /// Reachable from the source under the current connections.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Carries water. Mirrors `connected`.
    pub fn has_water(&self) -> bool {
        self.has_water
    }

    /// Water escapes from this tile.
    pub fn leaking(&self) -> bool {
        self.leaking
    }

    /// Start and end tiles are fixed in place.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub(crate) fn set_shape(&mut self, kind: TileKind, rotation: Rotation) {
        self.kind = kind;
        self.fixed = kind.is_fixed();
        self.rotation = rotation;
    }

    pub(crate) fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    pub(crate) fn fill(&mut self) {
        self.connected = true;
        self.has_water = true;
    }

    pub(crate) fn drain(&mut self) {
        self.connected = false;
        self.has_water = false;
        self.leaking = false;
    }

    pub(crate) fn mark_leaking(&mut self) {
        self.leaking = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rotation_cycle() {
        assert_eq!(Rotation::Deg0.clockwise(), Rotation::Deg90);
        assert_eq!(Rotation::Deg270.clockwise(), Rotation::Deg0);
        assert_eq!(Rotation::Deg180.degrees(), 180);
    }

    #[test]
    fn test_rotation_rejects_odd_angles() {
        assert_eq!(Rotation::try_from(270), Ok(Rotation::Deg270));
        assert_eq!(Rotation::try_from(45), Err(RotationError { degrees: 45 }));
        assert!(Rotation::try_from(360).is_err());
    }

    #[test]
    fn test_kind_names_are_kebab_case() {
        assert_eq!(TileKind::TJunction.to_string(), "t-junction");
        assert_eq!(TileKind::from_str("curve-rb"), Ok(TileKind::CurveRb));
        assert_eq!(TileKind::from_str("end-cap"), Ok(TileKind::EndCap));
    }

    #[test]
    fn test_only_endpoints_are_fixed() {
        use strum::IntoEnumIterator;
        let fixed: Vec<_> = TileKind::iter().filter(|kind| kind.is_fixed()).collect();
        assert_eq!(fixed, vec![TileKind::Start, TileKind::End]);
    }
}
