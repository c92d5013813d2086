//! Grid directions and direction sets.
//!
//! Directions are ordinals on the clockwise cycle up → right → down → left,
//! so rotating a pipe is plain modulo-4 arithmetic.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// One of the four absolute grid directions.
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
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Towards row 0.
    Up = 0,
    /// Towards the last column.
    Right = 1,
    /// Towards the last row.
    Down = 2,
    /// Towards column 0.
    Left = 3,
}

impl Direction {
    /// All directions in clockwise order starting at `Up`.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Position of this direction on the clockwise cycle (0-3).
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Direction at the given cycle position, wrapping modulo 4.
    pub fn from_ordinal(ordinal: u8) -> Self {
        Self::ALL[usize::from(ordinal % 4)]
    }

    /// The direction pointing back the way this one came.
    pub fn opposite(self) -> Self {
        self.rotated_cw(2)
    }

    /// Rotates clockwise by `steps` quarter turns.
    #[instrument(level = "trace")]
    pub fn rotated_cw(self, steps: u8) -> Self {
        Self::from_ordinal(self.ordinal() + steps % 4)
    }

    /// Row and column deltas of a single step in this direction.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
        }
    }
}

bitflags::bitflags! {
    /// A set of directions a tile opens towards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Connections: u8 {
        /// Opens upwards.
        const UP = 1 << 0;
        /// Opens to the right.
        const RIGHT = 1 << 1;
        /// Opens downwards.
        const DOWN = 1 << 2;
        /// Opens to the left.
        const LEFT = 1 << 3;
    }
}

impl Connections {
    /// Whether the set contains a single direction.
    pub fn opens(self, direction: Direction) -> bool {
        self.contains(Connections::from(direction))
    }

    /// The member directions in clockwise order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL
            .into_iter()
            .filter(move |direction| self.opens(*direction))
    }

    /// Rotates every member clockwise by `steps` quarter turns.
    pub fn rotated_cw(self, steps: u8) -> Self {
        self.directions()
            .map(|direction| Connections::from(direction.rotated_cw(steps)))
            .fold(Connections::empty(), |acc, bit| acc | bit)
    }
}

impl From<Direction> for Connections {
    fn from(direction: Direction) -> Self {
        Connections::from_bits_retain(1 << direction.ordinal())
    }
}

impl FromIterator<Direction> for Connections {
    fn from_iter<T: IntoIterator<Item = Direction>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Connections::empty(), |acc, direction| acc | direction.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
    }

    #[test]
    fn test_rotation_wraps() {
        assert_eq!(Direction::Left.rotated_cw(1), Direction::Up);
        assert_eq!(Direction::Up.rotated_cw(3), Direction::Left);
        assert_eq!(Direction::Down.rotated_cw(4), Direction::Down);
    }

    #[test]
    fn test_connections_rotate_as_a_set() {
        let curve: Connections = [Direction::Up, Direction::Right].into_iter().collect();
        let rotated = curve.rotated_cw(1);
        assert!(rotated.opens(Direction::Right));
        assert!(rotated.opens(Direction::Down));
        assert!(!rotated.opens(Direction::Up));
        assert_eq!(rotated.directions().count(), 2);
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(Direction::Left.to_string(), "left");
    }
}
