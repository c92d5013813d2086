//! The N×N pipe grid and its construction.

use crate::direction::Direction;
use crate::tile::{Rotation, Tile, TileKind};
use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Smallest grid that still separates the source from the destination.
pub const MIN_GRID_SIZE: usize = 2;

/// Probability that a freshly generated cell is a broken pipe.
pub const DEFAULT_BROKEN_PROBABILITY: f64 = 0.10;

/// A cell coordinate, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The adjacent cell in `direction`, if it lies on a `size`×`size` grid.
    pub fn step(self, direction: Direction, size: usize) -> Option<Coord> {
        let (dr, dc) = direction.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < size && col < size).then_some(Coord { row, col })
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Reasons a grid cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GridError {
    /// The grid is too small to hold both endpoints.
    #[display("Grid size {} is below the minimum of {}", size, MIN_GRID_SIZE)]
    TooSmall {
        /// Requested size.
        size: usize,
    },
    /// A layout placed a start or end tile away from its corner.
    #[display("{} may only sit at its fixed corner, found at {}", kind, at)]
    MisplacedEndpoint {
        /// Offending kind.
        kind: TileKind,
        /// Where it was placed.
        at: Coord,
    },
}

/// Square matrix of tiles, stored row-major.
///
/// The source always sits at (0,0) and the tank inlet at (N−1,N−1).
/// Serializes as a read-only snapshot; grids are only built through
/// [`Grid::generate`] or [`Grid::with_layout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid {
    size: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Generates a randomized grid.
    ///
    /// Every non-fixed cell draws a kind uniformly from
    /// [`TileKind::PIPE_CATALOG`], is replaced by [`TileKind::Broken`] with
    /// probability `broken_probability`, and gets a uniform rotation.
    /// Solvability is not guaranteed.
    #[instrument(skip(rng))]
    pub fn generate(
        size: usize,
        broken_probability: f64,
        rng: &mut impl Rng,
    ) -> Result<Self, GridError> {
        let broken_probability = broken_probability.clamp(0.0, 1.0);
        let grid = Self::build(size, |_| {
            let kind = if rng.gen_bool(broken_probability) {
                TileKind::Broken
            } else {
                TileKind::PIPE_CATALOG[rng.gen_range(0..TileKind::PIPE_CATALOG.len())]
            };
            (kind, Rotation::random(&mut *rng))
        })?;

        debug!(
            size,
            broken = grid.count_kind(TileKind::Broken),
            "Generated grid"
        );
        Ok(grid)
    }

    /// Builds a grid from a per-cell layout function.
    ///
    /// The corner cells are always the source and inlet; the layout is not
    /// consulted for them. Placing `Start` or `End` anywhere else is an error.
    #[instrument(skip(layout))]
    pub fn with_layout(
        size: usize,
        mut layout: impl FnMut(Coord) -> (TileKind, Rotation),
    ) -> Result<Self, GridError> {
        let mut misplaced = None;
        let grid = Self::build(size, |at| {
            let (kind, rotation) = layout(at);
            if kind.is_fixed() && misplaced.is_none() {
                misplaced = Some(GridError::MisplacedEndpoint { kind, at });
            }
            (kind, rotation)
        })?;

        match misplaced {
            Some(err) => Err(err),
            None => Ok(grid),
        }
    }

    fn build(
        size: usize,
        mut cell: impl FnMut(Coord) -> (TileKind, Rotation),
    ) -> Result<Self, GridError> {
        if size < MIN_GRID_SIZE {
            return Err(GridError::TooSmall { size });
        }

        let source = Coord::new(0, 0);
        let inlet = Coord::new(size - 1, size - 1);
        let mut tiles = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let at = Coord::new(row, col);
                let tile = if at == source {
                    let mut tile = Tile::new(TileKind::Start, Rotation::Deg0, at);
                    tile.fill();
                    tile
                } else if at == inlet {
                    Tile::new(TileKind::End, Rotation::Deg0, at)
                } else {
                    let (kind, rotation) = cell(at);
                    Tile::new(kind, rotation, at)
                };
                tiles.push(tile);
            }
        }

        Ok(Self { size, tiles })
    }

    /// Side length N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (N²).
    pub fn cell_count(&self) -> usize {
        self.tiles.len()
    }

    /// Coordinate of the water source.
    pub fn source(&self) -> Coord {
        Coord::new(0, 0)
    }

    /// Coordinate of the tank inlet.
    pub fn inlet(&self) -> Coord {
        Coord::new(self.size - 1, self.size - 1)
    }

    /// Whether the coordinate lies on the grid.
    pub fn contains(&self, at: Coord) -> bool {
        at.row < self.size && at.col < self.size
    }

    /// The tile at a coordinate, if it lies on the grid.
    pub fn get(&self, at: Coord) -> Option<&Tile> {
        self.index(at).map(|index| &self.tiles[index])
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles grouped by row.
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.size)
    }

    /// Whether the cell holds a fixed endpoint.
    pub fn is_fixed(&self, at: Coord) -> bool {
        self.get(at).is_some_and(Tile::is_fixed)
    }

    /// Number of tiles reachable from the source.
    pub fn connected_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.connected()).count()
    }

    /// Number of tiles currently marked as leaking.
    pub fn leaking_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.leaking()).count()
    }

    /// Number of tiles of the given kind.
    pub fn count_kind(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| tile.kind() == kind).count()
    }

    pub(crate) fn index(&self, at: Coord) -> Option<usize> {
        self.contains(at).then(|| at.row * self.size + at.col)
    }

    pub(crate) fn tile_mut(&mut self, at: Coord) -> Option<&mut Tile> {
        let index = self.index(at)?;
        self.tiles.get_mut(index)
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Exchanges kind and rotation between two cells; identities stay put.
    pub(crate) fn swap_shapes(&mut self, a: Coord, b: Coord) {
        let (Some(ia), Some(ib)) = (self.index(a), self.index(b)) else {
            return;
        };
        let (kind_a, rotation_a) = (self.tiles[ia].kind(), self.tiles[ia].rotation());
        let (kind_b, rotation_b) = (self.tiles[ib].kind(), self.tiles[ib].rotation());
        self.tiles[ia].set_shape(kind_b, rotation_b);
        self.tiles[ib].set_shape(kind_a, rotation_a);
    }

    /// Rotates one cell a quarter turn clockwise.
    pub(crate) fn rotate_cell(&mut self, at: Coord) {
        if let Some(tile) = self.tile_mut(at) {
            let next = tile.rotation().clockwise();
            tile.set_rotation(next);
        }
    }

    /// Re-rolls the rotation of every non-fixed cell.
    pub(crate) fn randomize_rotations(&mut self, rng: &mut impl Rng) {
        for tile in self.tiles.iter_mut().filter(|tile| !tile.is_fixed()) {
            tile.set_rotation(Rotation::random(rng));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_step_respects_bounds() {
        let corner = Coord::new(0, 0);
        assert_eq!(corner.step(Direction::Up, 5), None);
        assert_eq!(corner.step(Direction::Left, 5), None);
        assert_eq!(corner.step(Direction::Right, 5), Some(Coord::new(0, 1)));
        assert_eq!(Coord::new(4, 4).step(Direction::Down, 5), None);
    }

    #[test]
    fn test_generate_places_endpoints() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let grid = Grid::generate(6, DEFAULT_BROKEN_PROBABILITY, &mut rng).unwrap();

        let source = grid.get(grid.source()).unwrap();
        assert_eq!(source.kind(), TileKind::Start);
        assert!(source.connected() && source.has_water());

        let inlet = grid.get(grid.inlet()).unwrap();
        assert_eq!(inlet.kind(), TileKind::End);
        assert!(!inlet.connected() && !inlet.has_water());

        assert_eq!(grid.count_kind(TileKind::Start), 1);
        assert_eq!(grid.count_kind(TileKind::End), 1);
        assert_eq!(grid.count_kind(TileKind::EndCap), 0);
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = Grid::generate(7, 0.1, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        let b = Grid::generate(7, 0.1, &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_certain_breakage_breaks_every_pipe() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let grid = Grid::generate(4, 1.0, &mut rng).unwrap();
        assert_eq!(grid.count_kind(TileKind::Broken), 14);
    }

    #[test]
    fn test_too_small_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            Grid::generate(1, 0.1, &mut rng),
            Err(GridError::TooSmall { size: 1 })
        );
    }

    #[test]
    fn test_layout_rejects_stray_endpoint() {
        let result = Grid::with_layout(3, |at| {
            if at == Coord::new(1, 1) {
                (TileKind::End, Rotation::Deg0)
            } else {
                (TileKind::Cross, Rotation::Deg0)
            }
        });
        assert!(matches!(
            result,
            Err(GridError::MisplacedEndpoint { kind: TileKind::End, .. })
        ));
    }

    #[test]
    fn test_swap_keeps_identity() {
        let mut grid = Grid::with_layout(3, |at| {
            if at == Coord::new(0, 1) {
                (TileKind::CurveRb, Rotation::Deg90)
            } else {
                (TileKind::EndCap, Rotation::Deg0)
            }
        })
        .unwrap();

        grid.swap_shapes(Coord::new(0, 1), Coord::new(2, 0));

        let moved = grid.get(Coord::new(2, 0)).unwrap();
        assert_eq!(moved.kind(), TileKind::CurveRb);
        assert_eq!(moved.rotation(), Rotation::Deg90);
        assert_eq!(moved.coord(), Coord::new(2, 0));
        assert_eq!(grid.get(Coord::new(0, 1)).unwrap().kind(), TileKind::EndCap);
    }
}
