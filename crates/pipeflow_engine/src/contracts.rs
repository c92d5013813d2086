//! Contract-based validation for grid interactions.
//!
//! Contracts state what must hold before an interaction is applied
//! (preconditions) and what the grid must still satisfy afterwards
//! (postconditions): {P} interaction {Q}.

use crate::action::{Interaction, Rejection};
use crate::grid::Grid;
use crate::invariants::{GridInvariants, InvariantSet, InvariantViolation};
use crate::tile::TileKind;
use tracing::{instrument, warn};

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), Rejection>;

    /// Checks that the transition from `before` to `after` kept every invariant.
    fn post(before: &S, after: &S) -> Result<(), Vec<InvariantViolation>>;
}

// ─────────────────────────────────────────────────────────────
//  Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition: every targeted cell lies on the grid.
pub struct TargetsOnGrid;

impl TargetsOnGrid {
    /// Rejects the first off-grid target.
    #[instrument(skip(grid))]
    pub fn check(action: &Interaction, grid: &Grid) -> Result<(), Rejection> {
        match action.targets().into_iter().find(|at| !grid.contains(*at)) {
            Some(at) => Err(Rejection::OutOfBounds(at)),
            None => Ok(()),
        }
    }
}

/// Precondition: no targeted cell holds the source or inlet.
pub struct TargetsMovable;

impl TargetsMovable {
    /// Rejects the first fixed target.
    #[instrument(skip(grid))]
    pub fn check(action: &Interaction, grid: &Grid) -> Result<(), Rejection> {
        match action.targets().into_iter().find(|at| grid.is_fixed(*at)) {
            Some(at) => Err(Rejection::FixedTile(at)),
            None => Ok(()),
        }
    }
}

/// Precondition: a swap names two different cells.
pub struct DistinctCells;

impl DistinctCells {
    /// Rejects a swap of a cell with itself.
    #[instrument]
    pub fn check(action: &Interaction) -> Result<(), Rejection> {
        match action {
            Interaction::Swap { a, b } if a == b => Err(Rejection::SameCell(*a)),
            _ => Ok(()),
        }
    }
}

/// Composite precondition for any interaction.
pub struct LegalInteraction;

impl LegalInteraction {
    /// Validates all preconditions.
    #[instrument(skip(grid))]
    pub fn check(action: &Interaction, grid: &Grid) -> Result<(), Rejection> {
        TargetsOnGrid::check(action, grid)?;
        TargetsMovable::check(action, grid)?;
        DistinctCells::check(action)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Interaction Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for grid interactions.
///
/// Preconditions:
/// - Targets lie on the grid
/// - Targets are not fixed
/// - Swaps name distinct cells
///
/// Postconditions:
/// - Grid invariants hold
/// - The multiset of tile kinds is unchanged
pub struct InteractionContract;

impl Contract<Grid, Interaction> for InteractionContract {
    fn pre(grid: &Grid, action: &Interaction) -> Result<(), Rejection> {
        LegalInteraction::check(action, grid)
    }

    fn post(before: &Grid, after: &Grid) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = GridInvariants::check_all(after).err().unwrap_or_default();
        if !KindsPreserved::holds(before, after) {
            violations.push(InvariantViolation::new(
                "Interactions never create or destroy pipe shapes",
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Relation: two grids hold the same multiset of tile kinds.
pub struct KindsPreserved;

impl KindsPreserved {
    /// Compares the sorted kind lists of both grids.
    #[instrument(skip(before, after))]
    pub fn holds(before: &Grid, after: &Grid) -> bool {
        let kinds = |grid: &Grid| {
            let mut kinds: Vec<TileKind> = grid.tiles().iter().map(|tile| tile.kind()).collect();
            kinds.sort_unstable();
            kinds
        };

        let preserved = kinds(before) == kinds(after);
        if !preserved {
            warn!("Tile kinds changed across an interaction");
        }
        preserved
    }
}

/// Asserts the grid invariants (debug builds only).
#[instrument(skip(grid))]
pub fn assert_invariants(grid: &Grid) {
    debug_assert!(
        GridInvariants::check_all(grid).is_ok(),
        "Grid invariants violated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;
    use crate::tile::Rotation;

    fn grid() -> Grid {
        Grid::with_layout(4, |_| (TileKind::Cross, Rotation::Deg0)).unwrap()
    }

    #[test]
    fn test_rotate_movable_passes() {
        let action = Interaction::rotate(Coord::new(1, 2));
        assert!(InteractionContract::pre(&grid(), &action).is_ok());
    }

    #[test]
    fn test_fixed_targets_rejected() {
        let grid = grid();
        assert_eq!(
            InteractionContract::pre(&grid, &Interaction::rotate(Coord::new(0, 0))),
            Err(Rejection::FixedTile(Coord::new(0, 0)))
        );
        assert_eq!(
            InteractionContract::pre(
                &grid,
                &Interaction::swap(Coord::new(1, 1), Coord::new(3, 3))
            ),
            Err(Rejection::FixedTile(Coord::new(3, 3)))
        );
    }

    #[test]
    fn test_off_grid_rejected_before_fixed() {
        assert_eq!(
            InteractionContract::pre(
                &grid(),
                &Interaction::swap(Coord::new(0, 0), Coord::new(9, 1))
            ),
            Err(Rejection::OutOfBounds(Coord::new(9, 1)))
        );
    }

    #[test]
    fn test_self_swap_rejected() {
        let at = Coord::new(2, 2);
        assert_eq!(
            InteractionContract::pre(&grid(), &Interaction::swap(at, at)),
            Err(Rejection::SameCell(at))
        );
    }

    #[test]
    fn test_shuffle_has_no_targets() {
        assert!(InteractionContract::pre(&grid(), &Interaction::Shuffle).is_ok());
    }

    #[test]
    fn test_postcondition_holds_after_swap() {
        let before = Grid::with_layout(3, |at| {
            if at.col == 1 {
                (TileKind::CurveTr, Rotation::Deg0)
            } else {
                (TileKind::Broken, Rotation::Deg90)
            }
        })
        .unwrap();
        let mut after = before.clone();
        after.swap_shapes(Coord::new(0, 1), Coord::new(1, 0));
        assert!(InteractionContract::post(&before, &after).is_ok());
    }

    #[test]
    fn test_postcondition_detects_displaced_endpoint() {
        let before = grid();
        let mut after = before.clone();
        after.swap_shapes(Coord::new(0, 0), Coord::new(1, 1));
        let violations = InteractionContract::post(&before, &after).unwrap_err();
        assert!(!violations.is_empty());
    }
}
