//! First-class interaction types.
//!
//! Interactions are the only legal grid mutations. They describe the
//! player's intent and are validated before anything is applied.

use crate::grid::Coord;
use crate::phases::{SessionEvent, SessionState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A player request to mutate the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Interaction {
    /// Exchange the pipe shapes of two cells.
    Swap {
        /// First cell.
        a: Coord,
        /// Second cell.
        b: Coord,
    },
    /// Turn one cell a quarter turn clockwise.
    Rotate {
        /// Target cell.
        at: Coord,
    },
    /// Re-roll the rotation of every movable cell.
    Shuffle,
}

impl Interaction {
    /// Creates a swap request.
    #[instrument]
    pub fn swap(a: Coord, b: Coord) -> Self {
        Self::Swap { a, b }
    }

    /// Creates a rotate request.
    #[instrument]
    pub fn rotate(at: Coord) -> Self {
        Self::Rotate { at }
    }

    /// Cells this interaction targets directly.
    pub fn targets(&self) -> Vec<Coord> {
        match self {
            Interaction::Swap { a, b } => vec![*a, *b],
            Interaction::Rotate { at } => vec![*at],
            Interaction::Shuffle => Vec::new(),
        }
    }
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::Swap { a, b } => write!(f, "swap {} <-> {}", a, b),
            Interaction::Rotate { at } => write!(f, "rotate {}", at),
            Interaction::Shuffle => write!(f, "shuffle"),
        }
    }
}

/// Why an interaction was ignored.
///
/// Ignored interactions are silent no-ops, not errors: the front end is
/// expected to prevent most of them already.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, Serialize, Deserialize)]
pub enum Rejection {
    /// The session is not accepting moves.
    #[display("Session is {}, not playing", _0)]
    NotPlaying(SessionState),

    /// The cell holds the source or the inlet.
    #[display("Tile at {} is fixed", _0)]
    FixedTile(Coord),

    /// The cell lies outside the grid.
    #[display("{} is outside the grid", _0)]
    OutOfBounds(Coord),

    /// A swap named the same cell twice.
    #[display("Cannot swap {} with itself", _0)]
    SameCell(Coord),
}

/// Result of submitting an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionOutcome {
    /// The grid changed and was re-propagated.
    Applied {
        /// Transition caused by the move, if any.
        event: Option<SessionEvent>,
    },
    /// Nothing changed.
    Ignored(Rejection),
}

impl InteractionOutcome {
    /// Whether the grid was mutated.
    pub fn is_applied(&self) -> bool {
        matches!(self, InteractionOutcome::Applied { .. })
    }

    /// Transition event produced by the move, if any.
    pub fn event(&self) -> Option<SessionEvent> {
        match self {
            InteractionOutcome::Applied { event } => *event,
            InteractionOutcome::Ignored(_) => None,
        }
    }
}
