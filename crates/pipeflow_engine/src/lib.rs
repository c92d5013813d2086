//! Pipe-network connectivity puzzle engine.
//!
//! A square grid of pipe tiles sits between a water source (top-left) and a
//! tank inlet (bottom-right). Players swap and rotate tiles until water can
//! travel from source to tank through mutually agreeing connections, racing
//! a countdown and a periodic leak check.
//!
//! # Architecture
//!
//! - **Grid**: tiles, rotations and connection resolution
//! - **Flow**: breadth-first water propagation and leak marking
//! - **Session**: the `Menu → Playing → Completed/Failed` state machine
//! - **Driver**: a tokio task that owns a session and its timers
//!
//! # Example
//!
//! ```no_run
//! use pipeflow_engine::{Coord, GameConfig, PuzzleSession};
//!
//! # fn example() -> Result<(), pipeflow_engine::SessionError> {
//! let mut session = PuzzleSession::new(GameConfig::default().with_seed(Some(7)));
//! session.start(1)?;
//! let outcome = session.rotate(Coord::new(0, 1));
//! println!("{outcome:?} at {:.0}% water", session.water_level_percent());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod connections;
mod contracts;
mod direction;
mod driver;
mod facts;
mod flow;
mod grid;
mod invariants;
mod level;
mod phases;
mod scoring;
mod session;
mod tile;
mod timer;

// Crate-level exports - Geometry and tiles
pub use direction::{Connections, Direction};
pub use grid::{Coord, DEFAULT_BROKEN_PROBABILITY, Grid, GridError, MIN_GRID_SIZE};
pub use tile::{Rotation, RotationError, Tile, TileKind};

// Crate-level exports - Connection resolution and flow
pub use connections::{canonical_connections, effective_connections, rotated_connections};
pub use flow::{FlowReport, dangling_tiles, is_complete, mark_open_ends, propagate, reciprocates};

// Crate-level exports - Correctness
pub use contracts::{
    Contract, DistinctCells, InteractionContract, KindsPreserved, LegalInteraction,
    TargetsMovable, TargetsOnGrid,
};
pub use invariants::{
    FixedEndpointsInvariant, GridInvariants, Invariant, InvariantSet, InvariantViolation,
    SourceSeededInvariant, WaterMirrorsConnectionInvariant,
};

// Crate-level exports - Session
pub use action::{Interaction, InteractionOutcome, Rejection};
pub use level::{ConfigError, GameConfig, LevelConfig, builtin_levels};
pub use phases::{CompletionReport, FailureReason, FailureReport, SessionEvent, SessionState};
pub use scoring::{
    FULL_POINTS_WINDOW_SECS, LEAK_EXPOSURE_CAP, LEAK_EXPOSURE_PER_TICK, PENALTY_PER_SECOND,
    accrue_leak_exposure, completion_score, water_level_percent,
};
pub use session::{HudStats, PuzzleSession, SessionError, SessionSnapshot};

// Crate-level exports - Async driver
pub use driver::{DriverError, SessionDriver, SessionHandle};
pub use timer::{CLOCK_PERIOD, LEAK_CHECK_PERIOD, PeriodicTimer};

// Crate-level exports - Flavor text
pub use facts::{WATER_FACTS, fact, random_fact};
