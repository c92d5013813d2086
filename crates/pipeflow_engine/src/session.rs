//! Puzzle session controller.
//!
//! The session owns the grid and every per-play-through counter, and is the
//! only place state transitions happen:
//!
//! ```text
//! Menu ──start──▶ Playing ──tank connected──▶ Completed
//!                    │                            │
//!                    ├──clock hits 0 / leak──▶ Failed
//!                    │                            │
//!                    ◀────────── restart ─────────┘
//! any state ──exit_to_menu──▶ Menu
//! ```
//!
//! The session is synchronous. Something else has to call [`PuzzleSession::tick`]
//! every second and [`PuzzleSession::check_leaks`] every two seconds while
//! playing; see [`crate::SessionDriver`].

use crate::action::{Interaction, InteractionOutcome, Rejection};
use crate::contracts::{Contract, InteractionContract, assert_invariants};
use crate::flow::{self, FlowReport};
use crate::grid::{Coord, Grid, GridError};
use crate::level::{GameConfig, LevelConfig};
use crate::phases::{CompletionReport, FailureReason, FailureReport, SessionEvent, SessionState};
use crate::scoring::{accrue_leak_exposure, completion_score, water_level_percent};
use derive_more::{Display, Error};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

/// Errors from session commands.
///
/// These are caller mistakes (unknown level, wrong phase), never game
/// outcomes: timeouts and leaks are [`SessionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// The level number is not in the catalog.
    #[display("Level {} is not in the catalog", level)]
    UnknownLevel {
        /// Requested level number.
        level: usize,
    },

    /// Restart was requested before any level was chosen.
    #[display("No level has been selected")]
    NoLevelSelected,

    /// Advancing requires a completed level.
    #[display("Cannot advance to the next level while {}", state)]
    NotCompleted {
        /// State at the time of the request.
        state: SessionState,
    },

    /// A supplied grid does not match the level's size.
    #[display("Level needs a {}×{} grid, got {}×{}", expected, expected, actual, actual)]
    GridSizeMismatch {
        /// Size from the level configuration.
        expected: usize,
        /// Size of the supplied grid.
        actual: usize,
    },

    /// Grid construction failed.
    #[display("{}", _0)]
    Grid(GridError),
}

impl From<GridError> for SessionError {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}

/// Heads-up display counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudStats {
    /// Number of the active level, if any.
    pub level: Option<usize>,
    /// Lifecycle state.
    pub state: SessionState,
    /// Points awarded on completion; zero until then.
    pub score: u32,
    /// Countdown remaining.
    pub time_left_secs: u32,
    /// Seconds played.
    pub time_elapsed_secs: u32,
    /// Cumulative leak exposure, 0-100.
    pub leak_exposure_percent: f64,
    /// Share of the grid carrying water, 0-100.
    pub water_level_percent: f64,
    /// Moves since the level started or was last shuffled.
    pub move_count: u32,
}

/// Read-only view of a session for presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Counters.
    pub hud: HudStats,
    /// Active level configuration.
    pub level: Option<LevelConfig>,
    /// Current grid; absent in the menu.
    pub grid: Option<Grid>,
}

/// The puzzle session state machine.
#[derive(Debug)]
pub struct PuzzleSession {
    config: GameConfig,
    level: Option<LevelConfig>,
    grid: Option<Grid>,
    state: SessionState,
    score: u32,
    time_left_secs: u32,
    time_elapsed_secs: u32,
    leak_exposure_percent: f64,
    water_level_percent: f64,
    move_count: u32,
    epoch: u64,
    rng: ChaCha8Rng,
}

impl PuzzleSession {
    /// Creates a session in the menu.
    ///
    /// Uses the configured seed when present, otherwise OS entropy.
    #[instrument(skip(config), fields(seed = ?config.seed()))]
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(*seed),
            None => ChaCha8Rng::from_entropy(),
        };
        info!("Creating puzzle session");
        Self {
            config,
            level: None,
            grid: None,
            state: SessionState::Menu,
            score: 0,
            time_left_secs: 0,
            time_elapsed_secs: 0,
            leak_exposure_percent: 0.0,
            water_level_percent: 0.0,
            move_count: 0,
            epoch: 0,
            rng,
        }
    }

    // ─────────────────────────────────────────────────────────
    //  Accessors
    // ─────────────────────────────────────────────────────────

    /// Game configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Active level.
    pub fn level(&self) -> Option<&LevelConfig> {
        self.level.as_ref()
    }

    /// Current grid; absent in the menu.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Incremented every time the session enters `Playing`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Points awarded on completion.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Countdown remaining.
    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    /// Seconds played.
    pub fn time_elapsed_secs(&self) -> u32 {
        self.time_elapsed_secs
    }

    /// Cumulative leak exposure, 0-100.
    pub fn leak_exposure_percent(&self) -> f64 {
        self.leak_exposure_percent
    }

    /// Share of the grid carrying water, 0-100.
    pub fn water_level_percent(&self) -> f64 {
        self.water_level_percent
    }

    /// Moves since the level started or was last shuffled.
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    /// Heads-up display counters.
    pub fn hud(&self) -> HudStats {
        HudStats {
            level: self.level.as_ref().map(|level| *level.level()),
            state: self.state,
            score: self.score,
            time_left_secs: self.time_left_secs,
            time_elapsed_secs: self.time_elapsed_secs,
            leak_exposure_percent: self.leak_exposure_percent,
            water_level_percent: self.water_level_percent,
            move_count: self.move_count,
        }
    }

    /// Owned copy of everything a renderer needs.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            hud: self.hud(),
            level: self.level.clone(),
            grid: self.grid.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────
    //  Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Enters `Playing` on a freshly generated grid for `level`.
    ///
    /// Returns `Completed` right away in the rare case the generated grid is
    /// already solved.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn start(&mut self, level: usize) -> Result<Option<SessionEvent>, SessionError> {
        let level = self.lookup(level)?;
        let grid = Grid::generate(
            *level.grid_size(),
            *self.config.broken_probability(),
            &mut self.rng,
        )?;
        Ok(self.enter_playing(level, grid))
    }

    /// Enters `Playing` for `level` on a prepared grid.
    #[instrument(skip(self, grid), fields(state = %self.state, size = grid.size()))]
    pub fn start_with_grid(
        &mut self,
        level: usize,
        grid: Grid,
    ) -> Result<Option<SessionEvent>, SessionError> {
        let level = self.lookup(level)?;
        if grid.size() != *level.grid_size() {
            warn!(expected = *level.grid_size(), "Prepared grid has the wrong size");
            return Err(SessionError::GridSizeMismatch {
                expected: *level.grid_size(),
                actual: grid.size(),
            });
        }
        Ok(self.enter_playing(level, grid))
    }

    /// Replays the current level on a new grid.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn restart(&mut self) -> Result<Option<SessionEvent>, SessionError> {
        let level = self
            .level
            .as_ref()
            .map(|level| *level.level())
            .ok_or(SessionError::NoLevelSelected)?;
        info!(level, "Restarting level");
        self.start(level)
    }

    /// Moves from a completed level to the next one, or back to the menu
    /// after the last level.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn next_level(&mut self) -> Result<Option<SessionEvent>, SessionError> {
        if self.state != SessionState::Completed {
            return Err(SessionError::NotCompleted { state: self.state });
        }
        let current = self
            .level
            .as_ref()
            .map(|level| *level.level())
            .ok_or(SessionError::NoLevelSelected)?;

        match self.config.next_level(current).map(|level| *level.level()) {
            Some(next) => self.start(next),
            None => {
                info!(level = current, "Final level completed, returning to menu");
                self.exit_to_menu();
                Ok(None)
            }
        }
    }

    /// Returns to the menu and discards the grid.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn exit_to_menu(&mut self) {
        self.state = SessionState::Menu;
        self.level = None;
        self.grid = None;
        self.score = 0;
        self.time_left_secs = 0;
        self.time_elapsed_secs = 0;
        self.leak_exposure_percent = 0.0;
        self.water_level_percent = 0.0;
        self.move_count = 0;
        info!("Back at the menu");
    }

    // ─────────────────────────────────────────────────────────
    //  Periodic callbacks
    // ─────────────────────────────────────────────────────────

    /// One-second clock tick. Ignored outside `Playing`.
    #[instrument(level = "debug", skip(self), fields(state = %self.state))]
    pub fn tick(&mut self) -> Option<SessionEvent> {
        if !self.state.is_playing() {
            return None;
        }

        self.time_elapsed_secs = self.time_elapsed_secs.saturating_add(1);
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        self.leak_exposure_percent = accrue_leak_exposure(self.leak_exposure_percent);
        trace!(
            time_left = self.time_left_secs,
            leak_exposure = self.leak_exposure_percent,
            "Tick"
        );

        if self.time_left_secs == 0 {
            return Some(self.fail(FailureReason::TimeRanOut));
        }
        None
    }

    /// Two-second leak check. Ignored outside `Playing`.
    ///
    /// Re-runs the leak pass and the dangling-connection scan; any leaking
    /// or dangling tile fails the session.
    #[instrument(level = "debug", skip(self), fields(state = %self.state))]
    pub fn check_leaks(&mut self) -> Option<SessionEvent> {
        if !self.state.is_playing() {
            return None;
        }
        let grid = self.grid.as_mut()?;

        let leaking = flow::mark_open_ends(grid);
        let dangling = flow::dangling_tiles(grid).len();
        if leaking > 0 || dangling > 0 {
            warn!(leaking, dangling, "Leak detected");
            return Some(self.fail(FailureReason::LeakDetected));
        }
        debug!("No leaks");
        None
    }

    // ─────────────────────────────────────────────────────────
    //  Interactions
    // ─────────────────────────────────────────────────────────

    /// Applies an interaction and re-propagates.
    ///
    /// Requests outside `Playing`, on fixed tiles or off the grid are
    /// ignored without touching any state.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn interact(&mut self, interaction: Interaction) -> InteractionOutcome {
        if !self.state.is_playing() {
            debug!("Interaction outside play ignored");
            return InteractionOutcome::Ignored(Rejection::NotPlaying(self.state));
        }
        let Some(grid) = self.grid.as_mut() else {
            return InteractionOutcome::Ignored(Rejection::NotPlaying(self.state));
        };

        if let Err(rejection) = InteractionContract::pre(grid, &interaction) {
            debug!(%rejection, "Interaction ignored");
            return InteractionOutcome::Ignored(rejection);
        }

        #[cfg(debug_assertions)]
        let before = grid.clone();

        match interaction {
            Interaction::Swap { a, b } => {
                grid.swap_shapes(a, b);
                self.move_count += 1;
            }
            Interaction::Rotate { at } => {
                grid.rotate_cell(at);
                self.move_count += 1;
            }
            Interaction::Shuffle => {
                grid.randomize_rotations(&mut self.rng);
                self.move_count = 0;
            }
        }

        let report = self.repropagate();

        #[cfg(debug_assertions)]
        if let Some(after) = self.grid.as_ref() {
            debug_assert!(
                InteractionContract::post(&before, after).is_ok(),
                "Interaction postcondition failed"
            );
        }

        info!(move_count = self.move_count, ?report, "Interaction applied");
        let event = report
            .filter(|report| report.puzzle_complete)
            .map(|_| self.complete());
        InteractionOutcome::Applied { event }
    }

    /// Swaps the pipe shapes of two cells.
    pub fn swap(&mut self, a: Coord, b: Coord) -> InteractionOutcome {
        self.interact(Interaction::swap(a, b))
    }

    /// Rotates one cell a quarter turn clockwise.
    pub fn rotate(&mut self, at: Coord) -> InteractionOutcome {
        self.interact(Interaction::rotate(at))
    }

    /// Re-rolls every movable rotation and resets the move counter.
    pub fn shuffle(&mut self) -> InteractionOutcome {
        self.interact(Interaction::Shuffle)
    }

    // ─────────────────────────────────────────────────────────
    //  Transitions
    // ─────────────────────────────────────────────────────────

    fn lookup(&self, level: usize) -> Result<LevelConfig, SessionError> {
        self.config.level(level).cloned().ok_or_else(|| {
            warn!(level, "Unknown level requested");
            SessionError::UnknownLevel { level }
        })
    }

    fn enter_playing(&mut self, level: LevelConfig, grid: Grid) -> Option<SessionEvent> {
        self.time_left_secs = *level.time_limit_secs();
        self.level = Some(level);
        self.grid = Some(grid);
        self.state = SessionState::Playing;
        self.score = 0;
        self.time_elapsed_secs = 0;
        self.leak_exposure_percent = 0.0;
        self.water_level_percent = 0.0;
        self.move_count = 0;
        self.epoch += 1;

        let report = self.repropagate();
        info!(
            level = ?self.level.as_ref().map(|level| *level.level()),
            epoch = self.epoch,
            time_left = self.time_left_secs,
            "▶ Playing"
        );

        if report.is_some_and(|report| report.puzzle_complete) {
            return Some(self.complete());
        }
        None
    }

    fn repropagate(&mut self) -> Option<FlowReport> {
        let grid = self.grid.as_mut()?;
        let report = flow::propagate(grid);
        assert_invariants(grid);
        self.water_level_percent =
            water_level_percent(report.connected_count, grid.cell_count());
        Some(report)
    }

    fn complete(&mut self) -> SessionEvent {
        let base_points = self
            .level
            .as_ref()
            .map(|level| *level.base_points())
            .unwrap_or_default();
        self.score = completion_score(base_points, self.time_elapsed_secs);
        self.water_level_percent = 100.0;
        self.state = SessionState::Completed;

        let report = CompletionReport {
            score: self.score,
            time_elapsed_secs: self.time_elapsed_secs,
            move_count: self.move_count,
        };
        info!(?report, "🏆 Completed");
        SessionEvent::Completed(report)
    }

    fn fail(&mut self, reason: FailureReason) -> SessionEvent {
        self.state = SessionState::Failed(reason);

        let report = FailureReport {
            reason,
            time_elapsed_secs: self.time_elapsed_secs,
            move_count: self.move_count,
        };
        info!(%reason, ?report, "💧 Failed");
        SessionEvent::Failed(report)
    }
}
