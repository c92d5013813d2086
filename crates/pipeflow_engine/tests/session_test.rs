//! Tests for the puzzle session state machine.

use pipeflow_engine::{
    CompletionReport, Coord, FailureReason, GameConfig, Grid, InteractionOutcome, LevelConfig,
    PuzzleSession, Rejection, Rotation, SessionEvent, SessionState, TileKind, completion_score,
    is_complete, propagate,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn config() -> GameConfig {
    GameConfig::new(
        0.1,
        Some(42),
        vec![
            LevelConfig::new(1, 5, 120, 100, "Beginner Plumber", ""),
            LevelConfig::new(2, 5, 30, 200, "Second", ""),
        ],
    )
    .unwrap()
}

/// Top-row channel into the right column, with one cell overridden.
fn channel_with(override_at: Coord, kind: TileKind, rotation: Rotation) -> Grid {
    Grid::with_layout(5, |at| {
        if at == override_at {
            return (kind, rotation);
        }
        match (at.row, at.col) {
            (0, 4) => (TileKind::CurveBl, Rotation::Deg0),
            (0, _) => (TileKind::StraightH, Rotation::Deg0),
            (_, 4) => (TileKind::StraightV, Rotation::Deg0),
            _ => (TileKind::EndCap, Rotation::Deg0),
        }
    })
    .unwrap()
}

/// Channel that is one clockwise turn of (2,4) away from solved.
fn almost_solved() -> Grid {
    channel_with(Coord::new(2, 4), TileKind::StraightH, Rotation::Deg0)
}

/// Grid where only the source is wet and nothing dangles.
fn dry() -> Grid {
    Grid::with_layout(5, |_| (TileKind::EndCap, Rotation::Deg0)).unwrap()
}

/// Mixed shapes; broken tiles in front of the inlet keep it dry.
fn walled_off() -> Grid {
    Grid::with_layout(5, |at| match (at.row, at.col) {
        (3, 4) | (4, 3) => (TileKind::Broken, Rotation::Deg0),
        (row, col) => (TileKind::PIPE_CATALOG[(row * 5 + col) % 8], Rotation::Deg0),
    })
    .unwrap()
}

#[test]
fn test_already_solved_grid_completes_on_entry() {
    let mut session = PuzzleSession::new(config());
    let solved = channel_with(Coord::new(2, 4), TileKind::StraightV, Rotation::Deg0);
    let event = session.start_with_grid(1, solved).unwrap();

    assert_eq!(
        event,
        Some(SessionEvent::Completed(CompletionReport {
            score: 100,
            time_elapsed_secs: 0,
            move_count: 0,
        }))
    );
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.water_level_percent(), 100.0);
}

#[test]
fn test_rotation_completes_level() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    assert_eq!(session.state(), SessionState::Playing);

    let outcome = session.rotate(Coord::new(2, 4));
    assert_eq!(
        outcome.event(),
        Some(SessionEvent::Completed(CompletionReport {
            score: 100,
            time_elapsed_secs: 0,
            move_count: 1,
        }))
    );
    assert_eq!(session.score(), 100);
}

#[test]
fn test_countdown_to_zero_fails() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(2, dry()).unwrap();

    let events: Vec<_> = (0..40).filter_map(|_| session.tick()).collect();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        SessionEvent::Failed(report)
            if report.reason == FailureReason::TimeRanOut && report.time_elapsed_secs == 30
    ));
    assert_eq!(session.state(), SessionState::Failed(FailureReason::TimeRanOut));
    assert_eq!(session.state().to_string(), "Failed (time ran out)");
    assert_eq!(session.time_left_secs(), 0);
    assert_eq!(session.time_elapsed_secs(), 30);
}

#[test]
fn test_broken_tile_on_path_fails_leak_check() {
    let mut session = PuzzleSession::new(config());
    let grid = channel_with(Coord::new(0, 2), TileKind::Broken, Rotation::Deg0);
    assert_eq!(session.start_with_grid(1, grid).unwrap(), None);

    session.tick();
    session.tick();
    let event = session.check_leaks();
    assert!(matches!(
        event,
        Some(SessionEvent::Failed(report)) if report.reason == FailureReason::LeakDetected
    ));
    assert_eq!(session.state().failure_reason(), Some(FailureReason::LeakDetected));
}

#[test]
fn test_leak_check_passes_without_dangling_tiles() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, dry()).unwrap();
    assert_eq!(session.check_leaks(), None);
    assert_eq!(session.state(), SessionState::Playing);
}

#[test]
fn test_shuffle_resets_moves_and_keeps_kinds() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, walled_off()).unwrap();
    session.rotate(Coord::new(1, 1));
    session.rotate(Coord::new(2, 3));
    assert_eq!(session.move_count(), 2);

    let before = session.grid().unwrap().clone();
    let outcome = session.shuffle();
    let after = session.grid().unwrap();

    assert!(outcome.is_applied());
    assert_eq!(session.move_count(), 0);
    for (old, new) in before.tiles().iter().zip(after.tiles()) {
        assert_eq!(old.kind(), new.kind());
        if old.is_fixed() {
            assert_eq!(new.rotation(), Rotation::Deg0);
        }
    }
    let changed = before
        .tiles()
        .iter()
        .zip(after.tiles())
        .filter(|(old, new)| old.rotation() != new.rotation())
        .count();
    assert!(changed > 0);
}

#[test]
fn test_swap_moves_shapes_not_cells() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();

    let outcome = session.swap(Coord::new(0, 1), Coord::new(3, 1));
    assert!(outcome.is_applied());
    let grid = session.grid().unwrap();
    assert_eq!(grid.get(Coord::new(0, 1)).unwrap().kind(), TileKind::EndCap);
    assert_eq!(grid.get(Coord::new(3, 1)).unwrap().kind(), TileKind::StraightH);
    assert_eq!(grid.get(Coord::new(3, 1)).unwrap().coord(), Coord::new(3, 1));
    assert_eq!(session.move_count(), 1);
    assert!(!grid.get(Coord::new(0, 2)).unwrap().has_water());
}

#[test]
fn test_moves_on_endpoints_change_nothing() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    let before = session.snapshot();

    assert_eq!(
        session.swap(Coord::new(0, 0), Coord::new(1, 1)),
        InteractionOutcome::Ignored(Rejection::FixedTile(Coord::new(0, 0)))
    );
    assert_eq!(
        session.rotate(Coord::new(4, 4)),
        InteractionOutcome::Ignored(Rejection::FixedTile(Coord::new(4, 4)))
    );
    assert_eq!(
        session.rotate(Coord::new(5, 0)),
        InteractionOutcome::Ignored(Rejection::OutOfBounds(Coord::new(5, 0)))
    );
    assert_eq!(session.snapshot(), before);
}

#[test]
fn test_terminal_states_ignore_moves_and_ticks() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    session.rotate(Coord::new(2, 4));
    let elapsed = session.time_elapsed_secs();

    assert_eq!(session.tick(), None);
    assert_eq!(session.check_leaks(), None);
    assert_eq!(session.time_elapsed_secs(), elapsed);
    assert_eq!(
        session.rotate(Coord::new(1, 1)),
        InteractionOutcome::Ignored(Rejection::NotPlaying(SessionState::Completed))
    );
}

#[test]
fn test_late_completion_is_penalized() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    for _ in 0..75 {
        session.tick();
    }
    session.rotate(Coord::new(2, 4));

    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(session.score(), completion_score(100, 75));
    assert_eq!(session.score(), 70);
}

#[test]
fn test_restart_after_failure() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(2, dry()).unwrap();
    while session.state().is_playing() {
        session.tick();
    }
    let epoch = session.epoch();

    session.restart().unwrap();
    assert_eq!(session.epoch(), epoch + 1);
    assert_eq!(session.time_left_secs(), 30);
    assert_eq!(session.hud().level, Some(2));
}

#[test]
fn test_next_level_advances_then_returns_to_menu() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    session.rotate(Coord::new(2, 4));

    session.next_level().unwrap();
    assert_eq!(session.level().map(|level| *level.level()), Some(2));

    session.exit_to_menu();
    session.start_with_grid(2, almost_solved()).unwrap();
    session.rotate(Coord::new(2, 4));
    assert_eq!(session.next_level(), Ok(None));
    assert_eq!(session.state(), SessionState::Menu);
    assert!(session.grid().is_none());
}

#[test]
fn test_water_level_tracks_connected_share() {
    let mut session = PuzzleSession::new(config());
    session.start_with_grid(1, almost_solved()).unwrap();
    // Source, four top-row tiles and (1,4) carry water.
    assert_eq!(session.water_level_percent(), 6.0 / 25.0 * 100.0);
}

#[test]
fn test_random_moves_complete_exactly_when_inlet_is_watered() {
    let mut session = PuzzleSession::new(config());
    session.start(1).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for step in 0..300 {
        if session.state() == SessionState::Completed {
            session.restart().unwrap();
        }

        let mut cell = || Coord::new(rng.gen_range(0..5), rng.gen_range(0..5));
        let outcome = if step % 3 == 0 {
            let (a, b) = (cell(), cell());
            session.swap(a, b)
        } else {
            let at = cell();
            session.rotate(at)
        };

        let grid = session.grid().unwrap();
        let inlet = grid.get(grid.inlet()).unwrap();
        let watered = inlet.connected() && inlet.has_water();
        assert_eq!(is_complete(grid), watered, "step {step}");
        assert_eq!(propagate(&mut grid.clone()).puzzle_complete, watered, "step {step}");
        assert_eq!(session.state() == SessionState::Completed, watered, "step {step}");
        if let Some(SessionEvent::Completed(_)) = outcome.event() {
            assert!(watered, "step {step}");
        }

        let source = grid.get(grid.source()).unwrap();
        assert_eq!(source.kind(), TileKind::Start);
        assert_eq!(source.coord(), Coord::new(0, 0));
        assert_eq!(inlet.kind(), TileKind::End);
        assert_eq!(inlet.coord(), Coord::new(4, 4));
    }
}
