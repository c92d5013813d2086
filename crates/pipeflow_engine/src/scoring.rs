//! Scoring and per-second meters.

use tracing::instrument;

/// Completions within this many seconds earn full points.
pub const FULL_POINTS_WINDOW_SECS: u32 = 60;

/// Points lost per second beyond the full-points window.
pub const PENALTY_PER_SECOND: u32 = 2;

/// Leak exposure added on every clock tick, in percent.
pub const LEAK_EXPOSURE_PER_TICK: f64 = 0.3;

/// Ceiling of the leak exposure meter, in percent.
pub const LEAK_EXPOSURE_CAP: f64 = 100.0;

/// Points awarded for connecting the tank after `elapsed_secs`.
///
/// Full `base_points` up to [`FULL_POINTS_WINDOW_SECS`], then
/// [`PENALTY_PER_SECOND`] less for every extra second, floored at zero.
#[instrument]
pub fn completion_score(base_points: u32, elapsed_secs: u32) -> u32 {
    let overtime = elapsed_secs.saturating_sub(FULL_POINTS_WINDOW_SECS);
    base_points.saturating_sub(overtime.saturating_mul(PENALTY_PER_SECOND))
}

/// Leak exposure after one more tick, capped at [`LEAK_EXPOSURE_CAP`].
pub fn accrue_leak_exposure(current: f64) -> f64 {
    (current + LEAK_EXPOSURE_PER_TICK).min(LEAK_EXPOSURE_CAP)
}

/// Share of the grid carrying water, in percent.
pub fn water_level_percent(connected: usize, cells: usize) -> f64 {
    if cells == 0 {
        return 0.0;
    }
    connected as f64 / cells as f64 * 100.0
}
