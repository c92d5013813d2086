//! Session phases, failure reasons and transition events.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Why a play-through failed.
///
/// Failures are game outcomes, not errors: they are expected, shown to the
/// player and recoverable by restarting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// The countdown reached zero before the tank was connected.
    #[display("time ran out")]
    TimeRanOut,
    /// A watered tile was found leaking during a periodic check.
    #[display("leak detected")]
    LeakDetected,
}

/// Lifecycle state of a puzzle session.
///
/// A failed session always carries its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// Level selection; no grid exists.
    #[default]
    Menu,
    /// Timers running, grid accepts interactions.
    Playing,
    /// Water reached the tank.
    Completed,
    /// The play-through ended without reaching the tank.
    Failed(FailureReason),
}

impl SessionState {
    /// Whether the session is in the `Playing` state.
    pub fn is_playing(&self) -> bool {
        matches!(self, SessionState::Playing)
    }

    /// Whether the session reached `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed(_))
    }

    /// Failure reason, present only in the `Failed` state.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            SessionState::Failed(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Menu => write!(f, "Menu"),
            SessionState::Playing => write!(f, "Playing"),
            SessionState::Completed => write!(f, "Completed"),
            SessionState::Failed(reason) => write!(f, "Failed ({})", reason),
        }
    }
}

/// Summary published when the tank is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Points awarded.
    pub score: u32,
    /// Seconds played before completion.
    pub time_elapsed_secs: u32,
    /// Moves made since the last shuffle.
    pub move_count: u32,
}

/// Summary published when a play-through fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// What ended the play-through.
    pub reason: FailureReason,
    /// Seconds played before failing.
    pub time_elapsed_secs: u32,
    /// Moves made since the last shuffle.
    pub move_count: u32,
}

/// Terminal transition events for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// The session entered `Completed`.
    Completed(CompletionReport),
    /// The session entered `Failed`.
    Failed(FailureReport),
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Completed(report) => write!(
                f,
                "Completed in {}s with {} moves: {} points",
                report.time_elapsed_secs, report.move_count, report.score
            ),
            SessionEvent::Failed(report) => write!(
                f,
                "Failed after {}s and {} moves: {}",
                report.time_elapsed_secs, report.move_count, report.reason
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reasons_read_naturally() {
        assert_eq!(FailureReason::TimeRanOut.to_string(), "time ran out");
        assert_eq!(FailureReason::LeakDetected.to_string(), "leak detected");
    }

    #[test]
    fn test_only_failed_has_reason() {
        assert_eq!(SessionState::Playing.failure_reason(), None);
        assert_eq!(SessionState::Completed.failure_reason(), None);
        assert_eq!(
            SessionState::Failed(FailureReason::LeakDetected).failure_reason(),
            Some(FailureReason::LeakDetected)
        );
        assert!(SessionState::Failed(FailureReason::TimeRanOut).is_terminal());
        assert!(!SessionState::Menu.is_terminal());
    }
}
