//! Trial value object

use super::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Unique identifier of one trial attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrialId(Uuid);

impl TrialId {
    /// Generate a new random trial id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of the current trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    /// No trial active.
    Idle,
    /// Chart shown, timer running.
    Running,
    /// Participant answered; record not yet confirmed written.
    AwaitingLog,
}

/// One instance of showing a condition and timing the response.
///
/// Owned and mutated only by the state machine.
#[derive(Debug, Clone)]
pub struct Trial {
    id: TrialId,
    condition: Condition,
    started_at: Instant,
    status: TrialStatus,
    elapsed_seconds: Option<f64>,
    logged: bool,
}

impl Trial {
    pub(crate) fn start(condition: Condition, started_at: Instant) -> Self {
        Self {
            id: TrialId::new(),
            condition,
            started_at,
            status: TrialStatus::Running,
            elapsed_seconds: None,
            logged: false,
        }
    }

    /// Trial id.
    #[must_use]
    pub const fn id(&self) -> TrialId {
        self.id
    }

    /// Condition shown.
    #[must_use]
    pub const fn condition(&self) -> Condition {
        self.condition
    }

    /// Monotonic start time.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> TrialStatus {
        self.status
    }

    /// Elapsed seconds, fixed when the participant answered.
    #[must_use]
    pub const fn elapsed_seconds(&self) -> Option<f64> {
        self.elapsed_seconds
    }

    /// Whether a log write was attempted and not seen to fail.
    ///
    /// Stays set if the completing future was dropped mid-write, since the
    /// row may or may not have landed.
    #[must_use]
    pub const fn is_logged(&self) -> bool {
        self.logged
    }

    /// Running -> AwaitingLog. `now` earlier than the start counts as zero.
    pub(crate) fn finish(&mut self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        self.elapsed_seconds = Some(elapsed);
        self.status = TrialStatus::AwaitingLog;
        elapsed
    }

    pub(crate) fn set_logged(&mut self, logged: bool) {
        self.logged = logged;
    }
}
