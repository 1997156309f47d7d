//! Experiment core: trials, conditions, interaction logging
//!
//! ## Lifecycle
//!
//! ```text
//!            start_trial                complete_trial         log ok
//!   Idle ───────────────> Running ───────────────────> AwaitingLog ──────> Idle
//!    ^                                                    │   ^
//!    │                 skip_logging                       │   │ complete_trial
//!    └────────────────────────────────────────────────────┘   │ (retry after
//!                                                  log failed ─┘  failure)
//! ```
//!
//! One trial produces at most one [`InteractionRecord`]; the per-trial
//! `logged` flag is set before every logger call and cleared only when that
//! call fails.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use chart_ab::experiment::{
//!     AppendMode, InteractionLogger, ParticipantSession, RandomSelector, TrialStateMachine,
//!     TrialStatus,
//! };
//! use chart_ab::store::MemoryStore;
//!
//! # async fn example() -> chart_ab::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let logger = InteractionLogger::new(store, "interactions", AppendMode::Native);
//! let mut machine = TrialStateMachine::new(
//!     ParticipantSession::new(),
//!     RandomSelector::from_entropy(),
//!     logger,
//! );
//!
//! machine.start_trial();
//! assert_eq!(machine.status(), TrialStatus::Running);
//! machine.complete_trial().await?;
//! assert_eq!(machine.status(), TrialStatus::Idle);
//! # Ok(())
//! # }
//! ```

mod log;
mod logger;
mod participant;
mod record;
mod selector;
mod state_machine;
mod trial;

pub use log::{InteractionLog, LogSnapshot};
pub use logger::{AppendMode, InteractionLogger};
pub use participant::{ParticipantId, ParticipantSession};
pub use record::{
    records_from_table, records_to_table, InteractionRecord, CONDITION_COLUMN, ELAPSED_COLUMN,
    INTERACTION_COLUMNS, PARTICIPANT_COLUMN, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT,
};
pub use selector::{ConditionSelector, RandomSelector, SequenceSelector};
pub use state_machine::{CompleteOutcome, StartOutcome, TrialStateMachine};
pub use trial::{Trial, TrialId, TrialStatus};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visualization treatment shown in a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Distribution view: violin + box per species for each measurement
    Violin,
    /// Relationship view: pairwise scatter of both measurements by species
    Pair,
}

impl Condition {
    /// The fixed condition set.
    pub const ALL: [Self; 2] = [Self::Violin, Self::Pair];

    /// Label persisted in the `chart_type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Violin => "violin",
            Self::Pair => "pair",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown chart type '{s}'"))
    }
}
