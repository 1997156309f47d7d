//! Trial state machine
//!
//! Drives one participant's trials: `Idle -> Running -> AwaitingLog -> Idle`.
//! Transitions are invoked sequentially by user action, so the machine takes
//! `&mut self` and needs no locking.

use super::{
    Condition, ConditionSelector, InteractionLogger, InteractionRecord, ParticipantSession, Trial,
    TrialId, TrialStatus,
};
use crate::clock::Clock;
use crate::store::DataStore;
use crate::Result;
use tracing::{debug, info, warn};

/// Result of [`TrialStateMachine::start_trial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new trial is running.
    Started {
        /// New trial id
        trial_id: TrialId,
        /// Condition to render
        condition: Condition,
    },
    /// A trial was already active; nothing changed.
    Ignored(TrialStatus),
}

/// Result of a successful [`TrialStateMachine::complete_trial`].
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    /// The trial was logged and the machine is idle again.
    Logged(InteractionRecord),
    /// No trial awaited completion; nothing changed.
    Ignored(TrialStatus),
}

/// Per-session trial lifecycle with exactly-once logging.
pub struct TrialStateMachine<S, K, C> {
    session: ParticipantSession,
    selector: K,
    logger: InteractionLogger<S, C>,
    trial: Option<Trial>,
}

impl<S, K, C> TrialStateMachine<S, K, C>
where
    S: DataStore,
    K: ConditionSelector,
    C: Clock,
{
    /// Create an idle machine. Elapsed time uses the logger's clock.
    #[must_use]
    pub const fn new(session: ParticipantSession, selector: K, logger: InteractionLogger<S, C>) -> Self {
        Self {
            session,
            selector,
            logger,
            trial: None,
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TrialStatus {
        self.trial.as_ref().map_or(TrialStatus::Idle, Trial::status)
    }

    /// The active trial, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Trial> {
        self.trial.as_ref()
    }

    /// The participant session.
    #[must_use]
    pub const fn session(&self) -> &ParticipantSession {
        &self.session
    }

    /// The logger.
    #[must_use]
    pub const fn logger(&self) -> &InteractionLogger<S, C> {
        &self.logger
    }

    /// Idle -> Running: draw a condition and start the timer.
    ///
    /// Ignored while a trial is `Running` or `AwaitingLog`, so duplicate
    /// triggers never restart the timer.
    pub fn start_trial(&mut self) -> StartOutcome {
        if let Some(active) = &self.trial {
            debug!(trial = %active.id(), status = ?active.status(), "start ignored, trial active");
            return StartOutcome::Ignored(active.status());
        }

        let condition = self.selector.select_condition();
        let trial = Trial::start(condition, self.logger.clock().now());
        let trial_id = trial.id();
        debug!(trial = %trial_id, %condition, "trial started");
        self.trial = Some(trial);
        StartOutcome::Started {
            trial_id,
            condition,
        }
    }

    /// Running -> AwaitingLog -> Idle: stop the timer and log the result.
    ///
    /// From `AwaitingLog` after a failed write, retries the write with the
    /// elapsed time fixed at the first completion. From `Idle` it is a no-op.
    ///
    /// If this future is dropped mid-write, the trial stays in `AwaitingLog`
    /// and is not retried; [`skip_logging`](Self::skip_logging) releases it.
    ///
    /// # Errors
    /// Returns [`crate::Error::LogWriteFailure`] if the write fails; the
    /// trial stays in `AwaitingLog` and may be retried.
    pub async fn complete_trial(&mut self) -> Result<CompleteOutcome> {
        let now = self.logger.clock().now();
        let Some(trial) = self.trial.as_mut() else {
            debug!("complete ignored, no active trial");
            return Ok(CompleteOutcome::Ignored(TrialStatus::Idle));
        };

        let elapsed = match (trial.status(), trial.elapsed_seconds()) {
            (TrialStatus::Running, _) => trial.finish(now),
            (TrialStatus::AwaitingLog, Some(elapsed)) if !trial.is_logged() => {
                info!(trial = %trial.id(), "retrying interaction log");
                elapsed
            }
            (status, _) => {
                debug!(trial = %trial.id(), ?status, "complete ignored, already logged");
                return Ok(CompleteOutcome::Ignored(status));
            }
        };

        let condition = trial.condition();
        trial.set_logged(true);
        let result = self
            .logger
            .log_interaction(self.session.participant_id(), condition, elapsed)
            .await;

        match result {
            Ok(record) => {
                self.trial = None;
                Ok(CompleteOutcome::Logged(record))
            }
            Err(err) => {
                if let Some(trial) = self.trial.as_mut() {
                    trial.set_logged(false);
                }
                Err(err)
            }
        }
    }

    /// AwaitingLog -> Idle, giving up on the write.
    ///
    /// Also releases a trial whose completion was cancelled mid-write; that
    /// row may or may not be in the store, and it is never written again.
    /// Returns `false` and does nothing in any other state.
    pub fn skip_logging(&mut self) -> bool {
        match &self.trial {
            Some(trial) if trial.status() == TrialStatus::AwaitingLog => {
                warn!(
                    trial = %trial.id(),
                    write_outcome_unknown = trial.is_logged(),
                    "trial discarded without logging"
                );
                self.trial = None;
                true
            }
            _ => false,
        }
    }
}
