//! Experiment session: the surface a front end drives
//!
//! Wires the dataset loader, trial state machine, renderer and log reader
//! together behind the three user actions of the experiment page:
//!
//! - [`ExperimentSession::show_chart`]: start a trial (or redisplay the
//!   active one) and render its chart.
//! - [`ExperimentSession::answered`]: stop the timer and log the trial.
//! - [`ExperimentSession::debug_info`] / [`ExperimentSession::analysis`]:
//!   read the accumulated interaction log.

use crate::chart::{Chart, ChartRenderer, PlotlyRenderer};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::dataset::DatasetLoader;
use crate::experiment::{
    CompleteOutcome, ConditionSelector, InteractionLog, InteractionLogger, InteractionRecord,
    LogSnapshot, ParticipantId, ParticipantSession, RandomSelector, StartOutcome, Trial,
    TrialStateMachine, TrialStatus,
};
use crate::stats::{compute_significance, compute_summary, Significance, SignificancePolicy, Summary};
use crate::store::DataStore;
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Page title.
pub const TITLE: &str = "Penguin Species Identification A/B Test";

/// Question put to the participant.
pub const QUESTION: &str =
    "Can we identify a penguin species from bill length, bill depth, or a combination of both?";

/// Confirmation shown after an answer.
#[must_use]
pub fn elapsed_message(seconds: f64) -> String {
    format!("Time taken to answer: {seconds:.2} seconds")
}

/// A chart ready to display.
#[derive(Debug, Clone)]
pub struct ShownChart {
    /// Rendered chart
    pub chart: Chart,
    /// False when an already active trial was redisplayed
    pub started: bool,
    /// Dataset warnings (excluded rows, stale data)
    pub warnings: Vec<String>,
}

/// Result of [`ExperimentSession::answered`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// The trial was logged
    Recorded(InteractionRecord),
    /// No chart was awaiting an answer
    Ignored(TrialStatus),
}

impl Answer {
    /// User-facing confirmation, if a trial was recorded.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Recorded(record) => Some(elapsed_message(record.elapsed_seconds())),
            Self::Ignored(_) => None,
        }
    }
}

/// The interaction log as shown in the debug panel.
#[derive(Debug, Clone)]
pub struct DebugInfo {
    /// Current log contents
    pub log: LogSnapshot,
    /// Total interactions recorded
    pub total: usize,
}

impl DebugInfo {
    /// Panel text lines: degraded-read messages, then the total.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.log.messages();
        lines.push(format!("Total interactions recorded: {}", self.total));
        lines
    }
}

/// Aggregated view of the interaction log.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Per-condition statistics
    pub summary: Summary,
    /// Welch test outcome
    pub significance: Significance,
    /// Degraded-read messages
    pub messages: Vec<String>,
}

/// One participant's experiment session.
pub struct ExperimentSession<S, K = RandomSelector, R = PlotlyRenderer, C = SystemClock> {
    machine: TrialStateMachine<S, K, C>,
    loader: DatasetLoader<S, C>,
    log: InteractionLog<S, C>,
    renderer: R,
    policy: SignificancePolicy,
    chart_output: Option<PathBuf>,
}

impl<S: DataStore> ExperimentSession<S> {
    /// Session with a fresh participant, random conditions and the Plotly
    /// renderer.
    #[must_use]
    pub fn new(store: Arc<S>, config: &AppConfig) -> Self {
        Self::with_parts(
            store,
            config,
            ParticipantSession::new(),
            RandomSelector::from_entropy(),
            PlotlyRenderer::new(),
            SystemClock,
        )
    }
}

impl<S, K, R, C> ExperimentSession<S, K, R, C>
where
    S: DataStore,
    K: ConditionSelector,
    R: ChartRenderer,
    C: Clock + Clone,
{
    /// Assemble a session from explicit parts.
    #[must_use]
    pub fn with_parts(
        store: Arc<S>,
        config: &AppConfig,
        participant: ParticipantSession,
        selector: K,
        renderer: R,
        clock: C,
    ) -> Self {
        let staleness = config.dataset.staleness();
        let logger = InteractionLogger::with_clock(
            Arc::clone(&store),
            config.store.interactions_table.clone(),
            config.store.append_mode,
            clock.clone(),
        );
        Self {
            machine: TrialStateMachine::new(participant, selector, logger),
            loader: DatasetLoader::with_clock(
                Arc::clone(&store),
                config.store.dataset_table.clone(),
                staleness,
                clock.clone(),
            ),
            log: InteractionLog::with_clock(
                store,
                config.store.interactions_table.clone(),
                staleness,
                clock,
            ),
            renderer,
            policy: config.analysis.policy(),
            chart_output: None,
        }
    }

    /// Also write each shown chart to `path` as HTML.
    #[must_use]
    pub fn with_chart_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.chart_output = Some(path.into());
        self
    }

    /// Page title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        TITLE
    }

    /// Question text.
    #[must_use]
    pub const fn question(&self) -> &'static str {
        QUESTION
    }

    /// This session's participant.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        self.machine.session().participant_id()
    }

    /// Trial status.
    #[must_use]
    pub fn status(&self) -> TrialStatus {
        self.machine.status()
    }

    /// Active trial, if any.
    #[must_use]
    pub const fn current_trial(&self) -> Option<&Trial> {
        self.machine.current()
    }

    /// Start a trial and render its chart.
    ///
    /// While a trial is active its chart is rendered again and the timer
    /// keeps running. No trial starts when the dataset is empty.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] if there is no data to plot, or
    /// [`Error::Io`] if the HTML output cannot be written.
    pub async fn show_chart(&mut self) -> Result<ShownChart> {
        let loaded = self.loader.load().await;
        let warnings = loaded.messages();

        if loaded.dataset.is_empty() && self.machine.status() == TrialStatus::Idle {
            return Err(Error::DataUnavailable(
                "no valid dataset rows, cannot start a trial".to_string(),
            ));
        }

        let (condition, started) = match self.machine.start_trial() {
            StartOutcome::Started { condition, .. } => (condition, true),
            StartOutcome::Ignored(status) => {
                let trial = self
                    .machine
                    .current()
                    .ok_or_else(|| Error::Other(format!("no active trial in {status:?}")))?;
                (trial.condition(), false)
            }
        };

        let chart = self.renderer.render(condition, &loaded.dataset)?;
        if let Some(path) = &self.chart_output {
            chart.write_html(path).await?;
            debug!(path = %path.display(), %condition, "chart written");
        }
        Ok(ShownChart {
            chart,
            started,
            warnings,
        })
    }

    /// Record the answer to the active trial.
    ///
    /// After a failed write the trial stays active; calling this again
    /// retries with the original elapsed time.
    ///
    /// # Errors
    /// Returns [`Error::LogWriteFailure`] if the record could not be written.
    pub async fn answered(&mut self) -> Result<Answer> {
        match self.machine.complete_trial().await? {
            CompleteOutcome::Logged(record) => {
                self.log.invalidate();
                Ok(Answer::Recorded(record))
            }
            CompleteOutcome::Ignored(status) => Ok(Answer::Ignored(status)),
        }
    }

    /// Give up on a trial whose log write keeps failing.
    pub fn skip_logging(&mut self) -> bool {
        self.machine.skip_logging()
    }

    /// Current interaction log and its size.
    pub async fn debug_info(&self) -> DebugInfo {
        let log = self.log.read().await;
        let total = log.len();
        DebugInfo { log, total }
    }

    /// Summary statistics and significance over the interaction log.
    pub async fn analysis(&self) -> Analysis {
        let log = self.log.read().await;
        Analysis {
            summary: compute_summary(&log.records),
            significance: compute_significance(&log.records, &self.policy),
            messages: log.messages(),
        }
    }
}
